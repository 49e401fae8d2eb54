//! Help content generated from the command table.

use super::definitions::{commands_in, CommandCategory};

/// Usage examples shown after the command list.
pub const EXAMPLES: &[&str] = &[
    "configs",
    "task db:reset",
    "connect learn_hub_sqlite3",
    "sql SELECT * FROM categories LIMIT 5",
    "ar LearnHub::Category.limit(5)",
    "SELECT * FROM users LIMIT 10",
    "LearnHub::User.where(name: \"Ada\").first",
    "Course.joins(:category).group(:level).count",
    "describe categories",
    "relations users",
    "disconnect",
];

/// Keys handled by the line editor.
pub const SHORTCUTS: &[(&str, &str)] = &[
    ("Ctrl+C", "Cancel the current line or running query"),
    ("Ctrl+D", "Exit the console"),
    ("Up/Down", "Browse this session's input history"),
];

/// One titled group of `usage -> description` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpSection {
    pub title: &'static str,
    pub entries: Vec<(&'static str, &'static str)>,
}

/// Command sections in category order, then keyboard shortcuts.
pub fn help_sections() -> Vec<HelpSection> {
    let mut sections: Vec<HelpSection> = CommandCategory::ALL
        .iter()
        .map(|category| HelpSection {
            title: category.display_name(),
            entries: commands_in(*category)
                .map(|def| (def.usage, def.description))
                .collect(),
        })
        .collect();

    sections.push(HelpSection {
        title: "Keyboard shortcuts",
        entries: SHORTCUTS.to_vec(),
    });
    sections
}
