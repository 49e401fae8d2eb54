//! Plain-text presentation of command output.
//!
//! Everything the console prints goes through [`Renderer`]. Colors are ANSI
//! sequences from crossterm and are left out entirely when disabled, so the
//! same text can be asserted on in tests or piped to a file.

use comfy_table::{presets::ASCII_FULL_CONDENSED, ContentArrangement, Table};
use crossterm::style::{Color, Stylize};

use crate::binding::AssociationKind;
use crate::commands::help::{help_sections, EXAMPLES};
use crate::commands::{CommandOutput, ConfigGroup, ControlAction};
use crate::config::ConsoleSettings;
use crate::connection::ConnectionInfo;
use crate::db::{DeletePolicy, Row, TableMetadata, Value};
use crate::query::{ExecutionResult, ResultKind};
use crate::schema::TableRelationships;
use crate::tasks::TaskEntry;

const TITLE: &str = "SQL Trainer";
const SUBTITLE: &str = "Practice SQL and object queries on real databases";

/// Semantic color of a text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Primary,
    Secondary,
    Success,
    Warning,
    Error,
    Info,
    Muted,
}

impl Role {
    fn color(self) -> Color {
        match self {
            Role::Primary => Color::Blue,
            Role::Secondary => Color::Cyan,
            Role::Success => Color::Green,
            Role::Warning => Color::Yellow,
            Role::Error => Color::Red,
            Role::Info => Color::Magenta,
            Role::Muted => Color::DarkGrey,
        }
    }
}

/// Turns [`CommandOutput`] into printable text.
#[derive(Debug, Clone)]
pub struct Renderer {
    width: usize,
    max_string_length: usize,
    color: bool,
}

impl Renderer {
    pub fn new(settings: &ConsoleSettings, color: bool) -> Self {
        Self {
            width: settings.output_width.max(20),
            max_string_length: settings.max_string_length.max(4),
            color,
        }
    }

    /// Renders one output. Control actions and `None` render as empty text.
    pub fn render(&self, output: &CommandOutput) -> String {
        match output {
            CommandOutput::None | CommandOutput::Control(_) => String::new(),
            CommandOutput::Info(msg) => self.paint(msg, Role::Warning),
            CommandOutput::Success(msg) => self.paint(msg, Role::Success),
            CommandOutput::Warning(msg) => self.paint(msg, Role::Warning),
            CommandOutput::Error { category, message } => {
                self.paint(&format!("{category}: {message}"), Role::Error)
            }
            CommandOutput::Help(tasks) => self.help(tasks),
            CommandOutput::Configs(groups) => self.configs(groups),
            CommandOutput::Connection(info) => self.connection(info.as_ref()),
            CommandOutput::Tables(tables) => self.tables(tables),
            CommandOutput::TableInfo(meta) => self.table_info(meta),
            CommandOutput::Relationships(all) => all
                .iter()
                .map(|r| self.relationships(r))
                .collect::<Vec<_>>()
                .join("\n"),
            CommandOutput::Execution(result) => self.execution(result),
            CommandOutput::Tasks(tasks) => self.tasks(tasks),
            CommandOutput::Multiple(outputs) => outputs
                .iter()
                .filter(|o| !matches!(o, CommandOutput::None | CommandOutput::Control(_)))
                .map(|o| self.render(o))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Welcome banner shown on start and after `clear`.
    pub fn banner(&self) -> String {
        let separator = "=".repeat(self.width);
        let title = center(TITLE, self.width, ' ');
        let subtitle = center(SUBTITLE, self.width, ' ');
        [
            String::new(),
            self.paint(&separator, Role::Primary),
            self.bold(&title, Role::Secondary),
            self.bold(&subtitle, Role::Info),
            self.paint(&separator, Role::Primary),
            self.paint("Type 'help' to see the available commands.", Role::Warning),
        ]
        .join("\n")
    }

    pub fn goodbye(&self) -> String {
        self.paint("Goodbye!", Role::Primary)
    }

    pub fn interrupt(&self) -> String {
        self.paint(
            "Interrupted. Type 'exit' or press Ctrl-D to quit.",
            Role::Warning,
        )
    }

    /// Whether rendering `output` should clear the screen first.
    pub fn clears_screen(output: &CommandOutput) -> bool {
        matches!(output, CommandOutput::Control(ControlAction::Clear))
    }

    fn help(&self, tasks: &[TaskEntry]) -> String {
        let mut lines = Vec::new();
        for (index, section) in help_sections().iter().enumerate() {
            if index > 0 {
                lines.push(String::new());
            }
            lines.push(self.paint(&format!("{}:", section.title), Role::Secondary));
            for (usage, description) in &section.entries {
                lines.push(format!(
                    "  {} {}",
                    self.paint(&format!("{usage:<35}"), Role::Success),
                    self.paint(&format!("# {description}"), Role::Warning)
                ));
            }
        }
        let mut out = vec![self.section("Available Commands", lines)];

        if !tasks.is_empty() {
            out.push(self.tasks(tasks));
        }

        out.push(self.paint("Examples:", Role::Warning));
        out.extend(EXAMPLES.iter().map(|example| format!("  {example}")));
        out.join("\n")
    }

    fn tasks(&self, tasks: &[TaskEntry]) -> String {
        if tasks.is_empty() {
            return self.paint("No tasks available.", Role::Warning);
        }
        let width = tasks.iter().map(|t| t.name.len()).max().unwrap_or(0) + 2;
        let lines = tasks
            .iter()
            .map(|task| {
                format!(
                    "  {} {}",
                    self.paint(&format!("{:<width$}", task.name), Role::Success),
                    self.paint(&task.description, Role::Warning)
                )
            })
            .collect();
        self.section("Available Tasks", lines)
    }

    fn configs(&self, groups: &[ConfigGroup]) -> String {
        if groups.is_empty() {
            return self.paint("No database configurations found.", Role::Warning);
        }
        let mut lines = Vec::new();
        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                lines.push(String::new());
            }
            lines.push(self.paint(&format!("For {}:", group.domain), Role::Warning));
            for (name, adapter, database) in &group.entries {
                lines.push(format!(
                    "{}{}",
                    self.paint(&format!("  - {name:<30}"), Role::Success),
                    self.paint(&format!(" # ({adapter} —> {database})"), Role::Secondary)
                ));
            }
        }
        self.section("Available Database Configuration Keys", lines)
    }

    fn connection(&self, info: Option<&ConnectionInfo>) -> String {
        let Some(info) = info else {
            return self.paint("No active connection to the database.", Role::Warning);
        };
        self.section(
            "Current Connection",
            vec![
                self.info_line("Domain", &info.domain),
                self.info_line("Adapter", info.adapter.as_str()),
                self.info_line("Database", &info.database),
            ],
        )
    }

    fn tables(&self, tables: &[String]) -> String {
        if tables.is_empty() {
            return self.paint("No tables found in the database.", Role::Warning);
        }
        let lines = tables
            .iter()
            .enumerate()
            .map(|(i, table)| self.paint(&format!("{:>3}. {table}", i + 1), Role::Success))
            .collect();
        self.section("List of available tables", lines)
    }

    fn table_info(&self, meta: &TableMetadata) -> String {
        let mut lines = Vec::new();

        if let Some(pk) = &meta.primary_key {
            lines.push(format!("{}\n", self.info_line("Primary key", pk)));
        }

        let columns = meta
            .columns
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    self.paint(c.logical_type.as_str(), Role::Warning),
                    c.sql_type.clone(),
                    self.yes_no(c.is_nullable),
                    match &c.default {
                        Some(d) if !d.is_empty() => self.paint(d, Role::Info),
                        _ => self.paint("NULL", Role::Muted),
                    },
                ]
            })
            .collect();
        lines.push(self.subsection(
            "Columns",
            self.table(&["Name", "Type", "SQL Type", "Null", "Default"], columns),
        ));

        if !meta.indexes.is_empty() {
            let rows = meta
                .indexes
                .iter()
                .map(|idx| {
                    vec![
                        idx.name.clone(),
                        self.paint(&idx.columns.join(", "), Role::Warning),
                        self.yes_no(idx.is_unique),
                        idx.kind
                            .clone()
                            .unwrap_or_else(|| self.paint("N/A", Role::Secondary)),
                    ]
                })
                .collect();
            lines.push(self.subsection(
                "Indexes",
                self.table(&["Name", "Columns", "Unique", "Type"], rows),
            ));
        }

        if !meta.foreign_keys.is_empty() {
            let rows = meta
                .foreign_keys
                .iter()
                .map(|fk| {
                    vec![
                        if fk.name.is_empty() {
                            self.paint("N/A", Role::Secondary)
                        } else {
                            fk.name.clone()
                        },
                        self.paint(&fk.column, Role::Warning),
                        self.paint(&format!("{}.{}", fk.to_table, fk.to_column), Role::Success),
                        self.on_delete(fk.on_delete),
                    ]
                })
                .collect();
            lines.push(self.subsection(
                "Foreign keys",
                self.table(&["Name", "Column", "Link to", "On delete"], rows),
            ));
        }

        if let Some(count) = meta.row_count {
            lines.push(self.info_line("Row count", &count.to_string()));
        }

        self.section(&format!("Information about '{}' table", meta.name), lines)
    }

    fn relationships(&self, rel: &TableRelationships) -> String {
        let Some(entity) = &rel.entity else {
            return self.paint(
                &format!("No model found for table '{}'.", rel.table),
                Role::Warning,
            );
        };

        let mut lines = vec![format!(
            "{}{}\n",
            self.paint("Model: ", Role::Warning),
            self.paint(entity, Role::Success)
        )];

        let groups: Vec<_> = AssociationKind::ALL
            .iter()
            .filter(|kind| !rel.of(**kind).is_empty())
            .collect();
        for (index, kind) in groups.iter().enumerate() {
            lines.push(self.paint(association_label(**kind), Role::Secondary));
            for assoc in rel.of(**kind) {
                let mut line = format!("  - {} —> {}", assoc.name, assoc.class_name);
                if let Some(through) = &assoc.through {
                    line.push_str(&format!(" (through: {through})"));
                } else if !assoc.foreign_key.is_empty() {
                    line.push_str(&format!(" (FK: {})", assoc.foreign_key));
                }
                if let Some(dependent) = assoc.dependent {
                    line.push_str(&format!(" [dependent: {dependent}]"));
                }
                lines.push(self.paint(&line, Role::Success));
            }
            if index + 1 < groups.len() {
                lines.push(String::new());
            }
        }

        self.section(&format!("Table relationships for '{}'", rel.table), lines)
    }

    fn execution(&self, result: &ExecutionResult) -> String {
        let time = result.execution_time_ms;
        match &result.kind {
            ResultKind::Tabular {
                columns,
                rows,
                row_count,
            } => {
                if rows.is_empty() {
                    return self.paint("Query returned no data.", Role::Warning);
                }
                [
                    self.paint("Results table:", Role::Warning),
                    self.value_table(columns, rows),
                    self.footer(*row_count, time),
                ]
                .join("\n")
            }
            ResultKind::RecordSet {
                columns,
                rows,
                count,
                sql,
            } => {
                if rows.is_empty() {
                    let mut out = vec![self.paint("No records found.", Role::Warning)];
                    out.extend(sql.as_ref().map(|sql| self.sql_line(sql)));
                    return out.join("\n");
                }
                if columns.is_empty() {
                    return self.result_line(&inspect_rows(rows), time);
                }
                let mut out = vec![
                    self.paint("Results table:", Role::Warning),
                    self.value_table(columns, rows),
                    self.footer(*count, time),
                ];
                out.extend(sql.as_ref().map(|sql| self.sql_line(sql)));
                out.join("\n")
            }
            ResultKind::Scalar(value) => self.result_line(&self.format_value(value), time),
            ResultKind::Unknown(text) => [
                self.paint("Result: ", Role::Success),
                text.clone(),
                self.paint(&format!("Execution time: {time} ms"), Role::Muted),
            ]
            .join("\n"),
            ResultKind::Plan { columns, rows } => {
                if rows.is_empty() {
                    return self.paint("No execution plan returned.", Role::Warning);
                }
                [
                    self.paint("SQL query execution plan:", Role::Warning),
                    self.value_table(columns, rows),
                ]
                .join("\n")
            }
        }
    }

    fn result_line(&self, value: &str, time: f64) -> String {
        [
            format!("{}{value}", self.paint("Result: ", Role::Success)),
            self.paint(&format!("Execution time: {time} ms"), Role::Muted),
        ]
        .join("\n")
    }

    fn footer(&self, count: usize, time: f64) -> String {
        let word = if count == 1 { "row" } else { "rows" };
        format!(
            "{} | {}",
            self.paint(&format!("{count} {word}"), Role::Success),
            self.paint(&format!("{time} ms"), Role::Muted)
        )
    }

    fn sql_line(&self, sql: &str) -> String {
        self.paint(&format!("SQL: {sql}"), Role::Secondary)
    }

    fn value_table(&self, columns: &[String], rows: &[Row]) -> String {
        let headers: Vec<&str> = columns.iter().map(String::as_str).collect();
        let body = rows
            .iter()
            .map(|row| row.iter().map(|v| self.format_value(v)).collect())
            .collect();
        self.table(&headers, body)
    }

    fn table(&self, headers: &[&str], rows: Vec<Vec<String>>) -> String {
        let mut table = Table::new();
        table
            .load_preset(ASCII_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(u16::try_from(self.width).unwrap_or(u16::MAX))
            .set_header(headers.iter().map(|h| self.paint(h, Role::Primary)));
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    }

    /// Cell text of one value: `NULL`, upper-cased booleans, truncated strings.
    fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Null => self.paint("NULL", Role::Muted),
            Value::Bool(true) => self.paint("TRUE", Role::Success),
            Value::Bool(false) => self.paint("FALSE", Role::Error),
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => {
                self.paint(&value.to_display_string(), Role::Warning)
            }
            Value::Date(_) | Value::DateTime(_) => {
                self.paint(&value.to_display_string(), Role::Info)
            }
            other => truncate(&other.to_display_string(), self.max_string_length),
        }
    }

    fn on_delete(&self, policy: DeletePolicy) -> String {
        match policy {
            DeletePolicy::Cascade => self.paint("CASCADE", Role::Info),
            DeletePolicy::Nullify => self.paint("NULLIFY", Role::Muted),
            DeletePolicy::Restrict => self.paint("RESTRICT", Role::Error),
            DeletePolicy::None => self.paint("N/A", Role::Secondary),
        }
    }

    fn yes_no(&self, flag: bool) -> String {
        if flag {
            self.paint("YES", Role::Success)
        } else {
            self.paint("NO", Role::Error)
        }
    }

    fn info_line(&self, label: &str, value: &str) -> String {
        format!(
            "{}{}",
            self.paint(&format!("{label}: "), Role::Warning),
            self.paint(value, Role::Success)
        )
    }

    fn subsection(&self, title: &str, content: String) -> String {
        format!("{}\n{content}\n", self.paint(&format!("{title}:"), Role::Warning))
    }

    fn section(&self, title: &str, lines: Vec<String>) -> String {
        let mut out = vec![self.paint(&center(&format!(" {title} "), self.width, '='), Role::Primary)];
        out.extend(lines);
        out.push(self.paint(&"=".repeat(self.width), Role::Primary));
        out.join("\n")
    }

    fn paint(&self, text: &str, role: Role) -> String {
        if self.color {
            text.with(role.color()).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str, role: Role) -> String {
        if self.color {
            text.with(role.color()).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn association_label(kind: AssociationKind) -> &'static str {
    match kind {
        AssociationKind::HasMany => "Has many:",
        AssociationKind::HasOne => "Has one:",
        AssociationKind::BelongsTo => "Belongs to:",
        AssociationKind::HasAndBelongsToMany => "Has and belongs to many:",
    }
}

/// Array literal of bare values or value tuples: `[1, 2]`, `[[1, "a"]]`.
fn inspect_rows(rows: &[Row]) -> String {
    let items: Vec<String> = rows
        .iter()
        .map(|row| match row.as_slice() {
            [single] => single.inspect(),
            many => format!(
                "[{}]",
                many.iter().map(Value::inspect).collect::<Vec<_>>().join(", ")
            ),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max - 2).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

/// Centers `text` in `width` columns, extra padding on the right.
fn center(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!(
        "{}{text}{}",
        fill.to_string().repeat(left),
        fill.to_string().repeat(right)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Adapter;
    use crate::db::{Column, ForeignKey, Index};
    use crate::schema::AssociationSummary;
    use pretty_assertions::assert_eq;

    fn renderer() -> Renderer {
        let settings = ConsoleSettings {
            output_width: 40,
            max_string_length: 10,
            ..ConsoleSettings::default()
        };
        Renderer::new(&settings, false)
    }

    #[test]
    fn test_center() {
        assert_eq!(center(" Hi ", 10, '='), "=== Hi ===");
        assert_eq!(center("abc", 6, '-'), "-abc--");
        assert_eq!(center("too long", 3, '='), "too long");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly 10", 10), "exactly 10");
        assert_eq!(truncate("a longer string", 10), "a longer...");
    }

    #[test]
    fn test_format_value() {
        let r = renderer();
        assert_eq!(r.format_value(&Value::Null), "NULL");
        assert_eq!(r.format_value(&Value::Bool(false)), "FALSE");
        assert_eq!(r.format_value(&Value::Int(7)), "7");
        assert_eq!(
            r.format_value(&Value::String("abcdefghijklmnop".into())),
            "abcdefgh..."
        );
    }

    #[test]
    fn test_error_line() {
        let out = renderer().render(&CommandOutput::Error {
            category: "Validation Error",
            message: "Dangerous SQL pattern detected.".into(),
        });
        assert_eq!(out, "Validation Error: Dangerous SQL pattern detected.");
    }

    #[test]
    fn test_tables_section() {
        let out = renderer().render(&CommandOutput::Tables(vec!["courses".into(), "users".into()]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "======= List of available tables =======");
        assert_eq!(lines[1], "  1. courses");
        assert_eq!(lines[2], "  2. users");
        assert_eq!(lines[3], "=".repeat(40));
    }

    #[test]
    fn test_connection_section() {
        let info = ConnectionInfo {
            name: "learn_hub_sqlite3".into(),
            domain: "learn_hub".into(),
            adapter: Adapter::Sqlite3,
            database: "db/learn_hub/learn_hub.sqlite3".into(),
        };
        let out = renderer().render(&CommandOutput::Connection(Some(info)));
        assert!(out.contains("Domain: learn_hub"));
        assert!(out.contains("Adapter: sqlite3"));
        assert!(out.contains("Database: db/learn_hub/learn_hub.sqlite3"));

        let none = renderer().render(&CommandOutput::Connection(None));
        assert_eq!(none, "No active connection to the database.");
    }

    #[test]
    fn test_tabular_result() {
        let result = ExecutionResult {
            kind: ResultKind::Tabular {
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec![Value::Int(1), Value::String("Ada".into())]],
                row_count: 1,
            },
            execution_time_ms: 0.42,
        };
        let out = renderer().render(&CommandOutput::Execution(result));
        assert!(out.starts_with("Results table:\n"));
        assert!(out.contains("| id | name |"));
        assert!(out.contains("| 1  | Ada  |"));
        assert!(out.ends_with("1 row | 0.42 ms"));
    }

    #[test]
    fn test_record_set_with_sql() {
        let result = ExecutionResult {
            kind: ResultKind::RecordSet {
                columns: vec!["id".into()],
                rows: vec![vec![Value::Int(1)], vec![Value::Int(2)]],
                count: 2,
                sql: Some("SELECT \"courses\".* FROM \"courses\"".into()),
            },
            execution_time_ms: 1.5,
        };
        let out = renderer().render(&CommandOutput::Execution(result));
        assert!(out.contains("2 rows | 1.5 ms"));
        assert!(out.ends_with("SQL: SELECT \"courses\".* FROM \"courses\""));
    }

    #[test]
    fn test_plucked_values_render_as_array() {
        let result = ExecutionResult {
            kind: ResultKind::RecordSet {
                columns: Vec::new(),
                rows: vec![
                    vec![Value::Int(1), Value::String("a".into())],
                    vec![Value::Int(2), Value::Null],
                ],
                count: 2,
                sql: None,
            },
            execution_time_ms: 2.0,
        };
        let out = renderer().render(&CommandOutput::Execution(result));
        assert_eq!(
            out,
            "Result: [[1, \"a\"], [2, nil]]\nExecution time: 2 ms"
        );
    }

    #[test]
    fn test_scalar_and_unknown() {
        let scalar = ExecutionResult {
            kind: ResultKind::Scalar(Value::Int(3)),
            execution_time_ms: 0.1,
        };
        assert_eq!(
            renderer().render(&CommandOutput::Execution(scalar)),
            "Result: 3\nExecution time: 0.1 ms"
        );

        let unknown = ExecutionResult {
            kind: ResultKind::Unknown("{\"beginner\"=>2}".into()),
            execution_time_ms: 0.1,
        };
        assert_eq!(
            renderer().render(&CommandOutput::Execution(unknown)),
            "Result: \n{\"beginner\"=>2}\nExecution time: 0.1 ms"
        );
    }

    #[test]
    fn test_table_info() {
        let meta = TableMetadata {
            name: "enrollments".into(),
            columns: vec![
                Column::new("id", "INTEGER").nullable(false),
                Column::new("course_id", "INTEGER").nullable(false),
            ],
            indexes: vec![Index::new("index_enrollments_on_course_id", vec!["course_id".into()])],
            foreign_keys: vec![ForeignKey::new("", "course_id", "courses", "id")
                .on_delete(DeletePolicy::Cascade)],
            primary_key: Some("id".into()),
            row_count: Some(3),
        };
        let out = renderer().render(&CommandOutput::TableInfo(meta));
        assert!(out.contains("Information about 'enrollments' table"));
        assert!(out.contains("Primary key: id"));
        assert!(out.contains("Columns:"));
        assert!(out.contains("Indexes:"));
        assert!(out.contains("courses.id"));
        assert!(out.contains("CASCADE"));
        assert!(out.contains("Row count: 3"));
    }

    #[test]
    fn test_relationships() {
        let rel = TableRelationships {
            table: "courses".into(),
            entity: Some("LearnHub::Course".into()),
            belongs_to: vec![AssociationSummary {
                name: "category".into(),
                class_name: "Category".into(),
                target_table: Some("categories".into()),
                foreign_key: "category_id".into(),
                primary_key: "id".into(),
                through: None,
                dependent: None,
            }],
            ..TableRelationships::default()
        };
        let out = renderer().render(&CommandOutput::Relationships(vec![rel]));
        assert!(out.contains("Model: LearnHub::Course"));
        assert!(out.contains("Belongs to:"));
        assert!(out.contains("  - category —> Category (FK: category_id)"));
        assert!(!out.contains("Has many:"));

        let unbound = TableRelationships {
            table: "audit_logs".into(),
            ..TableRelationships::default()
        };
        assert_eq!(
            renderer().render(&CommandOutput::Relationships(vec![unbound])),
            "No model found for table 'audit_logs'."
        );
    }

    #[test]
    fn test_multiple_skips_control() {
        let out = renderer().render(&CommandOutput::multiple(vec![
            CommandOutput::info("Connecting..."),
            CommandOutput::exit(),
            CommandOutput::success("Done."),
        ]));
        assert_eq!(out, "Connecting...\nDone.");
    }

    #[test]
    fn test_color_wraps_in_ansi() {
        let settings = ConsoleSettings::default();
        let colored = Renderer::new(&settings, true).render(&CommandOutput::success("ok"));
        assert!(colored.contains("\u{1b}["));
        assert!(colored.contains("ok"));
    }
}
