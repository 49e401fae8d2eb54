//! Declarative command table.
//!
//! The order of [`COMMANDS`] is the dispatch order: the router compiles each
//! pattern once and the first match wins. Help output is generated from the
//! same table so the two never drift apart.

/// Which handler a matched pattern routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Help,
    Exit,
    Clear,
    Tasks,
    Task,
    Configs,
    Connect,
    Connection,
    Disconnect,
    Tables,
    Describe,
    Relations,
    Sql,
    Expression,
    Explain,
}

/// Definition of a command.
#[derive(Debug, Clone)]
pub struct CommandDef {
    /// Usage as shown in help.
    pub usage: &'static str,
    /// Anchored, case-insensitive pattern. Capture group 1 is the argument.
    pub pattern: &'static str,
    pub route: Route,
    /// Short description shown in help.
    pub description: &'static str,
    /// Category for grouping in help.
    pub category: CommandCategory,
}

/// Category for grouping commands in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    General,
    Connection,
    Schema,
    Queries,
    Tasks,
}

impl CommandCategory {
    pub const ALL: [CommandCategory; 5] = [
        Self::General,
        Self::Connection,
        Self::Schema,
        Self::Queries,
        Self::Tasks,
    ];

    /// Returns the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::General => "General commands",
            Self::Connection => "Connection commands",
            Self::Schema => "Schema commands",
            Self::Queries => "Query commands",
            Self::Tasks => "Task commands",
        }
    }
}

/// All command definitions, in dispatch order.
pub static COMMANDS: &[CommandDef] = &[
    CommandDef {
        usage: "help, h, ?",
        pattern: r"^(?:help|h|\?)$",
        route: Route::Help,
        description: "Show this help",
        category: CommandCategory::General,
    },
    CommandDef {
        usage: "exit, quit, q",
        pattern: r"^(?:exit|quit|q)$",
        route: Route::Exit,
        description: "Exit the console",
        category: CommandCategory::General,
    },
    CommandDef {
        usage: "clear, cls",
        pattern: r"^(?:clear|cls)$",
        route: Route::Clear,
        description: "Clear the screen",
        category: CommandCategory::General,
    },
    CommandDef {
        usage: "tasks",
        pattern: r"^(?:tasks|rake\s+tasks)$",
        route: Route::Tasks,
        description: "List available maintenance tasks",
        category: CommandCategory::Tasks,
    },
    CommandDef {
        usage: "task <name>",
        pattern: r"^(?:task|rake)\s+(\S+)$",
        route: Route::Task,
        description: "Run a maintenance task (only while disconnected)",
        category: CommandCategory::Tasks,
    },
    CommandDef {
        usage: "configs",
        pattern: r"^configs$",
        route: Route::Configs,
        description: "List available database configurations",
        category: CommandCategory::Connection,
    },
    CommandDef {
        usage: "connect <config_name>",
        pattern: r"^connect\s+(\w+)$",
        route: Route::Connect,
        description: "Connect to a database",
        category: CommandCategory::Connection,
    },
    CommandDef {
        usage: "connection",
        pattern: r"^connection$",
        route: Route::Connection,
        description: "Show current connection",
        category: CommandCategory::Connection,
    },
    CommandDef {
        usage: "disconnect",
        pattern: r"^disconnect$",
        route: Route::Disconnect,
        description: "Disconnect from the database",
        category: CommandCategory::Connection,
    },
    CommandDef {
        usage: "tables",
        pattern: r"^tables$",
        route: Route::Tables,
        description: "List tables",
        category: CommandCategory::Schema,
    },
    CommandDef {
        usage: "describe <table>, desc <table>",
        pattern: r"^(?:describe|desc)\s+(\w+)$",
        route: Route::Describe,
        description: "Show table structure",
        category: CommandCategory::Schema,
    },
    CommandDef {
        usage: "relations [table], rels [table]",
        pattern: r"^(?:relations|rels)(?:\s+(\w+))?$",
        route: Route::Relations,
        description: "Show model relationships",
        category: CommandCategory::Schema,
    },
    CommandDef {
        usage: "sql <query>",
        pattern: r"^sql\s+(.+)$",
        route: Route::Sql,
        description: "Execute a SQL query",
        category: CommandCategory::Queries,
    },
    CommandDef {
        usage: "select ...",
        pattern: r"^(select\s.+)$",
        route: Route::Sql,
        description: "Execute a SELECT query directly",
        category: CommandCategory::Queries,
    },
    CommandDef {
        usage: "ar <expression>",
        pattern: r"^ar\s+(.+)$",
        route: Route::Expression,
        description: "Execute an object query",
        category: CommandCategory::Queries,
    },
    CommandDef {
        usage: "explain <query>",
        pattern: r"^explain\s+(.+)$",
        route: Route::Explain,
        description: "Show the query execution plan",
        category: CommandCategory::Queries,
    },
];

/// Returns the commands of one category, in table order.
pub fn commands_in(category: CommandCategory) -> impl Iterator<Item = &'static CommandDef> {
    COMMANDS.iter().filter(move |c| c.category == category)
}
