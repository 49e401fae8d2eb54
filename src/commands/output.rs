//! Presentation-agnostic command output.
//!
//! Handlers return these values; the console turns them into text. Nothing
//! here knows about colors or terminal width.

use crate::connection::ConnectionInfo;
use crate::db::TableMetadata;
use crate::error::TrainerError;
use crate::query::ExecutionResult;
use crate::schema::TableRelationships;
use crate::tasks::TaskEntry;

/// Output from a command handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Nothing to show.
    None,

    /// Neutral status line.
    Info(String),

    /// Completed action.
    Success(String),

    /// Non-fatal problem.
    Warning(String),

    /// A failed command, rendered as `<category>: <message>`.
    Error {
        category: &'static str,
        message: String,
    },

    /// The command table, the runner's tasks (if listable) and usage examples.
    Help(Vec<TaskEntry>),

    /// Descriptor names grouped by domain.
    Configs(Vec<ConfigGroup>),

    /// Active session, or `None` when disconnected.
    Connection(Option<ConnectionInfo>),

    Tables(Vec<String>),

    TableInfo(TableMetadata),

    /// One entry per table; an empty list means no table has a binding.
    Relationships(Vec<TableRelationships>),

    Execution(ExecutionResult),

    Tasks(Vec<TaskEntry>),

    /// Console control action.
    Control(ControlAction),

    /// Several outputs in order.
    Multiple(Vec<CommandOutput>),
}

/// Descriptors of one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigGroup {
    pub domain: String,
    /// `(name, adapter, database)` in file order.
    pub entries: Vec<(String, String, String)>,
}

/// Actions that affect the console rather than the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Exit,
    /// Clear the screen and reprint the banner.
    Clear,
}

impl CommandOutput {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::Success(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn multiple(outputs: Vec<CommandOutput>) -> Self {
        Self::Multiple(outputs)
    }

    pub fn exit() -> Self {
        Self::Control(ControlAction::Exit)
    }

    pub fn clear() -> Self {
        Self::Control(ControlAction::Clear)
    }

    /// Whether this output (or any part of it) asks the console to exit.
    pub fn is_exit(&self) -> bool {
        match self {
            Self::Control(ControlAction::Exit) => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_exit),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Self::Error { .. } => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_error),
            _ => false,
        }
    }
}

impl From<TrainerError> for CommandOutput {
    fn from(error: TrainerError) -> Self {
        Self::Error {
            category: error.category(),
            message: error.to_string(),
        }
    }
}
