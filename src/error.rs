//! Error types for the SQL trainer.
//!
//! Every failure a console command can produce is one of these variants. The
//! console renders them as a single line and keeps running.

use thiserror::Error;

/// Main error type for trainer operations.
#[derive(Error, Debug)]
pub enum TrainerError {
    /// Invalid or unknown connection descriptor, unreadable settings.
    #[error("{0}")]
    Configuration(String),

    /// Transport-level failure while opening or using a connection.
    #[error("{0}")]
    Connection(String),

    /// The target database (or database file) does not exist.
    #[error("{0}")]
    DatabaseNotFound(String),

    /// Input rejected by the query sandbox before reaching the engine.
    #[error("{0}")]
    Validation(String),

    /// Engine-level failure while executing or evaluating a query.
    #[error("{0}")]
    QueryExecution(String),

    /// `describe` / `relations` on a table the catalog does not have.
    #[error("{0}")]
    TableNotFound(String),

    /// Action not allowed in the current session state.
    #[error("{0}")]
    InvalidOperation(String),

    /// Entity descriptors for a domain could not be loaded.
    #[error("{0}")]
    SchemaBinding(String),

    /// Unexpected internal state.
    #[error("{0}")]
    Internal(String),
}

impl TrainerError {
    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a database-not-found error with the given message.
    pub fn database_not_found(msg: impl Into<String>) -> Self {
        Self::DatabaseNotFound(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a query execution error with the given message.
    pub fn query_execution(msg: impl Into<String>) -> Self {
        Self::QueryExecution(msg.into())
    }

    /// Creates a table-not-found error for the given table name.
    pub fn table_not_found(table: &str) -> Self {
        Self::TableNotFound(format!("Table not found: '{table}'."))
    }

    /// Creates an invalid operation error with the given message.
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Creates a schema binding error with the given message.
    pub fn schema_binding(msg: impl Into<String>) -> Self {
        Self::SchemaBinding(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Error raised by anything that needs a session while none is open.
    pub fn no_connection() -> Self {
        Self::Connection("No active connection to the database.".to_string())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::DatabaseNotFound(_) => "Database Not Found",
            Self::Validation(_) => "Validation Error",
            Self::QueryExecution(_) => "Query Execution Error",
            Self::TableNotFound(_) => "Table Not Found",
            Self::InvalidOperation(_) => "Invalid Operation",
            Self::SchemaBinding(_) => "Schema Binding Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using TrainerError.
pub type Result<T> = std::result::Result<T, TrainerError>;
