//! Object-query expressions.
//!
//! A small chainable query language over the session's entity bindings,
//! e.g. `Course.where(level: "beginner").order(:title).limit(5)`. Expressions
//! are parsed, turned into SQL relations and evaluated against the live
//! connection.

mod eval;
mod parser;
mod relation;

pub use eval::{Evaluated, Evaluator, Record, Records};
pub use parser::{parse, Call, Chain, Literal};
pub use relation::Relation;

use crate::error::TrainerError;
use thiserror::Error;

/// Failure while parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Malformed input.
    #[error("Syntax error —> {0}")]
    Syntax(String),

    /// Undeclared type, method or attribute.
    #[error("Unknown model or method name —> {0}")]
    UnknownName(String),

    /// The engine rejected the generated SQL.
    #[error("SQL execution —> {0}")]
    Execution(String),

    /// Bad arguments or missing records.
    #[error("Unexpected error —> {0}")]
    Argument(String),
}

impl ExpressionError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub fn unknown_name(msg: impl Into<String>) -> Self {
        Self::UnknownName(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }
}

impl From<TrainerError> for ExpressionError {
    fn from(error: TrainerError) -> Self {
        Self::Execution(error.to_string())
    }
}

impl From<ExpressionError> for TrainerError {
    fn from(error: ExpressionError) -> Self {
        TrainerError::query_execution(error.to_string())
    }
}
