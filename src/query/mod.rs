//! Query sandbox, expression engine and execution.
//!
//! The validator runs strictly before the executor touches the session; the
//! executor times each call and classifies what came back.

pub mod executor;
pub mod expression;
pub mod validator;

pub use executor::{ExecutionResult, QueryExecutor, ResultKind};
pub use validator::{canonicalize, QueryValidator};
