//! Query command handlers (sql, ar, explain).

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::error::Result;
use crate::query::QueryExecutor;

fn executor<'a>(ctx: &'a CommandContext<'_>) -> QueryExecutor<'a> {
    // Validation runs before the session lookup, so a rejected query is
    // reported as such even while disconnected.
    QueryExecutor::new(ctx.validator, ctx.manager.session().ok())
}

/// Handle `sql <query>` and bare `SELECT ...`.
pub async fn handle_sql(ctx: &CommandContext<'_>, query: &str) -> Result<CommandOutput> {
    let result = executor(ctx).execute_raw(query).await?;
    Ok(CommandOutput::Execution(result))
}

/// Handle `ar <expression>` and bare expressions.
pub async fn handle_expression(ctx: &CommandContext<'_>, expression: &str) -> Result<CommandOutput> {
    let result = executor(ctx).execute_expression(expression).await?;
    Ok(CommandOutput::Execution(result))
}

/// Handle `explain <query>`.
pub async fn handle_explain(ctx: &CommandContext<'_>, query: &str) -> Result<CommandOutput> {
    let result = executor(ctx).explain_raw(query).await?;
    Ok(CommandOutput::Execution(result))
}
