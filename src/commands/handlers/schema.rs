//! Schema command handlers (tables, describe, relations).

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::error::Result;
use crate::schema::SchemaInspector;

/// Handle `tables`.
pub async fn handle_tables(ctx: &CommandContext<'_>) -> Result<CommandOutput> {
    let session = ctx.manager.session()?;
    let inspector = SchemaInspector::new(session, &ctx.settings.schema);
    Ok(CommandOutput::Tables(inspector.list_tables().await?))
}

/// Handle `describe <table>`.
pub async fn handle_describe(ctx: &CommandContext<'_>, table: &str) -> Result<CommandOutput> {
    let session = ctx.manager.session()?;
    let inspector = SchemaInspector::new(session, &ctx.settings.schema);
    Ok(CommandOutput::TableInfo(inspector.describe_table(table).await?))
}

/// Handle `relations [table]`.
pub async fn handle_relations(
    ctx: &CommandContext<'_>,
    table: Option<&str>,
) -> Result<CommandOutput> {
    let session = ctx.manager.session()?;
    let inspector = SchemaInspector::new(session, &ctx.settings.schema);

    if let Some(table) = table {
        return Ok(CommandOutput::Relationships(vec![
            inspector.relationships_for(table).await?,
        ]));
    }

    let all = inspector.relationships().await?;
    if all.is_empty() {
        return Ok(CommandOutput::warning(
            "No models found for the tables of this database.",
        ));
    }
    Ok(CommandOutput::Relationships(all.into_values().collect()))
}
