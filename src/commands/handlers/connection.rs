//! Connection command handlers (configs, connect, connection, disconnect).

use super::CommandContext;
use crate::commands::output::{CommandOutput, ConfigGroup};
use crate::error::Result;

/// Handle `configs`.
pub fn handle_configs(ctx: &CommandContext<'_>) -> CommandOutput {
    let groups = ctx
        .manager
        .store()
        .grouped_by_domain()
        .into_iter()
        .map(|(domain, descriptors)| ConfigGroup {
            domain,
            entries: descriptors
                .into_iter()
                .map(|d| {
                    (
                        d.name.clone(),
                        d.adapter.as_str().to_string(),
                        d.database.clone(),
                    )
                })
                .collect(),
        })
        .collect();
    CommandOutput::Configs(groups)
}

/// Handle `connect <name>`.
pub async fn handle_connect(ctx: &mut CommandContext<'_>, name: &str) -> Result<CommandOutput> {
    let info = ctx.manager.connect(name).await?;
    Ok(CommandOutput::multiple(vec![
        CommandOutput::info(format!("Connecting to '{name}'...")),
        CommandOutput::Connection(Some(info)),
        CommandOutput::success("Successfully connected to the database."),
    ]))
}

/// Handle `connection`.
pub fn handle_connection(ctx: &CommandContext<'_>) -> CommandOutput {
    CommandOutput::Connection(ctx.manager.connection_info())
}

/// Handle `disconnect`. Idempotent.
pub async fn handle_disconnect(ctx: &mut CommandContext<'_>) -> CommandOutput {
    if ctx.manager.disconnect().await {
        CommandOutput::success("Successfully disconnected from the database.")
    } else {
        CommandOutput::warning("No active connection to the database.")
    }
}
