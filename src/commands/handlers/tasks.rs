//! Task runner command handlers.

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::error::{Result, TrainerError};

/// Handle `tasks`. A runner failure is a warning.
pub async fn handle_list(ctx: &CommandContext<'_>) -> CommandOutput {
    match ctx.tasks.list().await {
        Ok(tasks) => CommandOutput::Tasks(tasks),
        Err(e) => CommandOutput::warning(format!("Could not fetch tasks —> {e}")),
    }
}

/// Handle `task <name>`. Refused while a session is open.
pub async fn handle_run(ctx: &CommandContext<'_>, name: &str) -> Result<CommandOutput> {
    if let Some(info) = ctx.manager.connection_info() {
        return Err(TrainerError::invalid_operation(format!(
            "Cannot run task '{name}' while connected to '{}'. Disconnect first.",
            info.database
        )));
    }

    ctx.tasks.run(name).await?;
    Ok(CommandOutput::success(format!("Task '{name}' finished.")))
}
