//! System command handlers (help, unknown input).

use tracing::debug;

use super::CommandContext;
use crate::commands::output::CommandOutput;

/// Handle `help`. Tasks are listed only when the runner answers.
pub async fn handle_help(ctx: &CommandContext<'_>) -> CommandOutput {
    let tasks = match ctx.tasks.list().await {
        Ok(tasks) => tasks,
        Err(e) => {
            debug!("Task list unavailable for help: {e}");
            Vec::new()
        }
    };
    CommandOutput::Help(tasks)
}

/// Handle input that matched no command.
pub fn handle_unknown(input: &str) -> CommandOutput {
    CommandOutput::Error {
        category: "Unknown Command",
        message: format!("'{input}'. Type 'help' to see the available commands."),
    }
}
