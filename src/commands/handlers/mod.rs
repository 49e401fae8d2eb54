//! Command handlers.
//!
//! Each handler takes the command context and returns a [`CommandOutput`] or
//! a [`TrainerError`]; [`dispatch`] turns errors into error output so that no
//! command can end the console.

pub mod connection;
pub mod queries;
pub mod schema;
pub mod system;
pub mod tasks;

use tracing::debug;

use super::output::CommandOutput;
use super::router::Command;
use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::error::{Result, TrainerError};
use crate::query::QueryValidator;
use crate::tasks::TaskRunner;

/// Context provided to command handlers.
pub struct CommandContext<'a> {
    pub settings: &'a Settings,
    /// Exclusive borrow: connect and disconnect never overlap with a query.
    pub manager: &'a mut ConnectionManager,
    pub validator: &'a QueryValidator,
    pub tasks: &'a TaskRunner,
}

/// Runs one parsed command.
pub async fn dispatch(ctx: &mut CommandContext<'_>, command: Command) -> CommandOutput {
    debug!(?command, "Dispatching command");
    let result: Result<CommandOutput> = match command {
        Command::Empty => Ok(CommandOutput::None),
        Command::Help => Ok(system::handle_help(ctx).await),
        Command::Exit => Ok(CommandOutput::exit()),
        Command::Clear => Ok(CommandOutput::clear()),
        Command::Tasks => Ok(tasks::handle_list(ctx).await),
        Command::Task(name) => tasks::handle_run(ctx, &name).await,
        Command::Configs => Ok(connection::handle_configs(ctx)),
        Command::Connect(name) => connection::handle_connect(ctx, &name).await,
        Command::Connection => Ok(connection::handle_connection(ctx)),
        Command::Disconnect => Ok(connection::handle_disconnect(ctx).await),
        Command::Tables => schema::handle_tables(ctx).await,
        Command::Describe(table) => schema::handle_describe(ctx, &table).await,
        Command::Relations(table) => schema::handle_relations(ctx, table.as_deref()).await,
        Command::Sql(query) => queries::handle_sql(ctx, &query).await,
        Command::Expression(expr) => queries::handle_expression(ctx, &expr).await,
        Command::Explain(query) => queries::handle_explain(ctx, &query).await,
        Command::Unknown(input) => Ok(system::handle_unknown(&input)),
    };

    result.unwrap_or_else(|e: TrainerError| {
        debug!(category = e.category(), "Command failed: {e}");
        CommandOutput::from(e)
    })
}
