//! SQL Trainer - an interactive console for practicing SQL.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use sql_trainer::cli::Cli;
use sql_trainer::config::{ConfigurationStore, ProjectLayout, Settings};
use sql_trainer::connection::ConnectionManager;
use sql_trainer::console::Console;
use sql_trainer::db::SqlxConnector;
use sql_trainer::logging;
use sql_trainer::render::Renderer;
use sql_trainer::tasks::TaskRunner;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match cli.log_path() {
        Some(path) => logging::init_file_logging(&path),
        None => logging::init_stderr_logging(),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let layout = ProjectLayout::new(cli.root_dir());
    layout.load_env();
    info!("Project root: {}", layout.root().display());

    let settings = Arc::new(
        Settings::load_from_file(&layout.settings_file()).context("Failed to load settings")?,
    );
    let store = ConfigurationStore::load_from_file(&layout.database_config_file(), &settings)
        .context("Failed to load database configuration")?;
    info!("Loaded {} database configurations", store.len());

    let manager = ConnectionManager::new(
        Arc::new(store),
        layout.clone(),
        Box::new(SqlxConnector::new(layout.root())),
    );
    let tasks = TaskRunner::new(&settings.tasks, layout.root());
    let renderer = Renderer::new(&settings.console, !cli.no_color);
    let mut console = Console::new(Arc::clone(&settings), manager, tasks, renderer)?;

    if cli.is_interactive() {
        console.run().await?;
        return Ok(ExitCode::SUCCESS);
    }

    let failures = console.run_script(&cli.execute, &mut io::stdout()).await?;
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
