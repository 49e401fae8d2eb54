//! The read-eval-print loop.
//!
//! One line is read, routed, dispatched and rendered before the next is read.
//! `Ctrl-C` at the prompt discards the line; `Ctrl-C` while a command runs
//! drops that command's future and keeps the session.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::commands::{dispatch, CommandContext, CommandOutput, CommandRouter};
use crate::config::Settings;
use crate::connection::ConnectionManager;
use crate::error::{Result, TrainerError};
use crate::query::QueryValidator;
use crate::render::Renderer;
use crate::tasks::TaskRunner;

/// Console state: the session manager plus everything built once at startup.
pub struct Console {
    settings: Arc<Settings>,
    manager: ConnectionManager,
    validator: QueryValidator,
    tasks: TaskRunner,
    router: CommandRouter,
    renderer: Renderer,
}

impl Console {
    pub fn new(
        settings: Arc<Settings>,
        manager: ConnectionManager,
        tasks: TaskRunner,
        renderer: Renderer,
    ) -> Result<Self> {
        let validator = QueryValidator::new(&settings.validator)?;
        Ok(Self {
            settings,
            manager,
            validator,
            tasks,
            router: CommandRouter::new()?,
            renderer,
        })
    }

    /// Prompt for the current connection state.
    pub fn prompt(&self) -> String {
        let info = self.manager.connection_info();
        self.settings
            .prompt(info.as_ref().map(|info| info.database.as_str()))
    }

    /// Routes and runs one line of input.
    pub async fn execute_line(&mut self, line: &str) -> CommandOutput {
        let command = self.router.parse(line);
        let mut ctx = CommandContext {
            settings: &self.settings,
            manager: &mut self.manager,
            validator: &self.validator,
            tasks: &self.tasks,
        };
        dispatch(&mut ctx, command).await
    }

    /// Runs `commands` in order, writing rendered output to `out`.
    ///
    /// Stops early at `exit`. Returns the number of commands that failed.
    pub async fn run_script<W: Write>(&mut self, commands: &[String], out: &mut W) -> Result<usize> {
        let mut failures = 0;
        for line in commands {
            let output = self.execute_line(line).await;
            if output.is_error() {
                failures += 1;
            }
            write_rendered(out, &self.renderer.render(&output))?;
            if output.is_exit() {
                break;
            }
        }
        self.shutdown().await;
        Ok(failures)
    }

    /// Interactive loop on the terminal until `exit` or `Ctrl-D`.
    pub async fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| TrainerError::internal(format!("Could not start line editor: {e}")))?;

        clear_screen();
        println!("{}", self.renderer.banner());

        loop {
            let prompt = self.prompt();
            match editor.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = editor.add_history_entry(line.as_str()) {
                        debug!("Could not record history entry: {e}");
                    }

                    let output = tokio::select! {
                        output = self.execute_line(&line) => Some(output),
                        _ = tokio::signal::ctrl_c() => None,
                    };
                    let Some(output) = output else {
                        println!("{}", self.renderer.interrupt());
                        continue;
                    };

                    if Renderer::clears_screen(&output) {
                        clear_screen();
                        println!("{}", self.renderer.banner());
                        continue;
                    }

                    let text = self.renderer.render(&output);
                    if !text.is_empty() {
                        println!("{text}");
                    }
                    if output.is_exit() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", self.renderer.interrupt());
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    self.shutdown().await;
                    return Err(TrainerError::internal(format!("Input error: {e}")));
                }
            }
        }

        self.shutdown().await;
        println!("{}", self.renderer.goodbye());
        Ok(())
    }

    async fn shutdown(&mut self) {
        if self.manager.disconnect().await {
            debug!("Closed session on exit");
        }
    }
}

fn write_rendered<W: Write>(out: &mut W, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writeln!(out, "{text}")
        .map_err(|e| TrainerError::internal(format!("Could not write output: {e}")))
}

fn clear_screen() {
    if let Err(e) = execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)) {
        warn!("Could not clear the screen: {e}");
    }
}
