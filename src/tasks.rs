//! External maintenance task runner.
//!
//! Seeding and schema setup live outside the console; this module only
//! lists the runner's tasks and invokes one by name.

use std::path::PathBuf;
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TaskSettings;
use crate::error::{Result, TrainerError};

/// One listed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEntry {
    pub name: String,
    pub description: String,
}

/// Invokes the configured task program from the project root.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    program: String,
    list_args: Vec<String>,
    root: PathBuf,
}

impl TaskRunner {
    pub fn new(settings: &TaskSettings, root: impl Into<PathBuf>) -> Self {
        Self {
            program: settings.program.clone(),
            list_args: settings.list_args.clone(),
            root: root.into(),
        }
    }

    /// Runs the list command and parses its `name  # description` lines.
    pub async fn list(&self) -> Result<Vec<TaskEntry>> {
        debug!(program = %self.program, args = ?self.list_args, "Listing tasks");
        let output = Command::new(&self.program)
            .args(&self.list_args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrainerError::invalid_operation(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_task_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Runs one task with the console's stdio attached.
    pub async fn run(&self, name: &str) -> Result<()> {
        info!(program = %self.program, task = name, "Running task");
        let status = Command::new(&self.program)
            .arg(name)
            .current_dir(&self.root)
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if status.success() {
            Ok(())
        } else {
            Err(TrainerError::invalid_operation(format!(
                "Task '{name}' failed ({status})."
            )))
        }
    }

    fn spawn_error(&self, error: std::io::Error) -> TrainerError {
        TrainerError::invalid_operation(format!("Could not run '{}': {error}", self.program))
    }
}

/// Parses `rake -T` style output.
///
/// The description starts at the first `#` preceded by whitespace; lines
/// without one are listed with an empty description.
pub fn parse_task_list(stdout: &str) -> Vec<TaskEntry> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let split = line
                .char_indices()
                .find(|&(i, c)| c == '#' && i > 0 && line[..i].ends_with(char::is_whitespace));
            match split {
                Some((i, _)) => TaskEntry {
                    name: line[..i].trim().to_string(),
                    description: line[i + 1..].trim().to_string(),
                },
                None => TaskEntry {
                    name: line.trim().to_string(),
                    description: String::new(),
                },
            }
        })
        .collect()
}
