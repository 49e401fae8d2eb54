//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::logging::default_log_path;

/// Interactive console for practicing SQL and object queries.
#[derive(Parser, Debug)]
#[command(name = "sql-trainer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root holding config/, models/ and db/
    #[arg(long, value_name = "DIR", env = "SQL_TRAINER_ROOT")]
    pub root: Option<PathBuf>,

    /// Write logs to a file instead of stderr (default location if no path is given)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub log_file: Option<Option<PathBuf>>,

    /// Run a console command and exit; repeat to run several in order
    #[arg(short = 'e', long = "execute", value_name = "COMMAND")]
    pub execute: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Project root; the current directory when not given.
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log file path, or `None` to log to stderr.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_ref()
            .map(|path| path.clone().unwrap_or_else(default_log_path))
    }

    /// Whether the console reads from the line editor.
    pub fn is_interactive(&self) -> bool {
        self.execute.is_empty()
    }
}
