//! Static console settings.
//!
//! Loaded once at startup from `config/settings.toml` and shared read-only
//! (usually behind an `Arc`) with every component that needs it.

use crate::error::{Result, TrainerError};
use serde::Deserialize;
use std::path::Path;

/// Immutable settings value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub console: ConsoleSettings,
    pub validator: ValidatorSettings,
    pub schema: SchemaSettings,
    pub database: DatabaseSettings,
    pub tasks: TaskSettings,
}

/// Prompt and layout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub prompt_disconnected: String,
    /// `{database}` is replaced with the connected database name.
    pub prompt_connected: String,
    pub output_width: usize,
    pub max_string_length: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            prompt_disconnected: "sql-trainer> ".to_string(),
            prompt_connected: "sql-trainer [{database}]> ".to_string(),
            output_width: 100,
            max_string_length: 150,
        }
    }
}

/// Operator denylists for the query sandbox.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    pub forbidden_sql_commands: Vec<String>,
    pub forbidden_expression_methods: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Bookkeeping tables hidden from `tables`.
    pub system_tables: Vec<String>,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            system_tables: vec![
                "schema_migrations".to_string(),
                "ar_internal_metadata".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub supported_adapters: Vec<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            supported_adapters: vec![
                "postgresql".to_string(),
                "mysql2".to_string(),
                "sqlite3".to_string(),
            ],
        }
    }
}

/// External task runner invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    pub program: String,
    pub list_args: Vec<String>,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            program: "rake".to_string(),
            list_args: vec!["-T".to_string()],
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainerError::configuration(format!(
                "Failed to read settings file '{}': {e}",
                path.display()
            ))
        })?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            TrainerError::configuration(format!(
                "Settings error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Renders the prompt for the current connection state.
    pub fn prompt(&self, database: Option<&str>) -> String {
        match database {
            Some(db) => self.console.prompt_connected.replace("{database}", db),
            None => self.console.prompt_disconnected.clone(),
        }
    }

    pub fn is_supported_adapter(&self, adapter: &str) -> bool {
        self.database.supported_adapters.iter().any(|a| a == adapter)
    }
}
