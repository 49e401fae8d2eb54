//! Validated connection descriptors.

use crate::error::{Result, TrainerError};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Database engine kind a descriptor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adapter {
    Postgresql,
    Mysql2,
    Sqlite3,
}

impl Adapter {
    pub const ALL: [Adapter; 3] = [Adapter::Postgresql, Adapter::Mysql2, Adapter::Sqlite3];

    /// Returns the adapter name as used in descriptor keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mysql2 => "mysql2",
            Self::Sqlite3 => "sqlite3",
        }
    }

    /// Parses an adapter from its descriptor name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }

    /// True for embedded engines addressed by a file path.
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Sqlite3)
    }

    /// Options that must be present and non-empty in a descriptor.
    pub fn required_options(&self) -> &'static [&'static str] {
        match self {
            Self::Postgresql | Self::Mysql2 => &[
                "adapter", "database", "pool", "username", "password", "host", "port",
            ],
            Self::Sqlite3 => &["adapter", "database", "pool", "timeout"],
        }
    }

    /// Quotes an identifier for this engine.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Self::Mysql2 => format!("`{}`", ident.replace('`', "``")),
            Self::Postgresql | Self::Sqlite3 => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Wraps a query in the engine's explain syntax.
    ///
    /// File-based engines get the plan-only form, server engines the analyze form.
    pub fn explain(&self, query: &str) -> String {
        if self.is_file_based() {
            format!("EXPLAIN QUERY PLAN {query}")
        } else {
            format!("EXPLAIN ANALYZE {query}")
        }
    }
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, validated database target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub name: String,
    pub adapter: Adapter,
    /// Database name for server engines, relative or absolute file path for
    /// file-based ones.
    pub database: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool: u32,
    /// Busy timeout in milliseconds (file-based engines).
    pub timeout_ms: Option<u64>,
}

impl ConnectionDescriptor {
    /// Derived domain: the parent directory of a database file, or the
    /// database name itself for server engines.
    pub fn domain(&self) -> String {
        if self.adapter.is_file_based() {
            Path::new(&self.database)
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            self.database.clone()
        }
    }

    /// Resolves the database file path against the project root.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.database);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// Builds a connection URL for server engines.
    pub fn connection_url(&self) -> Result<String> {
        let scheme = match self.adapter {
            Adapter::Postgresql => "postgres",
            Adapter::Mysql2 => "mysql",
            Adapter::Sqlite3 => {
                return Err(TrainerError::internal(
                    "SQLite descriptors are opened by path, not URL",
                ))
            }
        };

        let host = self.host.as_deref().unwrap_or("localhost");
        let mut url = Url::parse(&format!("{scheme}://{host}"))
            .map_err(|e| TrainerError::configuration(format!("Invalid host '{host}': {e}")))?;

        url.set_port(self.port)
            .map_err(|_| TrainerError::configuration(format!("Invalid port for '{}'", self.name)))?;
        if let Some(user) = &self.username {
            url.set_username(user).map_err(|_| {
                TrainerError::configuration(format!("Invalid username for '{}'", self.name))
            })?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password)).map_err(|_| {
                TrainerError::configuration(format!("Invalid password for '{}'", self.name))
            })?;
        }
        url.set_path(&self.database);

        Ok(url.to_string())
    }

    /// Returns a display-safe summary (no credentials).
    pub fn display_string(&self) -> String {
        format!("{} —> {}", self.adapter, self.database)
    }
}
