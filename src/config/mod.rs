//! Configuration for the SQL trainer.
//!
//! Two files under `<root>/config/`: `settings.toml` (console behavior) and
//! `database.toml` (named connection descriptors). Both are read once at
//! startup; descriptors are validated before anything can connect.

mod descriptor;
mod settings;
mod validator;

pub use descriptor::{Adapter, ConnectionDescriptor};
pub use settings::{
    ConsoleSettings, DatabaseSettings, SchemaSettings, Settings, TaskSettings, ValidatorSettings,
};
pub use validator::{extract_domain, parse_key, ParsedKey};

use crate::error::{Result, TrainerError};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File locations inside a trainer project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("config").join("settings.toml")
    }

    pub fn database_config_file(&self) -> PathBuf {
        self.root.join("config").join("database.toml")
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    /// Directory holding the entity descriptors of one domain.
    pub fn models_dir(&self, domain: &str) -> PathBuf {
        self.root.join("models").join(domain)
    }

    /// Loads `<root>/.env` into the process environment if present.
    pub fn load_env(&self) {
        let path = self.env_file();
        if !path.exists() {
            return;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => debug!("Loaded environment from {}", path.display()),
            Err(e) => warn!("Could not load {}: {e}", path.display()),
        }
    }
}

/// Validated connection descriptors keyed by name, in file order.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    descriptors: IndexMap<String, ConnectionDescriptor>,
}

impl ConfigurationStore {
    /// Loads and validates `database.toml`.
    pub fn load_from_file(path: &Path, settings: &Settings) -> Result<Self> {
        if !path.exists() {
            return Err(TrainerError::configuration(format!(
                "Database configuration file not found: {}. \
                 Please create a database.toml file in the 'config/' directory.",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainerError::configuration(format!(
                "Failed to read database configuration '{}': {e}",
                path.display()
            ))
        })?;

        Self::parse_toml(&content, settings).map_err(|e| match e {
            TrainerError::Configuration(msg) => {
                TrainerError::configuration(format!("{msg} (in {})", path.display()))
            }
            other => other,
        })
    }

    /// Interpolates environment placeholders, parses and validates every descriptor.
    pub fn parse_toml(content: &str, settings: &Settings) -> Result<Self> {
        let expanded = interpolate_env(content, |name| std::env::var(name).ok())?;
        let raw: toml::Table = toml::from_str(&expanded)
            .map_err(|e| TrainerError::configuration(format!("Invalid database configuration: {e}")))?;

        let mut descriptors = IndexMap::with_capacity(raw.len());
        for (key, value) in &raw {
            let table = value.as_table().ok_or_else(|| {
                TrainerError::configuration(format!(
                    "Database configuration '{key}' must be a table of options."
                ))
            })?;
            let descriptor = validator::validate(key, table, settings)?;
            descriptors.insert(key.clone(), descriptor);
        }

        Ok(Self { descriptors })
    }

    /// Builds a store from already-validated descriptors.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ConnectionDescriptor>) -> Self {
        Self {
            descriptors: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    /// Looks up a descriptor by name.
    pub fn get(&self, name: &str) -> Result<&ConnectionDescriptor> {
        self.descriptors.get(name).ok_or_else(|| {
            TrainerError::configuration(format!(
                "Database configuration for key '{name}' not found in database.toml file."
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// Descriptors grouped by domain, both levels in file order.
    pub fn grouped_by_domain(&self) -> IndexMap<String, Vec<&ConnectionDescriptor>> {
        let mut groups: IndexMap<String, Vec<&ConnectionDescriptor>> = IndexMap::new();
        for (name, descriptor) in &self.descriptors {
            let domain = extract_domain(name).unwrap_or_else(|| name.clone());
            groups.entry(domain).or_default().push(descriptor);
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Expands `${VAR}` and `${VAR:-default}` placeholders.
fn interpolate_env(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .map_err(|e| TrainerError::internal(format!("Invalid interpolation pattern: {e}")))?;

    let mut missing = Vec::new();
    let expanded = pattern.replace_all(content, |caps: &Captures| {
        let name = &caps[1];
        match (lookup(name), caps.get(2)) {
            (Some(value), _) => value,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(TrainerError::configuration(format!(
            "Environment variables referenced by the database configuration are not set: {}.",
            missing.join(", ")
        )));
    }

    Ok(expanded.into_owned())
}
