//! Descriptor validation pipeline.
//!
//! Runs once per descriptor at load time, in a fixed order: key format,
//! adapter, required options, database naming. The first failure wins.

use super::descriptor::{Adapter, ConnectionDescriptor};
use super::settings::Settings;
use crate::error::{Result, TrainerError};
use toml::{Table, Value};

/// Domain and adapter encoded in a descriptor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub domain: String,
    pub adapter: String,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits `<domain>_<adapter>`; `None` if the name does not follow that format.
pub fn parse_key(key: &str) -> Option<ParsedKey> {
    Adapter::ALL.into_iter().find_map(|adapter| {
        let domain = key.strip_suffix(adapter.as_str())?.strip_suffix('_')?;
        if domain.is_empty() || !domain.chars().all(is_word_char) {
            return None;
        }
        Some(ParsedKey {
            domain: domain.to_string(),
            adapter: adapter.as_str().to_string(),
        })
    })
}

/// Returns the domain prefix of a descriptor name.
pub fn extract_domain(key: &str) -> Option<String> {
    parse_key(&key.to_lowercase()).map(|parsed| parsed.domain)
}

fn quoted_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Scalar TOML value as text; tables and arrays have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(d) => Some(d.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

fn option_text(config: &Table, option: &str) -> Option<String> {
    config
        .get(option)
        .and_then(scalar_text)
        .filter(|s| !s.trim().is_empty())
}

/// Validates one raw descriptor and converts it.
pub fn validate(key: &str, config: &Table, settings: &Settings) -> Result<ConnectionDescriptor> {
    let parsed = parse_key(key).ok_or_else(|| {
        TrainerError::configuration(format!(
            "Invalid database configuration key format: '{key}'. Expected format: '<domain>_<adapter>' \
             (e.g. 'learn_hub_postgresql'). Supported adapters: {}.",
            quoted_list(&settings.database.supported_adapters)
        ))
    })?;

    let adapter = validate_adapter(key, config, &parsed, settings)?;
    validate_required_options(key, config, adapter)?;
    validate_database_name(key, config, &parsed, adapter)?;

    build_descriptor(key, config, adapter)
}

fn validate_adapter(
    key: &str,
    config: &Table,
    parsed: &ParsedKey,
    settings: &Settings,
) -> Result<Adapter> {
    let from_config = option_text(config, "adapter").ok_or_else(|| {
        TrainerError::configuration(format!(
            "Missing 'adapter' option for database configuration key '{key}'. \
             Expected adapter: '{}'. The 'adapter' option is required and must specify the database type.",
            parsed.adapter
        ))
    })?;

    let adapter = Adapter::parse(&from_config)
        .filter(|_| settings.is_supported_adapter(&from_config))
        .ok_or_else(|| {
            TrainerError::configuration(format!(
                "Unsupported adapter '{from_config}'. Supported adapters: {}.",
                quoted_list(&settings.database.supported_adapters)
            ))
        })?;

    if parsed.adapter != from_config {
        return Err(TrainerError::configuration(format!(
            "Adapter mismatch for database configuration key '{key}'. \
             Configuration key expects: '{}'. But adapter option is: '{from_config}'. \
             The adapter in the configuration key and in the configuration must match.",
            parsed.adapter
        )));
    }

    Ok(adapter)
}

fn validate_required_options(key: &str, config: &Table, adapter: Adapter) -> Result<()> {
    let required = adapter.required_options();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|opt| option_text(config, opt).is_none())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(TrainerError::configuration(format!(
        "Missing required options for '{key}' ({adapter} adapter). \
         Missing options: {}. Required options: {}.",
        quoted_list(&missing),
        quoted_list(required)
    )))
}

fn validate_database_name(
    key: &str,
    config: &Table,
    parsed: &ParsedKey,
    adapter: Adapter,
) -> Result<()> {
    let database = option_text(config, "database").ok_or_else(|| {
        TrainerError::configuration(format!(
            "Missing 'database' option for database configuration key '{key}'."
        ))
    })?;
    let domain = &parsed.domain;

    if adapter.is_file_based() {
        let expected = format!("db/{domain}/{domain}.sqlite3");
        if database != expected {
            return Err(TrainerError::configuration(format!(
                "Invalid SQLite database path for '{key}'. \
                 Expected pattern: `db/<domain>/<domain>.sqlite3`. \
                 Recommended path: `{expected}`. Got: `{database}`. \
                 SQLite databases should be located in the domain-specific folder."
            )));
        }
    } else if &database != domain {
        return Err(TrainerError::configuration(format!(
            "Invalid database name for '{key}'. Expected: '{domain}'. Got: '{database}'. \
             For PostgreSQL/MySQL, the database name should match the domain from the configuration key."
        )));
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, config: &Table, option: &str) -> Result<Option<T>> {
    match option_text(config, option) {
        None => Ok(None),
        Some(text) => text.trim().parse::<T>().map(Some).map_err(|_| {
            TrainerError::configuration(format!(
                "Invalid '{option}' option for '{key}': expected a number, got '{text}'."
            ))
        }),
    }
}

fn build_descriptor(key: &str, config: &Table, adapter: Adapter) -> Result<ConnectionDescriptor> {
    Ok(ConnectionDescriptor {
        name: key.to_string(),
        adapter,
        database: option_text(config, "database").unwrap_or_default(),
        host: option_text(config, "host"),
        port: parse_number(key, config, "port")?,
        username: option_text(config, "username"),
        password: option_text(config, "password"),
        pool: parse_number(key, config, "pool")?.unwrap_or(5),
        timeout_ms: parse_number(key, config, "timeout")?,
    })
}
