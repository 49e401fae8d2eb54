//! Catalog metadata types.
//!
//! Live snapshots of table structure as reported by the engine catalog.

use serde::Serialize;
use std::fmt;

/// Everything `describe` reports about one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableMetadata {
    /// Table name.
    pub name: String,

    /// Columns in definition order.
    pub columns: Vec<Column>,

    /// Secondary indexes (the primary key index is not listed).
    pub indexes: Vec<Index>,

    /// Outgoing foreign keys.
    pub foreign_keys: Vec<ForeignKey>,

    /// Primary key column; composite keys are joined with `, `.
    pub primary_key: Option<String>,

    /// Best-effort `COUNT(*)`; `None` when counting failed.
    pub row_count: Option<i64>,
}

/// Engine-independent column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Integer,
    Float,
    Decimal,
    String,
    Text,
    Boolean,
    Date,
    Time,
    DateTime,
    Binary,
    Json,
    Uuid,
    Other,
}

impl LogicalType {
    /// Maps an engine-native type string to a logical type.
    pub fn from_sql_type(sql_type: &str) -> Self {
        let t = sql_type.trim().to_lowercase();

        if t.starts_with("tinyint(1)") || t.starts_with("bool") {
            Self::Boolean
        } else if (t.contains("int") && !t.starts_with("interval") && !t.contains("point"))
            || t.contains("serial")
        {
            Self::Integer
        } else if t.starts_with("numeric") || t.starts_with("decimal") || t == "money" {
            Self::Decimal
        } else if t.contains("double") || t.starts_with("float") || t.starts_with("real") {
            Self::Float
        } else if t.starts_with("timestamp") || t.starts_with("datetime") {
            Self::DateTime
        } else if t == "date" {
            Self::Date
        } else if t.starts_with("time") {
            Self::Time
        } else if t.contains("char") || t.starts_with("enum") || t == "citext" {
            Self::String
        } else if t.contains("text") || t.contains("clob") {
            Self::Text
        } else if t.contains("blob") || t.contains("binary") || t == "bytea" {
            Self::Binary
        } else if t.starts_with("json") {
            Self::Json
        } else if t == "uuid" {
            Self::Uuid
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Binary => "binary",
            Self::Json => "json",
            Self::Uuid => "uuid",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    pub logical_type: LogicalType,

    /// Engine-native type (e.g., "integer", "character varying(255)").
    pub sql_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column; the logical type is derived from the native one.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        let sql_type = sql_type.into();
        Self {
            name: name.into(),
            logical_type: LogicalType::from_sql_type(&sql_type),
            sql_type,
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: Option<String>) -> Self {
        Self { default, ..self }
    }
}

/// Foreign key delete behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    Cascade,
    Nullify,
    Restrict,
    #[default]
    None,
}

impl DeletePolicy {
    /// Parses a referential action as spelled by the engine catalogs.
    pub fn from_action(action: &str) -> Self {
        match action.trim().to_uppercase().as_str() {
            "CASCADE" | "C" => Self::Cascade,
            "SET NULL" | "N" => Self::Nullify,
            "RESTRICT" | "R" => Self::Restrict,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Nullify => "nullify",
            Self::Restrict => "restrict",
            Self::None => "none",
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents one foreign key column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Constraint name (synthesized for engines without named constraints).
    pub name: String,

    /// Source column.
    pub column: String,

    /// Referenced table.
    pub to_table: String,

    /// Referenced column.
    pub to_column: String,

    pub on_delete: DeletePolicy,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            on_delete: DeletePolicy::None,
        }
    }

    /// Sets the delete policy.
    pub fn on_delete(self, on_delete: DeletePolicy) -> Self {
        Self { on_delete, ..self }
    }
}

/// Represents an index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Column names included in the index.
    pub columns: Vec<String>,

    /// Whether this is a unique index.
    pub is_unique: bool,

    /// Access method (btree, hash, ...), when the engine reports one.
    pub kind: Option<String>,
}

impl Index {
    /// Creates a new index with the given name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            is_unique: false,
            kind: None,
        }
    }

    /// Marks the index as unique.
    pub fn unique(self, is_unique: bool) -> Self {
        Self { is_unique, ..self }
    }

    /// Sets the access method.
    pub fn with_kind(self, kind: Option<String>) -> Self {
        Self { kind, ..self }
    }
}
