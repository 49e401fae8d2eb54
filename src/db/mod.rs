//! Database abstraction layer.
//!
//! Provides a trait-based interface over the three supported engines so the
//! session, executor and inspector never talk to sqlx directly.

mod mock;
mod mysql;
mod postgres;
mod schema;
mod sqlite;
mod types;

pub use mock::{MockConnector, MockDatabaseClient, MockTable};
pub use mysql::MysqlClient;
pub use postgres::PostgresClient;
pub use schema::{Column, DeletePolicy, ForeignKey, Index, LogicalType, TableMetadata};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::{Adapter, ConnectionDescriptor};
use crate::error::{Result, TrainerError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with TrainerError.
/// Catalog methods take an unquoted table name.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Engine this client talks to.
    fn adapter(&self) -> Adapter;

    /// Names of all user tables, in catalog order.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of a table in definition order.
    async fn columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Secondary indexes of a table.
    async fn indexes(&self, table: &str) -> Result<Vec<Index>>;

    /// Outgoing foreign keys of a table.
    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>>;

    /// Primary key column(s) of a table.
    async fn primary_key(&self, table: &str) -> Result<Option<String>>;

    /// Counts the rows of a table.
    async fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.adapter().quote_ident(table));
        let result = self.execute_query(&sql).await?;
        match result.first_value() {
            Some(Value::Int(n)) => Ok(*n),
            Some(Value::Decimal(d)) => d
                .to_string()
                .parse()
                .map_err(|_| TrainerError::query_execution(format!("Unexpected row count: {d}"))),
            Some(other) => Err(TrainerError::query_execution(format!(
                "Unexpected row count: {other}"
            ))),
            None => Ok(0),
        }
    }

    /// Executes a SQL statement and returns its rows.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Opens physical connections for descriptors.
///
/// The seam between the connection manager and the drivers; tests plug in
/// [`MockConnector`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector backed by sqlx pools.
#[derive(Debug, Clone)]
pub struct SqlxConnector {
    root: PathBuf,
}

impl SqlxConnector {
    /// `root` resolves relative database file paths.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Connector for SqlxConnector {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn DatabaseClient>> {
        match descriptor.adapter {
            Adapter::Postgresql => Ok(Box::new(PostgresClient::connect(descriptor).await?)),
            Adapter::Mysql2 => Ok(Box::new(MysqlClient::connect(descriptor).await?)),
            Adapter::Sqlite3 => {
                let path = descriptor.database_path(&self.root);
                Ok(Box::new(SqliteClient::open(&path, descriptor).await?))
            }
        }
    }
}

/// Formats a driver error for display, keeping the engine's own message.
pub(crate) fn format_driver_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
