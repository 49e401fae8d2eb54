//! MySQL database client implementation.
//!
//! Catalog data comes from `information_schema` of the current database.
//! Text columns there are binary on some server versions, hence the casts.

use crate::config::{Adapter, ConnectionDescriptor};
use crate::db::{
    format_driver_error, Column, ColumnInfo, DatabaseClient, DeletePolicy, ForeignKey, Index,
    QueryResult, Row, Value,
};
use crate::error::{Result, TrainerError};
use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::mysql::{MySqlDatabaseError, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::time::Duration;
use tracing::debug;

/// Server error number for "Unknown database".
const ER_BAD_DB_ERROR: u16 = 1049;

/// MySQL database client.
#[derive(Debug)]
pub struct MysqlClient {
    pool: MySqlPool,
}

impl MysqlClient {
    /// Creates a new MysqlClient from an existing connection pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let conn_str = descriptor.connection_url()?;

        let pool = MySqlPoolOptions::new()
            .max_connections(descriptor.pool.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, descriptor))?;

        debug!("Successfully connected to {}", descriptor.database);
        Ok(Self { pool })
    }

    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl DatabaseClient for MysqlClient {
    fn adapter(&self) -> Adapter {
        Adapter::Mysql2
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT CAST(TABLE_NAME AS CHAR)
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TrainerError::query_execution(format!("Failed to fetch tables: {e}")))
    }

    async fn columns(&self, table_name: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String, i64, Option<String>)> = sqlx::query_as(
            r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR),
                CAST(COLUMN_TYPE AS CHAR),
                CAST(IS_NULLABLE = 'YES' AS SIGNED),
                CAST(COLUMN_DEFAULT AS CHAR)
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TrainerError::query_execution(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|(name, sql_type, nullable, default)| {
                Column::new(name, sql_type)
                    .nullable(nullable != 0)
                    .with_default(default)
            })
            .collect())
    }

    async fn primary_key(&self, table_name: &str) -> Result<Option<String>> {
        let columns: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(COLUMN_NAME AS CHAR)
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = DATABASE()
                AND TABLE_NAME = ?
                AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TrainerError::query_execution(format!(
                "Failed to fetch primary key for {table_name}: {e}"
            ))
        })?;

        Ok((!columns.is_empty()).then(|| columns.join(", ")))
    }

    async fn indexes(&self, table_name: &str) -> Result<Vec<Index>> {
        let rows: Vec<(String, String, i64, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(INDEX_NAME AS CHAR),
                CAST(COLUMN_NAME AS CHAR),
                CAST(NON_UNIQUE AS SIGNED),
                CAST(INDEX_TYPE AS CHAR)
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = DATABASE()
                AND TABLE_NAME = ?
                AND INDEX_NAME <> 'PRIMARY'
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TrainerError::query_execution(format!("Failed to fetch indexes for {table_name}: {e}"))
        })?;

        let mut index_map: IndexMap<String, Index> = IndexMap::new();
        for (index_name, column_name, non_unique, method) in rows {
            index_map
                .entry(index_name.clone())
                .or_insert_with(|| {
                    Index::new(index_name, Vec::new())
                        .unique(non_unique == 0)
                        .with_kind(Some(method.to_lowercase()))
                })
                .columns
                .push(column_name);
        }

        Ok(index_map.into_values().collect())
    }

    async fn foreign_keys(&self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                CAST(k.CONSTRAINT_NAME AS CHAR),
                CAST(k.COLUMN_NAME AS CHAR),
                CAST(k.REFERENCED_TABLE_NAME AS CHAR),
                CAST(k.REFERENCED_COLUMN_NAME AS CHAR),
                CAST(r.DELETE_RULE AS CHAR)
            FROM information_schema.KEY_COLUMN_USAGE k
            JOIN information_schema.REFERENTIAL_CONSTRAINTS r
                ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
                AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME
            WHERE k.TABLE_SCHEMA = DATABASE()
                AND k.TABLE_NAME = ?
                AND k.REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TrainerError::query_execution(format!(
                "Failed to fetch foreign keys for {table_name}: {e}"
            ))
        })?;

        Ok(rows
            .into_iter()
            .map(|(name, column, to_table, to_column, rule)| {
                ForeignKey::new(name, column, to_table, to_column)
                    .on_delete(DeletePolicy::from_action(&rule))
            })
            .collect())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        debug!(sql, "mysql execute");
        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TrainerError::query_execution(format_driver_error(&e)))?;

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.fetch_column_metadata(sql).await,
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();
        Ok(QueryResult::with_data(columns, rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let type_name = type_name.to_uppercase();

    match type_name.as_str() {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        t if t.ends_with("UNSIGNED") => match row.try_get::<Option<u64>, _>(index) {
            Ok(Some(v)) => i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(v.to_string())),
            _ => Value::Null,
        },

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DECIMAL" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)
            .ok()
            .flatten()
            .map(Value::Decimal)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(Value::Date)
            .unwrap_or(Value::Null),

        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(Value::DateTime)
            .unwrap_or(Value::Null),

        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        other => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => v.map(Value::String).unwrap_or(Value::Null),
            Err(_) => match row.try_get::<Option<Vec<u8>>, _>(index) {
                Ok(Some(bytes)) => String::from_utf8(bytes)
                    .map(Value::String)
                    .unwrap_or_else(|e| Value::Bytes(e.into_bytes())),
                Ok(None) => Value::Null,
                Err(_) => Value::String(format!("<{}>", other.to_lowercase())),
            },
        },
    }
}

fn map_connection_error(error: sqlx::Error, descriptor: &ConnectionDescriptor) -> TrainerError {
    let unknown_database = error
        .as_database_error()
        .and_then(|e| e.try_downcast_ref::<MySqlDatabaseError>())
        .is_some_and(|e| e.number() == ER_BAD_DB_ERROR);

    if unknown_database {
        return TrainerError::database_not_found(format!(
            "Database not found: '{}'.",
            descriptor.database
        ));
    }

    let host = descriptor.host.as_deref().unwrap_or("localhost");
    let port = descriptor.port.unwrap_or(3306);
    let error_str = error.to_string().to_lowercase();

    let detail = if error_str.contains("connection refused") {
        format!("Cannot connect to {host}:{port}. Check that the server is running.")
    } else if error_str.contains("access denied") {
        format!(
            "Access denied for user '{}'. Check your credentials.",
            descriptor.username.as_deref().unwrap_or("unknown")
        )
    } else {
        format_driver_error(&error)
    };

    TrainerError::connection(format!("Failed to establish connection —> {detail}"))
}
