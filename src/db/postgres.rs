//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::{Adapter, ConnectionDescriptor};
use crate::db::{
    format_driver_error, Column, ColumnInfo, DatabaseClient, DeletePolicy, ForeignKey, Index,
    QueryResult, Row, Value,
};
use crate::error::{Result, TrainerError};
use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// SQLSTATE for "database does not exist".
const INVALID_CATALOG_NAME: &str = "3D000";

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Creates a new PostgresClient from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for the descriptor, retrying transient failures.
    pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let conn_str = descriptor.connection_url()?;

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = PgPoolOptions::new()
                .max_connections(descriptor.pool.max(1))
                .acquire_timeout(Duration::from_secs(10))
                .connect(&conn_str)
                .await;

            match result {
                Ok(pool) => {
                    debug!("Successfully connected to {}", descriptor.database);
                    return Ok(Self { pool });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        last_error = Some(e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        return Err(map_connection_error(e, descriptor));
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => map_connection_error(e, descriptor),
            None => TrainerError::connection("Failed to establish connection"),
        })
    }

    /// Fetches column metadata for a statement that returned no rows.
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
impl DatabaseClient for PostgresClient {
    fn adapter(&self) -> Adapter {
        Adapter::Postgresql
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TrainerError::query_execution(format!("Failed to fetch tables: {e}")))
    }

    async fn columns(&self, table_name: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String, bool, Option<String>)> = sqlx::query_as(
            r#"
            SELECT
                a.attname::text,
                format_type(a.atttypid, a.atttypmod)::text,
                NOT a.attnotnull,
                pg_get_expr(d.adbin, d.adrelid)::text
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
            WHERE n.nspname = current_schema()
                AND c.relname = $1
                AND a.attnum > 0
                AND NOT a.attisdropped
            ORDER BY a.attnum
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
            .map(|(name, sql_type, is_nullable, default)| {
                Column::new(name, sql_type)
                    .nullable(is_nullable)
                    .with_default(default)
            })
            .collect())
    }

    async fn primary_key(&self, table_name: &str) -> Result<Option<String>> {
        let columns: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = current_schema()
                AND tc.table_name = $1
                AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
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
        let rows: Vec<(String, String, bool, String)> = sqlx::query_as(
            r#"
            SELECT
                i.relname::text AS index_name,
                a.attname::text AS column_name,
                ix.indisunique AS is_unique,
                am.amname::text AS method
            FROM pg_class t
            JOIN pg_index ix ON t.oid = ix.indrelid
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_am am ON am.oid = i.relam
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
            JOIN pg_namespace n ON n.oid = t.relnamespace
            WHERE n.nspname = current_schema()
                AND t.relname = $1
                AND NOT ix.indisprimary
            ORDER BY i.relname, array_position(ix.indkey::int2[], a.attnum)
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TrainerError::query_execution(format!("Failed to fetch indexes for {table_name}: {e}"))
        })?;

        // Group by index name
        let mut index_map: IndexMap<String, Index> = IndexMap::new();

        for (index_name, column_name, is_unique, method) in rows {
            index_map
                .entry(index_name.clone())
                .or_insert_with(|| {
                    Index::new(index_name, Vec::new())
                        .unique(is_unique)
                        .with_kind(Some(method))
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
                con.conname::text,
                src.attname::text AS from_column,
                ref.relname::text AS to_table,
                dst.attname::text AS to_column,
                con.confdeltype::text
            FROM pg_constraint con
            JOIN pg_class t ON t.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_class ref ON ref.oid = con.confrelid
            JOIN pg_attribute src ON src.attrelid = con.conrelid AND src.attnum = con.conkey[1]
            JOIN pg_attribute dst ON dst.attrelid = con.confrelid AND dst.attnum = con.confkey[1]
            WHERE con.contype = 'f'
                AND n.nspname = current_schema()
                AND t.relname = $1
            ORDER BY con.conname
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
            .map(|(name, column, to_table, to_column, action)| {
                ForeignKey::new(name, column, to_table, to_column)
                    .on_delete(DeletePolicy::from_action(&action))
            })
            .collect())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        debug!(sql, "postgres execute");
        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TrainerError::query_execution(format_query_error(e)))?;

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

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "NUMERIC" => row
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

        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(Value::DateTime)
            .unwrap_or(Value::Null),

        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::DateTime(v.naive_utc()))
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // For all other types, try to get as string
        other => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => v.map(Value::String).unwrap_or(Value::Null),
            Err(_) => Value::String(format!("<{}>", other.to_lowercase())),
        },
    }
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
}

/// Maps sqlx connection errors to the trainer taxonomy.
fn map_connection_error(error: sqlx::Error, descriptor: &ConnectionDescriptor) -> TrainerError {
    if let Some(db_error) = error.as_database_error() {
        if db_error.code().as_deref() == Some(INVALID_CATALOG_NAME) {
            return TrainerError::database_not_found(format!(
                "Database not found: '{}'.",
                descriptor.database
            ));
        }
    }

    let host = descriptor.host.as_deref().unwrap_or("localhost");
    let port = descriptor.port.unwrap_or(5432);
    let user = descriptor.username.as_deref().unwrap_or("unknown");
    let error_str = error.to_string().to_lowercase();

    let detail = if error_str.contains("connection refused") {
        format!("Cannot connect to {host}:{port}. Check that the server is running.")
    } else if error_str.contains("authentication failed") {
        format!("Authentication failed for user '{user}'. Check your credentials.")
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        format!("Connection to {host}:{port} timed out.")
    } else {
        format_driver_error(&error)
    };

    TrainerError::connection(format!("Failed to establish connection —> {detail}"))
}

/// Formats a query error with detail and hint if available.
fn format_query_error(error: sqlx::Error) -> String {
    let mut result = format_driver_error(&error);

    if let Some(pg_error) = error
        .as_database_error()
        .and_then(|e| e.try_downcast_ref::<sqlx::postgres::PgDatabaseError>())
    {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
