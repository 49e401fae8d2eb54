//! SQLite database client implementation.
//!
//! Catalog data comes from `sqlite_master` and the `PRAGMA` table functions.
//! Values are decoded by their runtime storage class since SQLite columns
//! are dynamically typed.

use crate::config::{Adapter, ConnectionDescriptor};
use crate::db::{
    format_driver_error, Column, ColumnInfo, DatabaseClient, DeletePolicy, ForeignKey, Index,
    QueryResult, Row, Value,
};
use crate::error::{Result, TrainerError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Creates a new SqliteClient from an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens an existing database file. The file is never created.
    pub async fn open(path: &Path, descriptor: &ConnectionDescriptor) -> Result<Self> {
        if !path.is_file() {
            return Err(TrainerError::database_not_found(format!(
                "Database file not found: '{}'.",
                path.display()
            )));
        }

        let mut options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);
        if let Some(timeout) = descriptor.timeout_ms {
            options = options.busy_timeout(Duration::from_millis(timeout));
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(descriptor.pool.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                TrainerError::connection(format!(
                    "Failed to establish connection —> {}",
                    format_driver_error(&e)
                ))
            })?;

        debug!("Opened SQLite database {}", path.display());
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

    async fn pragma(&self, pragma: &str, target: &str) -> Result<Vec<SqliteRow>> {
        let sql = format!("PRAGMA {pragma}({})", Adapter::Sqlite3.quote_ident(target));
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                TrainerError::query_execution(format!(
                    "Failed to read {pragma} for {target}: {}",
                    format_driver_error(&e)
                ))
            })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn adapter(&self) -> Adapter {
        Adapter::Sqlite3
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TrainerError::query_execution(format!("Failed to fetch tables: {e}")))
    }

    async fn columns(&self, table_name: &str) -> Result<Vec<Column>> {
        let rows = self.pragma("table_info", table_name).await?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("name").map_err(catalog_error)?;
                let sql_type: String = row.try_get("type").map_err(catalog_error)?;
                let not_null: i64 = row.try_get("notnull").map_err(catalog_error)?;
                let default: Option<String> = row.try_get("dflt_value").map_err(catalog_error)?;
                Ok(Column::new(name, sql_type)
                    .nullable(not_null == 0)
                    .with_default(default))
            })
            .collect()
    }

    async fn primary_key(&self, table_name: &str) -> Result<Option<String>> {
        let rows = self.pragma("table_info", table_name).await?;

        let mut keyed: Vec<(i64, String)> = Vec::new();
        for row in &rows {
            let position: i64 = row.try_get("pk").map_err(catalog_error)?;
            if position > 0 {
                keyed.push((position, row.try_get("name").map_err(catalog_error)?));
            }
        }
        keyed.sort_by_key(|(position, _)| *position);

        Ok((!keyed.is_empty()).then(|| {
            keyed
                .into_iter()
                .map(|(_, name)| name)
                .collect::<Vec<_>>()
                .join(", ")
        }))
    }

    async fn indexes(&self, table_name: &str) -> Result<Vec<Index>> {
        let list = self.pragma("index_list", table_name).await?;

        let mut indexes = Vec::new();
        for row in &list {
            let name: String = row.try_get("name").map_err(catalog_error)?;
            let origin: String = row.try_get("origin").map_err(catalog_error)?;
            if origin == "pk" || name.starts_with("sqlite_autoindex") {
                continue;
            }
            let unique: i64 = row.try_get("unique").map_err(catalog_error)?;

            let info = self.pragma("index_info", &name).await?;
            let columns = info
                .iter()
                .map(|r| {
                    r.try_get::<Option<String>, _>("name")
                        .map(|c| c.unwrap_or_else(|| "<expression>".to_string()))
                        .map_err(catalog_error)
                })
                .collect::<Result<Vec<_>>>()?;

            indexes.push(Index::new(name, columns).unique(unique != 0));
        }

        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(indexes)
    }

    async fn foreign_keys(&self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows = self.pragma("foreign_key_list", table_name).await?;

        let mut foreign_keys = Vec::new();
        for row in &rows {
            let to_table: String = row.try_get("table").map_err(catalog_error)?;
            let column: String = row.try_get("from").map_err(catalog_error)?;
            let to_column = match row.try_get::<Option<String>, _>("to").map_err(catalog_error)? {
                Some(to) => to,
                None => self
                    .primary_key(&to_table)
                    .await?
                    .unwrap_or_else(|| "id".to_string()),
            };
            let on_delete: String = row.try_get("on_delete").map_err(catalog_error)?;

            foreign_keys.push(
                ForeignKey::new(
                    format!("fk_{table_name}_{column}"),
                    column,
                    to_table,
                    to_column,
                )
                .on_delete(DeletePolicy::from_action(&on_delete)),
            );
        }

        Ok(foreign_keys)
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        debug!(sql, "sqlite execute");
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

fn catalog_error(error: sqlx::Error) -> TrainerError {
    TrainerError::query_execution(format!("Failed to read catalog: {error}"))
}

fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Decodes by storage class; a declared BOOLEAN column holding an integer
/// becomes a bool.
fn convert_value(row: &SqliteRow, index: usize, declared_type: &str) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => match row.try_get_unchecked::<i64, _>(index) {
            Ok(v) if declared_type.eq_ignore_ascii_case("BOOLEAN") => Value::Bool(v != 0),
            Ok(v) => Value::Int(v),
            Err(_) => Value::Null,
        },
        "REAL" => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn memory_client() -> SqliteClient {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let client = SqliteClient::from_pool(pool);
        for statement in [
            "CREATE TABLE roles (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                email VARCHAR(255) NOT NULL DEFAULT '',
                admin BOOLEAN DEFAULT 0,
                score REAL,
                role_id INTEGER REFERENCES roles(id) ON DELETE CASCADE
            )",
            "CREATE UNIQUE INDEX index_users_on_email ON users (email)",
            "INSERT INTO roles (id, name) VALUES (1, 'admin')",
            "INSERT INTO users (id, email, admin, score, role_id) VALUES (1, 'a@x.io', 1, 2.5, 1)",
        ] {
            client.execute_query(statement).await.unwrap();
        }
        client
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let client = memory_client().await;
        assert_eq!(client.list_tables().await.unwrap(), vec!["roles", "users"]);
    }

    #[tokio::test]
    async fn test_columns_and_primary_key() {
        let client = memory_client().await;
        let columns = client.columns("users").await.unwrap();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[1].name, "email");
        assert!(!columns[1].is_nullable);
        assert_eq!(columns[1].default.as_deref(), Some("''"));
        assert_eq!(
            client.primary_key("users").await.unwrap(),
            Some("id".to_string())
        );
    }

    #[tokio::test]
    async fn test_indexes_skip_autoindexes() {
        let client = memory_client().await;
        let indexes = client.indexes("users").await.unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, "index_users_on_email");
        assert_eq!(indexes[0].columns, vec!["email"]);
        assert!(indexes[0].is_unique);
    }

    #[tokio::test]
    async fn test_foreign_keys() {
        let client = memory_client().await;
        let fks = client.foreign_keys("users").await.unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].column, "role_id");
        assert_eq!(fks[0].to_table, "roles");
        assert_eq!(fks[0].to_column, "id");
        assert_eq!(fks[0].on_delete, DeletePolicy::Cascade);
    }

    #[tokio::test]
    async fn test_value_decoding() {
        let client = memory_client().await;
        let result = client
            .execute_query("SELECT id, email, admin, score, NULL AS nothing FROM users")
            .await
            .unwrap();
        assert_eq!(
            result.rows[0],
            vec![
                Value::Int(1),
                Value::from("a@x.io"),
                Value::Bool(true),
                Value::Float(2.5),
                Value::Null,
            ]
        );
    }

    #[tokio::test]
    async fn test_row_count_default() {
        let client = memory_client().await;
        assert_eq!(client.row_count("users").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_keeps_columns() {
        let client = memory_client().await;
        let result = client
            .execute_query("SELECT id, email FROM users WHERE id = 99")
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.column_names(), vec!["id", "email"]);
    }

    #[tokio::test]
    async fn test_query_error() {
        let client = memory_client().await;
        let err = client.execute_query("SELECT * FROM ghosts").await.unwrap_err();
        assert!(matches!(err, TrainerError::QueryExecution(_)));
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn test_missing_file_is_database_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = ConnectionDescriptor {
            name: "shop_sqlite3".to_string(),
            adapter: Adapter::Sqlite3,
            database: "db/shop/shop.sqlite3".to_string(),
            host: None,
            port: None,
            username: None,
            password: None,
            pool: 1,
            timeout_ms: Some(1000),
        };
        let path = descriptor.database_path(dir.path());
        let err = SqliteClient::open(&path, &descriptor).await.unwrap_err();
        assert!(matches!(err, TrainerError::DatabaseNotFound(_)));
        assert!(!path.exists());
    }
}
