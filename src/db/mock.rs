//! Mock database client for testing.
//!
//! Provides an in-memory catalog and canned query results so the session,
//! executor and inspector can be exercised without an engine.

use super::{Column, ColumnInfo, Connector, DatabaseClient, ForeignKey, Index, QueryResult, Value};
use crate::config::{Adapter, ConnectionDescriptor};
use crate::error::{Result, TrainerError};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Catalog entry of the mock engine.
#[derive(Debug, Clone, Default)]
pub struct MockTable {
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub primary_key: Option<String>,
    /// `None` makes `row_count` fail.
    pub row_count: Option<i64>,
}

impl MockTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            primary_key: Some("id".to_string()),
            row_count: Some(0),
            ..Self::default()
        }
    }

    pub fn with_indexes(self, indexes: Vec<Index>) -> Self {
        Self { indexes, ..self }
    }

    pub fn with_foreign_keys(self, foreign_keys: Vec<ForeignKey>) -> Self {
        Self {
            foreign_keys,
            ..self
        }
    }

    pub fn with_row_count(self, row_count: Option<i64>) -> Self {
        Self { row_count, ..self }
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Rows(QueryResult),
    Error(String),
}

/// A mock database client that returns predefined results.
///
/// Clones share the executed-statement log and the closed flag.
#[derive(Debug, Clone)]
pub struct MockDatabaseClient {
    adapter: Adapter,
    tables: IndexMap<String, MockTable>,
    responses: Vec<(String, Canned)>,
    executed: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockDatabaseClient {
    /// Creates a new mock client with an empty catalog.
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            tables: IndexMap::new(),
            responses: Vec::new(),
            executed: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_table(mut self, name: impl Into<String>, table: MockTable) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Returns `result` for any statement containing `fragment`.
    pub fn with_response(mut self, fragment: impl Into<String>, result: QueryResult) -> Self {
        self.responses.push((fragment.into(), Canned::Rows(result)));
        self
    }

    /// Fails any statement containing `fragment` with an engine message.
    pub fn with_error(mut self, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .push((fragment.into(), Canned::Error(message.into())));
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn table(&self, name: &str) -> Result<&MockTable> {
        self.tables
            .get(name)
            .ok_or_else(|| TrainerError::query_execution(format!("no such table: {name}")))
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn adapter(&self) -> Adapter {
        self.adapter
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<Column>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<Index>> {
        Ok(self.table(table)?.indexes.clone())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        Ok(self.table(table)?.foreign_keys.clone())
    }

    async fn primary_key(&self, table: &str) -> Result<Option<String>> {
        Ok(self.table(table)?.primary_key.clone())
    }

    async fn row_count(&self, table: &str) -> Result<i64> {
        self.table(table)?
            .row_count
            .ok_or_else(|| TrainerError::query_execution(format!("permission denied for {table}")))
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }

        let canned = self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()));

        match canned {
            Some((_, Canned::Rows(result))) => Ok(result.clone()),
            Some((_, Canned::Error(message))) => Err(TrainerError::query_execution(message.clone())),
            None => Ok(QueryResult::with_data(
                vec![ColumnInfo::new("result", "text")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

type ClientFactory = dyn Fn(&ConnectionDescriptor) -> Result<MockDatabaseClient> + Send + Sync;

/// Connector handing out mock clients.
pub struct MockConnector {
    factory: Box<ClientFactory>,
    opens: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(
        factory: impl Fn(&ConnectionDescriptor) -> Result<MockDatabaseClient> + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory: Box::new(factory),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every open returns a clone of `client`.
    pub fn with_client(client: MockDatabaseClient) -> Self {
        Self::new(move |_| Ok(client.clone()))
    }

    /// Every open fails with the error built by `error`.
    pub fn failing(error: fn() -> TrainerError) -> Self {
        Self::new(move |_| Err(error()))
    }

    /// Shared counter of attempted opens.
    pub fn opens(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opens)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn DatabaseClient>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let client = (self.factory)(descriptor)?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MockDatabaseClient {
        MockDatabaseClient::new(Adapter::Sqlite3)
            .with_table(
                "users",
                MockTable::new(vec![Column::new("id", "INTEGER")]).with_row_count(Some(3)),
            )
            .with_response(
                "COUNT(*)",
                QueryResult::with_data(vec![ColumnInfo::new("count", "INTEGER")], vec![vec![Value::Int(3)]]),
            )
            .with_error("ghosts", "no such table: ghosts")
    }

    #[tokio::test]
    async fn test_mock_catalog() {
        let client = client();
        assert_eq!(client.list_tables().await.unwrap(), vec!["users"]);
        assert_eq!(client.row_count("users").await.unwrap(), 3);
        assert!(client.columns("ghosts").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_canned_responses_and_log() {
        let client = client();
        let result = client.execute_query("SELECT COUNT(*) FROM users").await.unwrap();
        assert_eq!(result.first_value(), Some(&Value::Int(3)));

        let err = client.execute_query("SELECT * FROM ghosts").await.unwrap_err();
        assert_eq!(err.to_string(), "no such table: ghosts");

        assert_eq!(client.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = client();
        let clone = client.clone();
        clone.close().await.unwrap();
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_connector_counts_opens() {
        let connector = MockConnector::failing(|| TrainerError::connection("refused"));
        let opens = connector.opens();
        let descriptor = ConnectionDescriptor {
            name: "shop_sqlite3".to_string(),
            adapter: Adapter::Sqlite3,
            database: "db/shop/shop.sqlite3".to_string(),
            host: None,
            port: None,
            username: None,
            password: None,
            pool: 1,
            timeout_ms: Some(100),
        };
        assert!(connector.open(&descriptor).await.is_err());
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }
}
