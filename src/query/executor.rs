//! Query execution with sandbox pre-flight and result classification.
//!
//! Every entry point validates its input before touching the session, so a
//! rejected query never reaches the engine.

use std::time::Instant;

use tracing::debug;

use super::expression::{Evaluated, Evaluator};
use super::validator::QueryValidator;
use crate::connection::Session;
use crate::db::{QueryResult, Row, Value};
use crate::error::{Result, TrainerError};

/// Classified outcome of one query.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultKind {
    /// Raw SQL rows.
    Tabular {
        columns: Vec<String>,
        rows: Vec<Row>,
        row_count: usize,
    },
    Scalar(Value),
    /// Records (or plucked values) from an expression. `columns` is empty
    /// when the rows are bare values rather than entity attributes.
    RecordSet {
        columns: Vec<String>,
        rows: Vec<Row>,
        count: usize,
        sql: Option<String>,
    },
    /// Anything else, as a textual representation.
    Unknown(String),
    /// Engine plan rows, unclassified.
    Plan { columns: Vec<String>, rows: Vec<Row> },
}

/// Result of executing a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub kind: ResultKind,
    /// Wall-clock milliseconds, two decimals.
    pub execution_time_ms: f64,
}

/// Runs validated queries against the active session.
pub struct QueryExecutor<'a> {
    validator: &'a QueryValidator,
    session: Option<&'a Session>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(validator: &'a QueryValidator, session: Option<&'a Session>) -> Self {
        Self { validator, session }
    }

    /// Sends `query` to the engine as-is.
    pub async fn execute_raw(&self, query: &str) -> Result<ExecutionResult> {
        self.validator.validate_sql(query)?;
        let session = self.session()?;

        debug!(sql = %query, "Executing raw SQL");
        let start = Instant::now();
        let result = session
            .client()
            .execute_query(query)
            .await
            .map_err(|e| TrainerError::query_execution(format!("SQL execution —> {e}")))?;
        let execution_time_ms = elapsed_ms(start);

        let row_count = result.row_count;
        Ok(ExecutionResult {
            kind: ResultKind::Tabular {
                columns: result.column_names(),
                rows: result.rows,
                row_count,
            },
            execution_time_ms,
        })
    }

    /// Evaluates an object-query expression and classifies what it produced.
    pub async fn execute_expression(&self, expression: &str) -> Result<ExecutionResult> {
        self.validator.validate_expression(expression)?;
        let session = self.session()?;

        debug!(expression = %expression, "Evaluating expression");
        let evaluator = Evaluator::new(session);
        let start = Instant::now();
        let evaluated = evaluator.evaluate(expression).await?;
        let kind = classify(&evaluator, session, evaluated).await?;
        let execution_time_ms = elapsed_ms(start);

        Ok(ExecutionResult {
            kind,
            execution_time_ms,
        })
    }

    /// Runs the engine's explain for `query`.
    pub async fn explain_raw(&self, query: &str) -> Result<ExecutionResult> {
        self.validator.validate_sql(query)?;
        let session = self.session()?;

        let sql = session.adapter().explain(query);
        debug!(sql = %sql, "Explaining query");
        let start = Instant::now();
        let result = session.client().execute_query(&sql).await.map_err(|e| {
            TrainerError::query_execution(format!("Error getting SQL execution plan —> {e}"))
        })?;
        let execution_time_ms = elapsed_ms(start);

        Ok(ExecutionResult {
            kind: ResultKind::Plan {
                columns: result.column_names(),
                rows: result.rows,
            },
            execution_time_ms,
        })
    }

    fn session(&self) -> Result<&'a Session> {
        self.session.ok_or_else(TrainerError::no_connection)
    }
}

async fn classify(
    evaluator: &Evaluator<'_>,
    session: &Session,
    evaluated: Evaluated,
) -> Result<ResultKind> {
    let kind = match evaluated {
        Evaluated::Relation(relation) => {
            let sql = relation.to_sql();
            let result = session
                .client()
                .execute_query(&sql)
                .await
                .map_err(|e| TrainerError::query_execution(format!("SQL execution —> {e}")))?;
            record_set(result, Some(sql))
        }
        Evaluated::Records(records) => {
            let count = records.len();
            ResultKind::RecordSet {
                columns: records.columns.into_iter().map(|c| c.name).collect(),
                rows: records.rows,
                count,
                sql: None,
            }
        }
        Evaluated::Record(record) => ResultKind::RecordSet {
            columns: record.columns.into_iter().map(|c| c.name).collect(),
            rows: vec![record.row],
            count: 1,
            sql: None,
        },
        Evaluated::Values(values) => ResultKind::RecordSet {
            count: values.len(),
            columns: Vec::new(),
            rows: values.into_iter().map(|v| vec![v]).collect(),
            sql: None,
        },
        Evaluated::Tuples(rows) => ResultKind::RecordSet {
            count: rows.len(),
            columns: Vec::new(),
            rows,
            sql: None,
        },
        Evaluated::Scalar(value) => ResultKind::Scalar(value),
        Evaluated::Grouped(groups) => {
            let pairs: Vec<String> = groups
                .iter()
                .map(|(key, value)| format!("{key:?}=>{}", value.inspect()))
                .collect();
            ResultKind::Unknown(format!("{{{}}}", pairs.join(", ")))
        }
        Evaluated::Type(entity) => ResultKind::Unknown(evaluator.type_signature(&entity).await?),
        Evaluated::WhereChain(relation) => ResultKind::Unknown(format!(
            "#<WhereChain {}>",
            session.registry().qualified_name(relation.entity())
        )),
    };
    Ok(kind)
}

fn record_set(result: QueryResult, sql: Option<String>) -> ResultKind {
    ResultKind::RecordSet {
        columns: result.column_names(),
        count: result.row_count,
        rows: result.rows,
        sql,
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorSettings;
    use crate::testing::learn_hub_session;
    use pretty_assertions::assert_eq;

    fn validator() -> QueryValidator {
        QueryValidator::new(&ValidatorSettings {
            forbidden_sql_commands: vec!["drop".into(), "delete".into()],
            forbidden_expression_methods: vec!["destroy_all".into()],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_execute_raw_reports_shape() {
        let session = learn_hub_session().await;
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        let result = executor
            .execute_raw("SELECT id, title FROM courses ORDER BY id")
            .await
            .unwrap();
        match result.kind {
            ResultKind::Tabular {
                columns,
                rows,
                row_count,
            } => {
                assert_eq!(columns, vec!["id", "title"]);
                assert_eq!(row_count, 3);
                assert_eq!(rows.len(), 3);
            }
            other => panic!("Expected Tabular result, got {other:?}"),
        }
        assert!(result.execution_time_ms >= 0.0);
        assert_eq!(
            result.execution_time_ms,
            (result.execution_time_ms * 100.0).round() / 100.0
        );
    }

    #[tokio::test]
    async fn test_raw_engine_error_is_prefixed() {
        let session = learn_hub_session().await;
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        let err = executor.execute_raw("SELECT * FROM ghosts").await.unwrap_err();
        assert!(matches!(err, TrainerError::QueryExecution(_)));
        assert!(err.to_string().starts_with("SQL execution —> "));
    }

    #[tokio::test]
    async fn test_validation_runs_before_session_lookup() {
        let validator = validator();
        let executor = QueryExecutor::new(&validator, None);

        let err = executor
            .execute_raw("SELECT * FROM users; DROP TABLE users;")
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::Validation(_)));

        let err = executor.execute_raw("SELECT 1").await.unwrap_err();
        assert_eq!(err.to_string(), "No active connection to the database.");
    }

    #[tokio::test]
    async fn test_quoted_comment_marker_cannot_smuggle_a_drop() {
        let session = learn_hub_session().await;
        let validator = QueryValidator::new(&ValidatorSettings::default()).unwrap();
        let executor = QueryExecutor::new(&validator, Some(&session));

        for query in [
            "SELECT '--'; DROP TABLE users",
            "SELECT '/*'; DROP TABLE users; SELECT '*/'",
        ] {
            let err = executor.execute_raw(query).await.unwrap_err();
            assert!(matches!(err, TrainerError::Validation(_)), "{query}: {err}");
        }

        let tables = session.client().list_tables().await.unwrap();
        assert!(tables.contains(&"users".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_query_never_reaches_engine() {
        use crate::binding::SchemaBindingRegistry;
        use crate::db::MockDatabaseClient;
        use crate::testing::learn_hub_descriptor;

        let client = MockDatabaseClient::new(crate::config::Adapter::Sqlite3);
        let session = Session::new(
            learn_hub_descriptor(),
            Box::new(client.clone()),
            SchemaBindingRegistry::default(),
        );
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        assert!(executor.execute_raw("drop table users").await.is_err());
        assert!(executor
            .execute_expression("Course.destroy_all")
            .await
            .is_err());
        assert!(client.executed().is_empty());
    }

    #[tokio::test]
    async fn test_expression_relation_is_record_set_with_sql() {
        let session = learn_hub_session().await;
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        let result = executor
            .execute_expression("Course.where(level: \"beginner\")")
            .await
            .unwrap();
        match result.kind {
            ResultKind::RecordSet { count, sql, columns, .. } => {
                assert_eq!(count, 2);
                assert!(columns.contains(&"title".to_string()));
                assert_eq!(
                    sql.as_deref(),
                    Some(r#"SELECT "courses".* FROM "courses" WHERE "courses"."level" = 'beginner'"#)
                );
            }
            other => panic!("Expected RecordSet, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expression_classification() {
        let session = learn_hub_session().await;
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        let count = executor.execute_expression("Course.count").await.unwrap();
        assert_eq!(count.kind, ResultKind::Scalar(Value::Int(3)));

        let single = executor.execute_expression("Course.find(1)").await.unwrap();
        assert!(matches!(
            single.kind,
            ResultKind::RecordSet { count: 1, sql: None, .. }
        ));

        let plucked = executor
            .execute_expression("Category.pluck(:name)")
            .await
            .unwrap();
        assert_eq!(
            plucked.kind,
            ResultKind::RecordSet {
                columns: vec![],
                rows: vec![vec![Value::String("Databases".into())]],
                count: 1,
                sql: None,
            }
        );

        let missing = executor
            .execute_expression("Course.find_by(title: \"Nope\")")
            .await
            .unwrap();
        assert_eq!(missing.kind, ResultKind::Scalar(Value::Null));

        let grouped = executor
            .execute_expression("Course.group(:level).order(:level).count")
            .await
            .unwrap();
        assert_eq!(
            grouped.kind,
            ResultKind::Unknown(r#"{"advanced"=>1, "beginner"=>2}"#.to_string())
        );

        let bare = executor.execute_expression("Category").await.unwrap();
        assert_eq!(
            bare.kind,
            ResultKind::Unknown("LearnHub::Category(id: integer, name: string)".to_string())
        );
    }

    #[tokio::test]
    async fn test_expression_errors_are_query_execution_errors() {
        let session = learn_hub_session().await;
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        let err = executor.execute_expression("Ghost.all").await.unwrap_err();
        assert!(matches!(err, TrainerError::QueryExecution(_)));
        assert!(err
            .to_string()
            .starts_with("Unknown model or method name —> "));

        let err = executor
            .execute_expression("Course.where(")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Syntax error —> "));

        let err = executor.execute_expression("Course.find(999)").await.unwrap_err();
        assert!(err.to_string().contains("Couldn't find LearnHub::Course"));
    }

    #[tokio::test]
    async fn test_explain_returns_plan_rows() {
        let session = learn_hub_session().await;
        let validator = validator();
        let executor = QueryExecutor::new(&validator, Some(&session));

        let result = executor
            .explain_raw("SELECT * FROM courses WHERE id = 1")
            .await
            .unwrap();
        match result.kind {
            ResultKind::Plan { columns, rows } => {
                assert!(columns.contains(&"detail".to_string()));
                assert!(!rows.is_empty());
            }
            other => panic!("Expected Plan, got {other:?}"),
        }

        let err = executor.explain_raw("SELECT * FROM ghosts").await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Error getting SQL execution plan —> "));
    }
}
