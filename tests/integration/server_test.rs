//! Server-engine integration tests.
//!
//! These tests require running server databases. Set DATABASE_URL
//! (PostgreSQL) or MYSQL_DATABASE_URL (MySQL) to run them.

use sql_trainer::commands::CommandOutput;
use sql_trainer::query::ResultKind;
use url::Url;

use super::{run_script, Project};

/// Writes a `<database>_<adapter>` descriptor for the URL in `var` into the
/// project and returns its name.
fn configure_from_env(project: &Project, var: &str, adapter: &str, default_port: u16) -> Option<String> {
    let url = Url::parse(&std::env::var(var).ok()?).ok()?;
    let database = url.path().trim_start_matches('/').to_string();
    if database.is_empty() || !database.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        eprintln!("Skipping test: {var} database name must be a plain identifier");
        return None;
    }

    let name = format!("{database}_{adapter}");
    project.write(
        "config/database.toml",
        &format!(
            r#"
[{name}]
adapter = "{adapter}"
database = "{database}"
pool = 2
username = "{username}"
password = "{password}"
host = "{host}"
port = {port}
"#,
            username = url.username(),
            password = url.password().unwrap_or_default(),
            host = url.host_str().unwrap_or("localhost"),
            port = url.port().unwrap_or(default_port),
        ),
    );
    project.write(
        &format!("models/{database}/schema_migration.toml"),
        "name = \"SchemaMigration\"\n",
    );
    Some(name)
}

#[tokio::test]
async fn test_postgres_session_round() {
    let project = Project::new().await;
    let Some(name) = configure_from_env(&project, "DATABASE_URL", "postgresql", 5432) else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut console = project.console();

    let output = console.execute_line(&format!("connect {name}")).await;
    assert!(!output.is_error(), "{output:?}");

    let CommandOutput::Execution(result) = console
        .execute_line("sql SELECT 1 AS one, 'two' AS two")
        .await
    else {
        panic!("expected execution result");
    };
    match result.kind {
        ResultKind::Tabular {
            columns, row_count, ..
        } => {
            assert_eq!(columns, vec!["one", "two"]);
            assert_eq!(row_count, 1);
        }
        other => panic!("expected tabular result, got {other:?}"),
    }

    assert!(matches!(
        console.execute_line("tables").await,
        CommandOutput::Tables(_)
    ));
    assert!(console.execute_line("describe ghosts_that_do_not_exist").await.is_error());
}

#[tokio::test]
async fn test_postgres_rejected_input_is_not_sent() {
    let project = Project::new().await;
    let Some(name) = configure_from_env(&project, "DATABASE_URL", "postgresql", 5432) else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut console = project.console();

    let (failures, text) = run_script(
        &mut console,
        &[
            &format!("connect {name}"),
            "sql SELECT 1; DELETE FROM pg_catalog.pg_class",
            "explain SELECT 1",
        ],
    )
    .await;
    assert_eq!(failures, 1, "{text}");
    assert!(text.contains("Validation Error"), "{text}");
    assert!(text.contains("SQL query execution plan:"), "{text}");
}

#[tokio::test]
async fn test_mysql_session_round() {
    let project = Project::new().await;
    let Some(name) =
        configure_from_env(&project, "MYSQL_DATABASE_URL", "mysql2", 3306)
    else {
        eprintln!("Skipping test: MYSQL_DATABASE_URL not set");
        return;
    };
    let mut console = project.console();

    let (failures, text) = run_script(
        &mut console,
        &[
            &format!("connect {name}"),
            "select 1 + 1 AS two",
            "explain SELECT 1",
            "disconnect",
        ],
    )
    .await;
    assert_eq!(failures, 0, "{text}");
    assert!(text.contains("Successfully connected to the database."), "{text}");
    assert!(text.contains("Results table:"), "{text}");
    assert!(text.contains("Successfully disconnected from the database."), "{text}");
}
