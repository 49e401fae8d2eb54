//! End-to-end console tests against SQLite project roots.

use pretty_assertions::assert_eq;
use sql_trainer::commands::CommandOutput;
use sql_trainer::db::Value;
use sql_trainer::query::ResultKind;

use super::{run_script, Project};

#[tokio::test]
async fn test_connect_reports_session_and_prompt() {
    let project = Project::new().await;
    let mut console = project.console();
    assert_eq!(console.prompt(), "sql-trainer> ");

    let output = console.execute_line("connect learn_hub_sqlite3").await;
    assert!(!output.is_error(), "{output:?}");
    assert_eq!(console.prompt(), "sql-trainer [db/learn_hub/learn_hub.sqlite3]> ");

    let CommandOutput::Connection(Some(info)) = console.execute_line("connection").await else {
        panic!("expected connection info");
    };
    assert_eq!(info.domain, "learn_hub");
    assert_eq!(info.adapter.as_str(), "sqlite3");
}

#[tokio::test]
async fn test_connect_to_missing_database_file() {
    let project = Project::new().await;
    std::fs::remove_file(project.path("db/shop/shop.sqlite3")).unwrap();
    let mut console = project.console();

    let output = console.execute_line("connect shop_sqlite3").await;
    assert!(
        matches!(output, CommandOutput::Error { category: "Database Not Found", .. }),
        "{output:?}"
    );
    assert_eq!(console.execute_line("connection").await, CommandOutput::Connection(None));
}

#[tokio::test]
async fn test_stacked_mutation_never_reaches_the_engine() {
    let project = Project::new().await;
    let mut console = project.console();

    let (failures, text) = run_script(
        &mut console,
        &[
            "connect learn_hub_sqlite3",
            "SELECT * FROM users; DROP TABLE users;",
        ],
    )
    .await;
    assert_eq!(failures, 1);
    assert!(text.contains("Validation Error: Dangerous SQL pattern detected"), "{text}");

    let mut console = project.console();
    console.execute_line("connect learn_hub_sqlite3").await;
    let CommandOutput::Execution(result) = console.execute_line("sql SELECT COUNT(*) AS n FROM users").await
    else {
        panic!("expected execution result");
    };
    let ResultKind::Tabular { rows, .. } = result.kind else {
        panic!("expected tabular result");
    };
    assert_eq!(rows[0][0].to_string(), "3");
}

#[tokio::test]
async fn test_select_reports_rows_and_columns() {
    let project = Project::new().await;
    let mut console = project.console();
    console.execute_line("connect learn_hub_sqlite3").await;

    let CommandOutput::Execution(result) = console
        .execute_line("select id, title, level from courses order by id")
        .await
    else {
        panic!("expected execution result");
    };
    match result.kind {
        ResultKind::Tabular {
            columns, row_count, ..
        } => {
            assert_eq!(columns, vec!["id", "title", "level"]);
            assert_eq!(row_count, 3);
        }
        other => panic!("expected tabular result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_describe_ghosts_and_courses() {
    let project = Project::new().await;
    let mut console = project.console();

    let (failures, text) = run_script(
        &mut console,
        &["connect learn_hub_sqlite3", "describe ghosts", "describe courses"],
    )
    .await;
    assert_eq!(failures, 1);
    assert!(text.contains("Table Not Found: Table not found: 'ghosts'."), "{text}");
    assert!(text.contains("Primary key: id"), "{text}");
    assert!(text.contains("instructor_id"), "{text}");
    assert!(text.contains("Row count: 3"), "{text}");
}

#[tokio::test]
async fn test_disconnect_without_session_is_a_warning() {
    let project = Project::new().await;
    let mut console = project.console();

    let (failures, text) = run_script(&mut console, &["disconnect"]).await;
    assert_eq!(failures, 0);
    assert_eq!(text, "No active connection to the database.\n");
}

#[tokio::test]
async fn test_tables_are_memoized_for_the_session() {
    let project = Project::new().await;
    let mut console = project.console();
    console.execute_line("connect learn_hub_sqlite3").await;

    let first = console.execute_line("tables").await;
    assert_eq!(
        first,
        CommandOutput::Tables(vec![
            "categories".into(),
            "courses".into(),
            "enrollments".into(),
            "roles".into(),
            "users".into(),
        ])
    );

    project
        .execute_out_of_band("db/learn_hub/learn_hub.sqlite3", "DROP TABLE enrollments")
        .await;
    assert_eq!(console.execute_line("tables").await, first);

    // A fresh session sees the drop.
    console.execute_line("connect learn_hub_sqlite3").await;
    let CommandOutput::Tables(tables) = console.execute_line("tables").await else {
        panic!("expected tables");
    };
    assert!(!tables.contains(&"enrollments".to_string()));
}

#[tokio::test]
async fn test_reconnect_leaves_no_state_from_previous_domain() {
    let project = Project::new().await;

    let mut switched = project.console();
    switched.execute_line("connect learn_hub_sqlite3").await;
    switched.execute_line("tables").await;
    switched.execute_line("connect shop_sqlite3").await;

    let mut fresh = project.console();
    fresh.execute_line("connect learn_hub_sqlite3").await;
    fresh.execute_line("disconnect").await;
    fresh.execute_line("connect shop_sqlite3").await;

    for input in ["connection", "tables", "relations", "Course.count"] {
        assert_eq!(
            switched.execute_line(input).await,
            fresh.execute_line(input).await,
            "{input}"
        );
    }

    let CommandOutput::Execution(result) = switched.execute_line("Product.count").await else {
        panic!("expected execution result");
    };
    assert_eq!(result.kind, ResultKind::Scalar(Value::Int(1)));

    assert_eq!(
        switched.execute_line("tables").await,
        CommandOutput::Tables(vec!["products".into()])
    );
    assert!(switched.execute_line("Course.count").await.is_error());
}

#[tokio::test]
async fn test_relations_for_bound_and_unbound_tables() {
    let project = Project::new().await;
    project
        .execute_out_of_band(
            "db/learn_hub/learn_hub.sqlite3",
            "CREATE TABLE audit_log (id INTEGER PRIMARY KEY, note TEXT)",
        )
        .await;
    let mut console = project.console();

    let (failures, text) = run_script(
        &mut console,
        &[
            "connect learn_hub_sqlite3",
            "relations courses",
            "rels audit_log",
            "relations ghosts",
        ],
    )
    .await;
    assert_eq!(failures, 1);
    assert!(text.contains("Model: LearnHub::Course"), "{text}");
    assert!(text.contains("  - instructor —> User (FK: instructor_id)"), "{text}");
    assert!(text.contains("  - students —> User (through: enrollments)"), "{text}");
    assert!(text.contains("No model found for table 'audit_log'."), "{text}");
    assert!(text.contains("Table not found: 'ghosts'."), "{text}");
}

#[tokio::test]
async fn test_expressions_against_shipped_models() {
    let project = Project::new().await;
    let mut console = project.console();
    console.execute_line("connect learn_hub_sqlite3").await;

    let (failures, text) = run_script(
        &mut console,
        &[
            "Course.count",
            "User.where(role_id: 1).pluck(:name)",
            "ar Category.find(2).parent_category",
            "Course.destroy_all",
        ],
    )
    .await;
    assert_eq!(failures, 1);
    assert!(text.contains("Result: 3"), "{text}");
    assert!(text.contains("Result: [\"Grace\", \"Linus\"]"), "{text}");
    assert!(text.contains("Databases"), "{text}");
    assert!(
        text.contains("Validation Error: Forbidden expression method: 'destroy_all'."),
        "{text}"
    );
}

#[tokio::test]
async fn test_explain_on_sqlite() {
    let project = Project::new().await;
    let mut console = project.console();

    let (failures, text) = run_script(
        &mut console,
        &[
            "connect learn_hub_sqlite3",
            "explain SELECT * FROM courses WHERE id = 1",
        ],
    )
    .await;
    assert_eq!(failures, 0);
    assert!(text.contains("SQL query execution plan:"), "{text}");
}

#[test]
fn test_exit_stops_a_script() {
    tokio_test::block_on(async {
        let project = Project::new().await;
        let mut console = project.console();
        let (failures, text) =
            run_script(&mut console, &["connect learn_hub_sqlite3", "exit", "describe ghosts"]).await;
        assert_eq!(failures, 0);
        assert!(!text.contains("ghosts"), "{text}");
    });
}
