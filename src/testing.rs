//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::binding::SchemaBindingRegistry;
use crate::commands::{dispatch, CommandContext, CommandOutput, CommandRouter};
use crate::config::{
    Adapter, ConfigurationStore, ConnectionDescriptor, ProjectLayout, Settings, TaskSettings,
};
use crate::connection::{ConnectionManager, Session};
use crate::db::{DatabaseClient, MockConnector, MockDatabaseClient, SqliteClient};
use crate::query::QueryValidator;
use crate::tasks::TaskRunner;
use sqlx::sqlite::SqlitePoolOptions;

const SCHEMA: &[&str] = &[
    "CREATE TABLE categories (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL)",
    "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL, email VARCHAR(255))",
    "CREATE TABLE courses (
        id INTEGER PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        level VARCHAR(20) NOT NULL,
        price INTEGER,
        category_id INTEGER REFERENCES categories(id)
    )",
    "CREATE TABLE enrollments (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE
    )",
    "CREATE INDEX index_enrollments_on_course_id ON enrollments (course_id)",
    "CREATE TABLE schema_migrations (version VARCHAR(20) PRIMARY KEY)",
    "INSERT INTO categories (id, name) VALUES (1, 'Databases')",
    "INSERT INTO users (id, name, email) VALUES (1, 'Ada', 'ada@learnhub.io'), (2, 'Grace', NULL)",
    "INSERT INTO courses (id, title, level, price, category_id) VALUES
        (1, 'Intro to SQL', 'beginner', 20, 1),
        (2, 'Joins in Depth', 'beginner', 30, 1),
        (3, 'Query Planning', 'advanced', 50, NULL)",
    "INSERT INTO enrollments (id, user_id, course_id) VALUES (1, 1, 1), (2, 2, 1), (3, 1, 2)",
];

const MODELS: &[(&str, &str)] = &[
    (
        "category.toml",
        r#"
name = "Category"

[[has_many]]
name = "courses"
dependent = "nullify"
"#,
    ),
    (
        "course.toml",
        r#"
name = "Course"

[[belongs_to]]
name = "category"

[[has_many]]
name = "enrollments"
dependent = "destroy"

[[has_many]]
name = "students"
through = "enrollments"
source = "user"
"#,
    ),
    (
        "enrollment.toml",
        r#"
name = "Enrollment"

[[belongs_to]]
name = "user"

[[belongs_to]]
name = "course"
"#,
    ),
    (
        "user.toml",
        r#"
name = "User"

[[has_many]]
name = "enrollments"

[[has_many]]
name = "courses"
through = "enrollments"
"#,
    ),
];

pub(crate) fn learn_hub_descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor {
        name: "learn_hub_sqlite3".to_string(),
        adapter: Adapter::Sqlite3,
        database: "db/learn_hub/learn_hub.sqlite3".to_string(),
        host: None,
        port: None,
        username: None,
        password: None,
        pool: 1,
        timeout_ms: Some(1000),
    }
}

pub(crate) fn learn_hub_registry() -> SchemaBindingRegistry {
    let sources: Vec<(String, String)> = MODELS
        .iter()
        .map(|(label, content)| (label.to_string(), content.to_string()))
        .collect();
    SchemaBindingRegistry::parse("learn_hub", &sources).unwrap()
}

/// In-memory SQLite session with a small learn_hub catalog.
pub(crate) async fn learn_hub_session() -> Session {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let client = SqliteClient::from_pool(pool);
    for statement in SCHEMA {
        client.execute_query(statement).await.unwrap();
    }
    Session::new(learn_hub_descriptor(), Box::new(client), learn_hub_registry())
}

/// Everything a command needs, wired the way the console wires it.
///
/// The project root is an empty temp dir, so `connect` fails at binding
/// time; [`Harness::connected`] attaches the in-memory session directly.
/// The task program is `true`.
pub(crate) struct Harness {
    _root: tempfile::TempDir,
    settings: Settings,
    manager: ConnectionManager,
    validator: QueryValidator,
    tasks: TaskRunner,
    router: CommandRouter,
}

impl Harness {
    pub(crate) fn disconnected() -> Self {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings {
            tasks: TaskSettings {
                program: "true".to_string(),
                list_args: Vec::new(),
            },
            ..Settings::default()
        };
        let store = ConfigurationStore::from_descriptors([learn_hub_descriptor()]);
        let manager = ConnectionManager::new(
            Arc::new(store),
            ProjectLayout::new(root.path()),
            Box::new(MockConnector::with_client(MockDatabaseClient::new(
                Adapter::Sqlite3,
            ))),
        );
        let validator = QueryValidator::new(&settings.validator).unwrap();
        let tasks = TaskRunner::new(&settings.tasks, root.path());

        Self {
            _root: root,
            settings,
            manager,
            validator,
            tasks,
            router: CommandRouter::new().unwrap(),
        }
    }

    pub(crate) async fn connected() -> Self {
        let mut harness = Self::disconnected();
        harness.manager.attach(learn_hub_session().await);
        harness
    }

    pub(crate) async fn run(&mut self, input: &str) -> CommandOutput {
        let command = self.router.parse(input);
        let mut ctx = CommandContext {
            settings: &self.settings,
            manager: &mut self.manager,
            validator: &self.validator,
            tasks: &self.tasks,
        };
        dispatch(&mut ctx, command).await
    }

    pub(crate) async fn drop_table_out_of_band(&self, table: &str) {
        self.manager
            .session()
            .unwrap()
            .client()
            .execute_query(&format!("DROP TABLE {table}"))
            .await
            .unwrap();
    }
}
