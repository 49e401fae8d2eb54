//! Integration tests for the SQL trainer console.
//!
//! [`Project`] lays out `config/`, `models/` and `db/` under a temp dir the
//! way a real project root looks, then drives the console through it.

pub mod config_test;
pub mod console_test;
pub mod server_test;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sql_trainer::config::{ConfigurationStore, ProjectLayout, Settings};
use sql_trainer::connection::ConnectionManager;
use sql_trainer::console::Console;
use sql_trainer::db::SqlxConnector;
use sql_trainer::render::Renderer;
use sql_trainer::tasks::TaskRunner;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

const DATABASE_TOML: &str = r#"
[learn_hub_sqlite3]
adapter = "sqlite3"
database = "db/learn_hub/learn_hub.sqlite3"
pool = 1
timeout = 2000

[shop_sqlite3]
adapter = "sqlite3"
database = "db/shop/shop.sqlite3"
pool = 1
timeout = 2000
"#;

const LEARN_HUB_SCHEMA: &[&str] = &[
    "CREATE TABLE roles (id INTEGER PRIMARY KEY, name VARCHAR(50) NOT NULL)",
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(255) NOT NULL,
        role_id INTEGER REFERENCES roles(id)
    )",
    "CREATE UNIQUE INDEX index_users_on_email ON users (email)",
    "CREATE TABLE categories (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        parent_category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL
    )",
    "CREATE TABLE courses (
        id INTEGER PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        level VARCHAR(20) NOT NULL,
        price REAL,
        published BOOLEAN NOT NULL DEFAULT 0,
        instructor_id INTEGER REFERENCES users(id),
        category_id INTEGER REFERENCES categories(id)
    )",
    "CREATE TABLE enrollments (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE
    )",
    "CREATE TABLE schema_migrations (version VARCHAR(20) PRIMARY KEY)",
    "INSERT INTO roles (id, name) VALUES (1, 'student'), (2, 'instructor')",
    "INSERT INTO users (id, name, email, role_id) VALUES
        (1, 'Ada', 'ada@learnhub.io', 2),
        (2, 'Grace', 'grace@learnhub.io', 1),
        (3, 'Linus', 'linus@learnhub.io', 1)",
    "INSERT INTO categories (id, name, parent_category_id) VALUES (1, 'Databases', NULL), (2, 'SQL', 1)",
    "INSERT INTO courses (id, title, level, price, published, instructor_id, category_id) VALUES
        (1, 'Intro to SQL', 'beginner', 19.99, 1, 1, 2),
        (2, 'Joins in Depth', 'intermediate', 29.99, 1, 1, 2),
        (3, 'Query Planning', 'advanced', NULL, 0, 1, 1)",
    "INSERT INTO enrollments (id, user_id, course_id) VALUES (1, 2, 1), (2, 3, 1), (3, 2, 2)",
];

const SHOP_SCHEMA: &[&str] = &[
    "CREATE TABLE products (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL)",
    "INSERT INTO products (id, name) VALUES (1, 'Keyboard')",
];

const SHOP_PRODUCT_MODEL: &str = "name = \"Product\"\n";

/// A project root on disk.
pub struct Project {
    root: TempDir,
}

impl Project {
    /// Project with the shipped settings and learn_hub models plus a small
    /// `shop` domain.
    pub async fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let project = Self { root };

        let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
        project.write(
            "config/settings.toml",
            &std::fs::read_to_string(manifest.join("config/settings.toml")).unwrap(),
        );
        project.write("config/database.toml", DATABASE_TOML);

        for entry in std::fs::read_dir(manifest.join("models/learn_hub")).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            project.write(
                &format!("models/learn_hub/{name}"),
                &std::fs::read_to_string(&path).unwrap(),
            );
        }
        project.write("models/shop/product.toml", SHOP_PRODUCT_MODEL);

        project
            .create_database("db/learn_hub/learn_hub.sqlite3", LEARN_HUB_SCHEMA)
            .await;
        project.create_database("db/shop/shop.sqlite3", SHOP_SCHEMA).await;
        project
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    async fn create_database(&self, relative: &str, statements: &[&str]) {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true),
            )
            .await
            .unwrap();
        for statement in statements {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        pool.close().await;
    }

    /// Runs a statement against a database file behind the console's back.
    pub async fn execute_out_of_band(&self, relative: &str, statement: &str) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(self.path(relative)))
            .await
            .unwrap();
        sqlx::query(statement).execute(&pool).await.unwrap();
        pool.close().await;
    }

    /// Console wired the way the binary wires it, without colors.
    pub fn console(&self) -> Console {
        let layout = ProjectLayout::new(self.root());
        let settings = Arc::new(Settings::load_from_file(&layout.settings_file()).unwrap());
        let store =
            ConfigurationStore::load_from_file(&layout.database_config_file(), &settings).unwrap();
        let manager = ConnectionManager::new(
            Arc::new(store),
            layout.clone(),
            Box::new(SqlxConnector::new(layout.root())),
        );
        let tasks = TaskRunner::new(&settings.tasks, layout.root());
        let renderer = Renderer::new(&settings.console, false);
        Console::new(settings, manager, tasks, renderer).unwrap()
    }
}

/// Runs `commands` as a script and returns (failures, rendered output).
pub async fn run_script(console: &mut Console, commands: &[&str]) -> (usize, String) {
    let commands: Vec<String> = commands.iter().map(|c| c.to_string()).collect();
    let mut out = Vec::new();
    let failures = console.run_script(&commands, &mut out).await.unwrap();
    (failures, String::from_utf8(out).unwrap())
}
