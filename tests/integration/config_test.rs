//! Configuration and model-file integration tests.
//!
//! Checks the files shipped under `config/` and `models/` and the load-time
//! rejection of malformed descriptors.

use std::path::Path;

use sql_trainer::binding::{AssociationKind, Dependent, SchemaBindingRegistry};
use sql_trainer::config::{ConfigurationStore, ProjectLayout, Settings};
use sql_trainer::error::TrainerError;

fn manifest_layout() -> ProjectLayout {
    ProjectLayout::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_shipped_settings_load() {
    let settings = Settings::load_from_file(&manifest_layout().settings_file()).unwrap();
    assert!(settings
        .validator
        .forbidden_sql_commands
        .contains(&"drop".to_string()));
    assert!(settings
        .validator
        .forbidden_expression_methods
        .contains(&"destroy_all".to_string()));
    assert_eq!(settings.prompt(None), "sql-trainer> ");
}

#[test]
fn test_shipped_database_config_loads() {
    let layout = manifest_layout();
    let settings = Settings::load_from_file(&layout.settings_file()).unwrap();
    let store = ConfigurationStore::load_from_file(&layout.database_config_file(), &settings).unwrap();

    assert_eq!(
        store.names().collect::<Vec<_>>(),
        vec!["learn_hub_sqlite3", "learn_hub_postgresql", "learn_hub_mysql2"]
    );
    let groups = store.grouped_by_domain();
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["learn_hub"]);
}

#[test]
fn test_adapter_mismatch_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.toml");
    std::fs::write(
        &path,
        r#"
[school_postgresql]
adapter = "mysql2"
database = "school"
pool = 5
username = "trainer"
password = "secret"
host = "localhost"
port = 3306
"#,
    )
    .unwrap();

    let err = ConfigurationStore::load_from_file(&path, &Settings::default()).unwrap_err();
    assert!(matches!(err, TrainerError::Configuration(_)));
    assert!(err.to_string().contains("Adapter mismatch"), "{err}");
}

#[test]
fn test_sqlite_path_outside_domain_folder_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.toml");
    std::fs::write(
        &path,
        r#"
[school_sqlite3]
adapter = "sqlite3"
database = "db/school/other.sqlite3"
pool = 5
timeout = 5000
"#,
    )
    .unwrap();

    let err = ConfigurationStore::load_from_file(&path, &Settings::default()).unwrap_err();
    assert!(matches!(err, TrainerError::Configuration(_)));
    assert!(err.to_string().contains("Invalid SQLite database path"), "{err}");
}

#[test]
fn test_shipped_learn_hub_models_resolve() {
    let registry = SchemaBindingRegistry::load(
        &manifest_layout().models_dir("learn_hub"),
        "learn_hub",
    )
    .unwrap();
    assert_eq!(registry.len(), 20);
    assert_eq!(registry.namespace(), "LearnHub");

    let course = registry.entity("LearnHub::Course").unwrap();
    assert_eq!(course.table, "courses");

    let instructor = course.association("instructor").unwrap();
    assert_eq!(instructor.kind, AssociationKind::BelongsTo);
    assert_eq!(instructor.class_name, "User");
    assert_eq!(instructor.foreign_key, "instructor_id");

    let modules = course.association("modules").unwrap();
    assert_eq!(modules.foreign_key, "course_id");
    assert_eq!(modules.dependent, Some(Dependent::Destroy));

    let students = course.association("students").unwrap();
    assert_eq!(students.class_name, "User");
    assert_eq!(students.through.as_deref(), Some("enrollments"));

    let lesson = registry.entity("Lesson").unwrap();
    assert_eq!(lesson.association("mod").unwrap().foreign_key, "module_id");

    let category = registry.entity("Category").unwrap();
    let subcategories = category.association("subcategories").unwrap();
    assert_eq!(subcategories.class_name, "Category");
    assert_eq!(subcategories.foreign_key, "parent_category_id");

    assert_eq!(registry.entity("Quiz").unwrap().table, "quizzes");
    assert_eq!(
        registry.entity_for_table("discussion_replies").unwrap().name,
        "DiscussionReply"
    );
}

#[test]
fn test_missing_models_folder() {
    let err = SchemaBindingRegistry::load(Path::new("/nonexistent/models/shop"), "shop").unwrap_err();
    assert!(matches!(err, TrainerError::SchemaBinding(_)));
}
