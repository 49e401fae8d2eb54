//! Integration tests for the SQL trainer console.
//!
//! Most tests build a throwaway project root backed by SQLite. Server-engine
//! tests need a running PostgreSQL database; set DATABASE_URL to run them.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
