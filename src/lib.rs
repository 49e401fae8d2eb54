//! SQL Trainer - an interactive console for practicing SQL and object queries.
//!
//! The binary is a thin shell over this library; integration tests drive the
//! same modules directly.

pub mod binding;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod console;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod render;
pub mod schema;
pub mod tasks;

#[cfg(test)]
mod testing;
