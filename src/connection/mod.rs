//! Connection management for the trainer.
//!
//! Centralizes the session lifecycle and the per-session entity bindings.

pub mod manager;

pub use manager::{ConnectionInfo, ConnectionManager, Session};
