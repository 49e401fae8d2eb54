//! Schema bindings: typed entities over tables.
//!
//! Each domain ships declarative entity descriptors under
//! `models/<domain>/*.toml`. A [`SchemaBindingRegistry`] is built from them
//! when a session opens and dropped with the session.

pub mod inflect;
mod model;
mod registry;

pub use model::{Association, AssociationKind, Dependent, EntityBinding};
pub use registry::SchemaBindingRegistry;
