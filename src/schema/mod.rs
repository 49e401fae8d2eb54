//! Schema inspection for the connected database.

mod inspector;

pub use inspector::{AssociationSummary, RelationshipMap, SchemaInspector, TableRelationships};
