//! Entity and association bindings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Association kinds an entity can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// One-to-many.
    HasMany,
    /// One-to-one.
    HasOne,
    /// Many-to-one.
    BelongsTo,
    /// Many-to-many through a join table.
    HasAndBelongsToMany,
}

impl AssociationKind {
    /// Display order used by the relationship map.
    pub const ALL: [AssociationKind; 4] = [
        AssociationKind::HasMany,
        AssociationKind::HasOne,
        AssociationKind::BelongsTo,
        AssociationKind::HasAndBelongsToMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasMany => "has_many",
            Self::HasOne => "has_one",
            Self::BelongsTo => "belongs_to",
            Self::HasAndBelongsToMany => "has_and_belongs_to_many",
        }
    }

    /// True when navigating the association yields a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::HasMany | Self::HasAndBelongsToMany)
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to associated rows when the owner is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependent {
    Destroy,
    DeleteAll,
    Nullify,
    RestrictWithError,
    RestrictWithException,
}

impl Dependent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destroy => "destroy",
            Self::DeleteAll => "delete_all",
            Self::Nullify => "nullify",
            Self::RestrictWithError => "restrict_with_error",
            Self::RestrictWithException => "restrict_with_exception",
        }
    }
}

impl fmt::Display for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared association with every default resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub kind: AssociationKind,
    pub name: String,
    /// Target entity type name.
    pub class_name: String,
    /// belongs_to: column on the owner; otherwise column on the target (or
    /// the join table for habtm).
    pub foreign_key: String,
    /// Key the foreign key points at.
    pub primary_key: String,
    pub through: Option<String>,
    pub source: Option<String>,
    /// habtm only.
    pub join_table: Option<String>,
    /// habtm only: join table column pointing at the target.
    pub association_foreign_key: Option<String>,
    pub dependent: Option<Dependent>,
    /// Default ordering applied when the association is navigated.
    pub order: Option<String>,
}

/// A table mapped to a typed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityBinding {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    pub associations: Vec<Association>,
}

impl EntityBinding {
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Associations of one kind, in declaration order.
    pub fn associations_of(&self, kind: AssociationKind) -> impl Iterator<Item = &Association> {
        self.associations.iter().filter(move |a| a.kind == kind)
    }
}
