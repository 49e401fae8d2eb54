//! Live catalog metadata and relationship reflection.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::binding::{Association, AssociationKind, Dependent, EntityBinding};
use crate::config::SchemaSettings;
use crate::connection::Session;
use crate::db::TableMetadata;
use crate::error::{Result, TrainerError};

/// One declared association, as `relations` reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssociationSummary {
    pub name: String,
    pub class_name: String,
    pub target_table: Option<String>,
    pub foreign_key: String,
    pub primary_key: String,
    pub through: Option<String>,
    pub dependent: Option<Dependent>,
}

/// Associations of one table's entity, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableRelationships {
    pub table: String,
    /// Qualified entity name; `None` when the table has no binding.
    pub entity: Option<String>,
    pub has_many: Vec<AssociationSummary>,
    pub has_one: Vec<AssociationSummary>,
    pub belongs_to: Vec<AssociationSummary>,
    pub has_and_belongs_to_many: Vec<AssociationSummary>,
}

impl TableRelationships {
    fn unbound(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        AssociationKind::ALL.iter().all(|kind| self.of(*kind).is_empty())
    }

    /// Associations of one kind.
    pub fn of(&self, kind: AssociationKind) -> &[AssociationSummary] {
        match kind {
            AssociationKind::HasMany => &self.has_many,
            AssociationKind::HasOne => &self.has_one,
            AssociationKind::BelongsTo => &self.belongs_to,
            AssociationKind::HasAndBelongsToMany => &self.has_and_belongs_to_many,
        }
    }
}

/// Table name to its relationships, in table order.
pub type RelationshipMap = IndexMap<String, TableRelationships>;

/// Reads catalog structure for the active session.
pub struct SchemaInspector<'a> {
    session: &'a Session,
    settings: &'a SchemaSettings,
}

impl<'a> SchemaInspector<'a> {
    pub fn new(session: &'a Session, settings: &'a SchemaSettings) -> Self {
        Self { session, settings }
    }

    /// User tables, sorted, system tables excluded.
    ///
    /// Computed once per session; tables created or dropped afterwards are
    /// not seen until the next `connect`.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = self
            .session
            .table_cache()
            .get_or_try_init(|| async {
                let mut tables: Vec<String> = self
                    .session
                    .client()
                    .list_tables()
                    .await?
                    .into_iter()
                    .filter(|t| !self.settings.system_tables.contains(t))
                    .collect();
                tables.sort();
                debug!(count = tables.len(), "Loaded table list");
                Ok::<_, TrainerError>(tables)
            })
            .await?;
        Ok(tables.clone())
    }

    /// Full metadata of one table.
    pub async fn describe_table(&self, table: &str) -> Result<TableMetadata> {
        self.ensure_table(table).await?;
        let client = self.session.client();

        let row_count = match client.row_count(table).await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Could not get row count for '{table}' —> {e}");
                None
            }
        };

        Ok(TableMetadata {
            name: table.to_string(),
            columns: client.columns(table).await?,
            indexes: client.indexes(table).await?,
            foreign_keys: client.foreign_keys(table).await?,
            primary_key: client.primary_key(table).await?,
            row_count,
        })
    }

    /// Relationships of every bound entity whose table exists.
    pub async fn relationships(&self) -> Result<RelationshipMap> {
        let registry = self.session.registry();
        let mut map = RelationshipMap::new();
        for table in self.list_tables().await? {
            if let Some(entity) = registry.entity_for_table(&table) {
                map.insert(table.clone(), self.summarize(&table, entity));
            }
        }
        Ok(map)
    }

    /// Relationships of one table; empty when it has no binding.
    pub async fn relationships_for(&self, table: &str) -> Result<TableRelationships> {
        self.ensure_table(table).await?;
        Ok(match self.session.registry().entity_for_table(table) {
            Some(entity) => self.summarize(table, entity),
            None => TableRelationships::unbound(table),
        })
    }

    async fn ensure_table(&self, table: &str) -> Result<()> {
        if self.list_tables().await?.iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(TrainerError::table_not_found(table))
        }
    }

    fn summarize(&self, table: &str, entity: &EntityBinding) -> TableRelationships {
        let registry = self.session.registry();
        let mut relationships = TableRelationships {
            table: table.to_string(),
            entity: Some(registry.qualified_name(entity)),
            ..TableRelationships::default()
        };

        for assoc in &entity.associations {
            let summary = self.summary(assoc);
            match assoc.kind {
                AssociationKind::HasMany => relationships.has_many.push(summary),
                AssociationKind::HasOne => relationships.has_one.push(summary),
                AssociationKind::BelongsTo => relationships.belongs_to.push(summary),
                AssociationKind::HasAndBelongsToMany => {
                    relationships.has_and_belongs_to_many.push(summary)
                }
            }
        }
        relationships
    }

    fn summary(&self, assoc: &Association) -> AssociationSummary {
        AssociationSummary {
            name: assoc.name.clone(),
            class_name: assoc.class_name.clone(),
            target_table: self
                .session
                .registry()
                .entity(&assoc.class_name)
                .map(|e| e.table.clone()),
            foreign_key: assoc.foreign_key.clone(),
            primary_key: assoc.primary_key.clone(),
            through: assoc.through.clone(),
            dependent: assoc.dependent,
        }
    }
}
