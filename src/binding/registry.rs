//! Loading entity descriptors into a per-session registry.

use super::inflect;
use super::model::{Association, AssociationKind, Dependent, EntityBinding};
use crate::error::{Result, TrainerError};
use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// On-disk shape of one `models/<domain>/<entity>.toml` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityFile {
    name: String,
    table: Option<String>,
    primary_key: Option<String>,
    #[serde(default)]
    belongs_to: Vec<AssociationFile>,
    #[serde(default)]
    has_many: Vec<AssociationFile>,
    #[serde(default)]
    has_one: Vec<AssociationFile>,
    #[serde(default)]
    has_and_belongs_to_many: Vec<AssociationFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssociationFile {
    name: String,
    class_name: Option<String>,
    foreign_key: Option<String>,
    primary_key: Option<String>,
    through: Option<String>,
    source: Option<String>,
    join_table: Option<String>,
    association_foreign_key: Option<String>,
    dependent: Option<Dependent>,
    order: Option<String>,
}

impl EntityFile {
    fn declared(&self) -> impl Iterator<Item = (AssociationKind, &AssociationFile)> {
        self.belongs_to
            .iter()
            .map(|a| (AssociationKind::BelongsTo, a))
            .chain(self.has_many.iter().map(|a| (AssociationKind::HasMany, a)))
            .chain(self.has_one.iter().map(|a| (AssociationKind::HasOne, a)))
            .chain(
                self.has_and_belongs_to_many
                    .iter()
                    .map(|a| (AssociationKind::HasAndBelongsToMany, a)),
            )
    }
}

/// The entities of one domain, built on connect and dropped on disconnect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaBindingRegistry {
    domain: String,
    namespace: String,
    entities: IndexMap<String, EntityBinding>,
}

impl SchemaBindingRegistry {
    /// Scans `models_dir` for `*.toml` entity descriptors.
    pub fn load(models_dir: &Path, domain: &str) -> Result<Self> {
        if !models_dir.is_dir() {
            return Err(TrainerError::schema_binding(format!(
                "Models folder not found: '{}'.",
                models_dir.display()
            )));
        }

        let entries = std::fs::read_dir(models_dir).map_err(|e| {
            TrainerError::schema_binding(format!(
                "Failed to read models folder '{}': {e}",
                models_dir.display()
            ))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(TrainerError::schema_binding(format!(
                "No model files found in: '{}'.",
                models_dir.display()
            )));
        }

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                TrainerError::schema_binding(format!(
                    "Failed to read model file '{}': {e}",
                    path.display()
                ))
            })?;
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sources.push((label, content));
        }

        let registry = Self::parse(domain, &sources)?;
        debug!(
            "Loaded {} entity bindings for {} from {}",
            registry.len(),
            registry.namespace,
            models_dir.display()
        );
        Ok(registry)
    }

    /// Builds a registry from `(file label, TOML content)` pairs.
    pub fn parse(domain: &str, sources: &[(String, String)]) -> Result<Self> {
        let mut files = Vec::with_capacity(sources.len());
        for (label, content) in sources {
            let file: EntityFile = toml::from_str(content).map_err(|e| {
                TrainerError::schema_binding(format!("Invalid model file '{label}': {e}"))
            })?;
            files.push(file);
        }

        // Table and key of every entity, needed to resolve defaults.
        let mut heads: IndexMap<String, (String, String)> = IndexMap::new();
        for file in &files {
            let table = file
                .table
                .clone()
                .unwrap_or_else(|| inflect::tableize(&file.name));
            let primary_key = file.primary_key.clone().unwrap_or_else(|| "id".to_string());
            if heads.insert(file.name.clone(), (table, primary_key)).is_some() {
                return Err(TrainerError::schema_binding(format!(
                    "Entity '{}' is declared more than once.",
                    file.name
                )));
            }
        }

        let mut entities: IndexMap<String, EntityBinding> = IndexMap::new();
        for file in &files {
            let (table, primary_key) = heads
                .get(&file.name)
                .cloned()
                .ok_or_else(|| TrainerError::internal("entity head missing"))?;
            let mut associations = Vec::new();
            for (kind, declared) in file.declared() {
                if declared.through.is_some() {
                    continue;
                }
                associations.push(resolve_direct(file, &primary_key, &table, kind, declared, &heads)?);
            }
            entities.insert(
                file.name.clone(),
                EntityBinding {
                    name: file.name.clone(),
                    table,
                    primary_key,
                    associations,
                },
            );
        }

        // Through associations resolve against the direct ones.
        for file in &files {
            let mut resolved = Vec::new();
            for (kind, declared) in file.declared() {
                if declared.through.is_some() {
                    resolved.push(resolve_through(file, kind, declared, &entities)?);
                }
            }
            if let Some(entity) = entities.get_mut(&file.name) {
                entity.associations.extend(resolved);
                let order: Vec<String> = file.declared().map(|(_, a)| a.name.clone()).collect();
                entity
                    .associations
                    .sort_by_key(|a| order.iter().position(|n| *n == a.name));
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            namespace: domain.to_case(Case::Pascal),
            entities,
        })
    }

    /// Builds a registry from already-resolved bindings.
    pub fn from_entities(domain: &str, entities: Vec<EntityBinding>) -> Self {
        Self {
            domain: domain.to_string(),
            namespace: domain.to_case(Case::Pascal),
            entities: entities.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Type namespace, e.g. `LearnHub`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityBinding> {
        self.entities.values()
    }

    /// Looks up `Course` or `LearnHub::Course`.
    pub fn entity(&self, type_name: &str) -> Option<&EntityBinding> {
        match type_name.rsplit_once("::") {
            Some((namespace, name)) if namespace == self.namespace => self.entities.get(name),
            Some(_) => None,
            None => self.entities.get(type_name),
        }
    }

    /// The entity mapped to `table`, if any.
    pub fn entity_for_table(&self, table: &str) -> Option<&EntityBinding> {
        self.entities.values().find(|e| e.table == table)
    }

    /// Fully qualified type name.
    pub fn qualified_name(&self, entity: &EntityBinding) -> String {
        format!("{}::{}", self.namespace, entity.name)
    }
}

fn resolve_direct(
    owner: &EntityFile,
    owner_key: &str,
    owner_table: &str,
    kind: AssociationKind,
    declared: &AssociationFile,
    heads: &IndexMap<String, (String, String)>,
) -> Result<Association> {
    let class_name = declared.class_name.clone().unwrap_or_else(|| match kind {
        AssociationKind::BelongsTo | AssociationKind::HasOne => {
            declared.name.to_case(Case::Pascal)
        }
        AssociationKind::HasMany | AssociationKind::HasAndBelongsToMany => {
            inflect::classify(&declared.name)
        }
    });

    let (target_table, target_key) = heads.get(&class_name).ok_or_else(|| {
        TrainerError::schema_binding(format!(
            "Unknown class_name '{class_name}' in association '{}.{}'.",
            owner.name, declared.name
        ))
    })?;

    let (foreign_key, primary_key) = match kind {
        AssociationKind::BelongsTo => (
            declared
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}_id", declared.name)),
            declared.primary_key.clone().unwrap_or_else(|| target_key.clone()),
        ),
        _ => (
            declared
                .foreign_key
                .clone()
                .unwrap_or_else(|| inflect::foreign_key(&owner.name)),
            declared
                .primary_key
                .clone()
                .unwrap_or_else(|| owner_key.to_string()),
        ),
    };

    let (join_table, association_foreign_key) = if kind == AssociationKind::HasAndBelongsToMany {
        let mut tables = [owner_table, target_table.as_str()];
        tables.sort();
        (
            Some(
                declared
                    .join_table
                    .clone()
                    .unwrap_or_else(|| tables.join("_")),
            ),
            Some(
                declared
                    .association_foreign_key
                    .clone()
                    .unwrap_or_else(|| inflect::foreign_key(&class_name)),
            ),
        )
    } else {
        (None, None)
    };

    Ok(Association {
        kind,
        name: declared.name.clone(),
        class_name,
        foreign_key,
        primary_key,
        through: None,
        source: None,
        join_table,
        association_foreign_key,
        dependent: declared.dependent,
        order: declared.order.clone(),
    })
}

fn resolve_through(
    owner: &EntityFile,
    kind: AssociationKind,
    declared: &AssociationFile,
    entities: &IndexMap<String, EntityBinding>,
) -> Result<Association> {
    let through = declared.through.clone().unwrap_or_default();
    let label = format!("{}.{}", owner.name, declared.name);

    let through_assoc = entities
        .get(&owner.name)
        .and_then(|e| e.association(&through))
        .ok_or_else(|| {
            TrainerError::schema_binding(format!(
                "Association '{label}' goes through unknown association '{through}'."
            ))
        })?;

    let intermediate = entities.get(&through_assoc.class_name).ok_or_else(|| {
        TrainerError::schema_binding(format!(
            "Unknown class_name '{}' in association '{label}'.",
            through_assoc.class_name
        ))
    })?;

    let candidates = match &declared.source {
        Some(source) => vec![source.clone()],
        None => vec![declared.name.clone(), inflect::singularize(&declared.name)],
    };
    let source = candidates
        .iter()
        .find_map(|name| intermediate.association(name))
        .ok_or_else(|| {
            TrainerError::schema_binding(format!(
                "Could not find the source association {} on '{}' for '{label}'.",
                candidates.join(" or "),
                intermediate.name
            ))
        })?;

    if let Some(class_name) = &declared.class_name {
        if *class_name != source.class_name {
            return Err(TrainerError::schema_binding(format!(
                "Association '{label}' declares class_name '{class_name}' but its source is '{}'.",
                source.class_name
            )));
        }
    }

    Ok(Association {
        kind,
        name: declared.name.clone(),
        class_name: source.class_name.clone(),
        foreign_key: declared
            .foreign_key
            .clone()
            .unwrap_or_else(|| source.foreign_key.clone()),
        primary_key: declared
            .primary_key
            .clone()
            .unwrap_or_else(|| source.primary_key.clone()),
        through: Some(through),
        source: Some(source.name.clone()),
        join_table: None,
        association_foreign_key: None,
        dependent: declared.dependent,
        order: declared.order.clone(),
    })
}
