//! Process-wide registry of entity schemas.
//!
//! The catalog is validated once when it is built and is read-only afterwards,
//! so it can be shared behind an `Arc` without any locking.

use crate::error::{CatalogError, CatalogResult};
use crate::schema::EntitySchema;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

#[derive(Debug)]
struct CatalogEntry {
    schema: EntitySchema,
    field_names: Vec<String>,
    identity: String,
}

/// Immutable mapping from entity-type name to its ordered field list.
#[derive(Debug)]
pub struct SchemaCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl SchemaCatalog {
    /// Builds the catalog, failing fast on the first malformed schema.
    ///
    /// Every entity type must declare exactly one primary identity field.
    pub fn new(schemas: impl IntoIterator<Item = EntitySchema>) -> CatalogResult<Self> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for schema in schemas {
            if index.contains_key(&schema.entity_type) {
                return Err(CatalogError::DuplicateEntityType(schema.entity_type));
            }
            let entry = Self::check(schema)?;
            index.insert(entry.schema.entity_type.clone(), entries.len());
            entries.push(entry);
        }

        info!(entity_types = entries.len(), "schema catalog built");
        Ok(Self { entries, index })
    }

    /// Builds the catalog from a JSON array of [`EntitySchema`] definitions.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let schemas: Vec<EntitySchema> = serde_json::from_str(json)?;
        Self::new(schemas)
    }

    /// Reads a JSON schema file and builds the catalog from it.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn check(schema: EntitySchema) -> CatalogResult<CatalogEntry> {
        if schema.fields.is_empty() {
            return Err(CatalogError::EmptySchema(schema.entity_type));
        }

        let mut seen = HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CatalogError::DuplicateField {
                    entity_type: schema.entity_type.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let identity = match schema.identity_fields().as_slice() {
            [] => return Err(CatalogError::MissingIdentity(schema.entity_type.clone())),
            [single] => single.name.clone(),
            many => {
                return Err(CatalogError::DuplicateIdentity {
                    entity_type: schema.entity_type.clone(),
                    fields: many.iter().map(|f| f.name.clone()).collect(),
                });
            }
        };

        Ok(CatalogEntry {
            field_names: schema.field_names(),
            identity,
            schema,
        })
    }

    fn entry(&self, entity_type: &str) -> CatalogResult<&CatalogEntry> {
        self.index
            .get(entity_type)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| CatalogError::UnknownEntityType(entity_type.to_string()))
    }

    /// Field names of `entity_type`, in declaration order.
    pub fn fields(&self, entity_type: &str) -> CatalogResult<&[String]> {
        self.entry(entity_type).map(|e| e.field_names.as_slice())
    }

    /// Name of the primary identity field of `entity_type`.
    pub fn identity_field(&self, entity_type: &str) -> CatalogResult<&str> {
        self.entry(entity_type).map(|e| e.identity.as_str())
    }

    /// Full schema of `entity_type`.
    pub fn schema(&self, entity_type: &str) -> CatalogResult<&EntitySchema> {
        self.entry(entity_type).map(|e| &e.schema)
    }

    /// Whether `entity_type` is registered.
    pub fn contains(&self, entity_type: &str) -> bool {
        self.index.contains_key(entity_type)
    }

    /// Registered entity types, in registration order.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.schema.entity_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
