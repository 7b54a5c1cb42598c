use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes an entity type's columns, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    pub fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Starts an empty schema for `entity_type`. Add columns with [`EntitySchema::field`].
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Column names in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Looks up a column by name.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All columns flagged as primary identity. A valid schema has exactly one.
    pub fn identity_fields(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }
}

/// A single column of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_allow_null")]
    pub allow_null: bool,
    #[serde(default)]
    pub unique: bool,
    /// Value the backend fills in when an insert omits the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_allow_null() -> bool {
    true
}

impl FieldDef {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            allow_null: true,
            unique: false,
            default: None,
        }
    }

    /// Shorthand for the primary identity column (UUID, generated by the backend).
    pub fn identity(name: &str) -> Self {
        Self {
            primary_key: true,
            allow_null: false,
            ..Self::simple(name, FieldType::Uuid)
        }
    }

    /// Shorthand for a bounded string column.
    pub fn string(name: &str) -> Self {
        Self::simple(name, FieldType::String)
    }

    /// Shorthand for an unbounded text column.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for a UUID reference column.
    pub fn uuid(name: &str) -> Self {
        Self::simple(name, FieldType::Uuid)
    }

    /// Shorthand for a 32-bit integer column.
    pub fn integer(name: &str) -> Self {
        Self::simple(name, FieldType::Integer)
    }

    /// Shorthand for a 64-bit integer column.
    pub fn bigint(name: &str) -> Self {
        Self::simple(name, FieldType::BigInt)
    }

    /// Shorthand for a double precision column.
    pub fn double(name: &str) -> Self {
        Self::simple(name, FieldType::Double)
    }

    /// Shorthand for a boolean column.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Shorthand for a JSON blob column.
    pub fn json(name: &str) -> Self {
        Self::simple(name, FieldType::Json)
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Marks the column UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the insert default.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Storage type of a column. Informational for this layer: values are
/// opaque and type enforcement belongs to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Uuid,
    String,
    Text,
    Integer,
    BigInt,
    Double,
    Bool,
    Json,
}
