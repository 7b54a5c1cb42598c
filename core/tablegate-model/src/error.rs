//! Error types for the model crate.

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while building or reading the schema catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The entity type was never registered.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// The entity type has no primary identity column.
    #[error("entity type '{0}' needs exactly one primary identity field, found none")]
    MissingIdentity(String),

    /// The entity type flags more than one column as primary identity.
    #[error("entity type '{entity_type}' needs exactly one primary identity field, found {}", fields.join(", "))]
    DuplicateIdentity {
        entity_type: String,
        fields: Vec<String>,
    },

    /// The same entity type was registered twice.
    #[error("entity type '{0}' registered more than once")]
    DuplicateEntityType(String),

    /// A column name appears twice in one schema.
    #[error("entity type '{entity_type}' declares field '{field}' more than once")]
    DuplicateField { entity_type: String, field: String },

    /// The schema declares no columns.
    #[error("entity type '{0}' declares no fields")]
    EmptySchema(String),

    /// Schema definitions could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema definitions could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while interpreting a query object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The query is not a JSON object.
    #[error("query must be an object")]
    NotAnObject,

    /// An operator object uses an operator this layer does not know.
    #[error("unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// The operand does not fit the operator (e.g. `$in` without an array).
    #[error("invalid operand for '{operator}' on field '{field}'")]
    InvalidOperand { field: String, operator: String },
}
