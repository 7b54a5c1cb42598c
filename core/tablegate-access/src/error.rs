//! Error vocabulary of the access layer.
//!
//! Every protocol operation fails with exactly one [`AccessError`] variant.
//! [`AccessError::name`] is the stable category callers branch on;
//! `Display` is the human message.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors surfaced by access handles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    /// No entity type was given when building a handle.
    #[error("Missing table name")]
    MissingTableName,

    /// The entity type is not in the catalog.
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// A default projection names a column the entity type does not have.
    #[error("Invalid filter field {field}. The table {entity_type} does not contain this column.")]
    InvalidFilterField { entity_type: String, field: String },

    /// A projection is present but empty.
    #[error("Invalid filter. No fields found.")]
    InvalidFilter,

    /// A required input is absent.
    #[error("Missing parameter {name}")]
    MissingParameter { name: String },

    /// An input has the wrong shape or references unknown columns.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
        violation: Option<FieldViolation>,
    },

    /// Field validation was handed something that is neither an object nor an array.
    #[error("Data type must be an object or an array of field names")]
    InvalidDataType,

    /// A query key or projection entry is not a column.
    #[error("{0}")]
    InvalidField(FieldViolation),

    /// The backend rejected the operation.
    #[error("{message}")]
    Database {
        message: String,
        violations: Vec<ConstraintViolation>,
    },

    /// A lookup or existence precondition matched zero records.
    #[error("{message}")]
    NothingFound { message: String },

    /// Anything that is not one of the above.
    #[error("{message}")]
    Unknown { message: String },
}

impl AccessError {
    /// Stable category name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MissingTableName => "MissingTableName",
            Self::InvalidTableName(_) => "InvalidTableName",
            Self::InvalidFilterField { .. } => "InvalidFilterField",
            Self::InvalidFilter => "InvalidFilter",
            Self::MissingParameter { .. } => "MissingParameter",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::InvalidDataType => "InvalidDataType",
            Self::InvalidField(_) => "InvalidField",
            Self::Database { .. } => "DatabaseError",
            Self::NothingFound { .. } => "NothingFound",
            Self::Unknown { .. } => "UnknownError",
        }
    }

    /// Structured details, when the category carries any.
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::InvalidField(violation) => Some(violation.to_value()),
            Self::InvalidParameter {
                violation: Some(violation),
                ..
            } => Some(violation.to_value()),
            Self::Database { violations, .. } if !violations.is_empty() => {
                serde_json::to_value(violations).ok()
            }
            _ => None,
        }
    }

    pub fn nothing_found(message: impl Into<String>) -> Self {
        Self::NothingFound {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
            violation: None,
        }
    }

    /// Wraps a field violation found while checking a named input.
    pub fn invalid_fields(name: impl Into<String>, violation: FieldViolation) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: violation.to_string(),
            violation: Some(violation),
        }
    }

    pub fn is_nothing_found(&self) -> bool {
        matches!(self, Self::NothingFound { .. })
    }
}

/// Where a field check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    /// The projection entry at `index` is not a column.
    Projection { index: usize, field: String },
    /// The object key is not a column.
    Key { field: String },
}

impl FieldViolation {
    /// The offending field name.
    pub fn field(&self) -> &str {
        match self {
            Self::Projection { field, .. } | Self::Key { field } => field,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Projection { index, field } => json!({ "index": index, "field": field }),
            Self::Key { field } => json!({ "field": field }),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Projection { index, field } => {
                write!(f, "Invalid field n°{index} for filter: {field}")
            }
            Self::Key { field } => write!(f, "Invalid field {field} for query"),
        }
    }
}

/// One backend constraint failure, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintViolation {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
}

/// Constraint class of a [`ConstraintViolation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    NotNull,
    Unique,
    /// Any other backend validation type; the raw type text is kept for logs.
    Unknown(String),
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotNull => "notNull",
            Self::Unique => "unique",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl Serialize for ConstraintKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
