//! Pre-dispatch validation of caller input.
//!
//! Nothing in here performs I/O: every check is decided from the input and
//! the entity's column list alone.

use crate::error::{AccessError, AccessResult, FieldViolation};
use serde_json::{Map, Value};

/// Outcome of a field scan in value style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Valid,
    Violation(FieldViolation),
    InvalidDataType,
}

impl FieldCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Rejecting style: the same classification as an error.
    pub fn into_result(self) -> AccessResult<()> {
        match self {
            Self::Valid => Ok(()),
            Self::Violation(v) => Err(AccessError::InvalidField(v)),
            Self::InvalidDataType => Err(AccessError::InvalidDataType),
        }
    }
}

/// Checks that projections and object keys only name known columns.
///
/// The first offending entry is reported in both modes: by position for a
/// projection, by iteration order for an object.
#[derive(Debug, Clone, Copy)]
pub struct FieldValidator<'a> {
    fields: &'a [String],
}

impl<'a> FieldValidator<'a> {
    pub fn new(fields: &'a [String]) -> Self {
        Self { fields }
    }

    fn knows(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Value style. Arrays are projections, objects are queries or payloads.
    pub fn inspect_fields(&self, value: &Value) -> FieldCheck {
        let violation = match value {
            Value::Array(items) => self.scan_items(items),
            Value::Object(map) => self.check_keys(map),
            _ => return FieldCheck::InvalidDataType,
        };
        violation.map_or(FieldCheck::Valid, FieldCheck::Violation)
    }

    /// Rejecting style of [`FieldValidator::inspect_fields`].
    pub fn verify_fields(&self, value: &Value) -> AccessResult<()> {
        self.inspect_fields(value).into_result()
    }

    /// First projection entry that is not a column.
    pub fn check_projection<S: AsRef<str>>(&self, projection: &[S]) -> Option<FieldViolation> {
        projection
            .iter()
            .position(|p| !self.knows(p.as_ref()))
            .map(|index| FieldViolation::Projection {
                index,
                field: projection[index].as_ref().to_string(),
            })
    }

    /// First object key that is not a column.
    pub fn check_keys(&self, map: &Map<String, Value>) -> Option<FieldViolation> {
        map.keys()
            .find(|k| !self.knows(k))
            .map(|k| FieldViolation::Key { field: k.clone() })
    }

    // Non-string entries can never name a column.
    fn scan_items(&self, items: &[Value]) -> Option<FieldViolation> {
        items.iter().enumerate().find_map(|(index, item)| match item {
            Value::String(s) if self.knows(s) => None,
            Value::String(s) => Some(FieldViolation::Projection {
                index,
                field: s.clone(),
            }),
            other => Some(FieldViolation::Projection {
                index,
                field: other.to_string(),
            }),
        })
    }
}

/// Role of a named operation input.
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    /// An identity value.
    Id(&'a Value),
    /// A query object.
    Query(&'a Value),
    /// A single entity to insert.
    Entity(&'a Value),
    /// An array of entities to insert.
    Entities(&'a Value),
    /// Fields to update.
    Update(&'a Value),
}

impl<'a> Param<'a> {
    fn value(&self) -> &'a Value {
        match *self {
            Self::Id(v) | Self::Query(v) | Self::Entity(v) | Self::Entities(v) | Self::Update(v) => v,
        }
    }

    fn is_missing(&self) -> bool {
        match self.value() {
            Value::Null => true,
            Value::String(s) => matches!(self, Self::Id(_)) && s.is_empty(),
            _ => false,
        }
    }
}

const OBJECT_REASON: &str =
    "it needs to be an object, and its fields must exist in the table (columns)";
const ARRAY_REASON: &str = "it needs to be an array of objects";
const ID_REASON: &str = "it needs to be a single identity value, not an object or an array";

/// Validates named operation inputs before anything is dispatched.
///
/// Inputs are checked in the order given; the first failure wins.
#[derive(Debug, Clone, Copy)]
pub struct ParamValidator<'a> {
    fields: FieldValidator<'a>,
}

impl<'a> ParamValidator<'a> {
    pub fn new(fields: &'a [String]) -> Self {
        Self {
            fields: FieldValidator::new(fields),
        }
    }

    pub fn validate(&self, params: &[(&str, Param<'_>)]) -> AccessResult<()> {
        params
            .iter()
            .try_for_each(|(name, param)| self.validate_one(name, *param))
    }

    fn validate_one(&self, name: &str, param: Param<'_>) -> AccessResult<()> {
        if param.is_missing() {
            return Err(AccessError::missing(name));
        }

        match param {
            Param::Id(Value::Object(_) | Value::Array(_)) => {
                Err(AccessError::invalid(name, ID_REASON))
            }
            Param::Id(_) => Ok(()),
            Param::Query(v) | Param::Entity(v) | Param::Update(v) => self.validate_object(name, v),
            Param::Entities(v) => self.validate_entities(name, v),
        }
    }

    fn validate_object(&self, name: &str, value: &Value) -> AccessResult<()> {
        let Value::Object(map) = value else {
            return Err(AccessError::invalid(name, OBJECT_REASON));
        };
        match self.fields.check_keys(map) {
            None => Ok(()),
            Some(violation) => Err(AccessError::invalid_fields(name, violation)),
        }
    }

    // Every element is type-checked before any element is field-checked.
    fn validate_entities(&self, name: &str, value: &Value) -> AccessResult<()> {
        let Value::Array(entities) = value else {
            return Err(AccessError::invalid(name, ARRAY_REASON));
        };

        let maps = entities
            .iter()
            .map(|e| e.as_object())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AccessError::invalid(name, OBJECT_REASON))?;

        match maps.into_iter().find_map(|m| self.fields.check_keys(m)) {
            None => Ok(()),
            Some(violation) => Err(AccessError::invalid_fields(name, violation)),
        }
    }
}
