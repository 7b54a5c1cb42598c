//! Query objects: `{ field: scalar | { "$op": operand, .. } }`.
//!
//! [`Query`] builds the wire shape; [`Filter`] parses it back and evaluates
//! it against a record. Only equality and the comparison operators below are
//! understood; there is no boolean composition beyond the implicit AND across
//! fields.

use crate::Record;
use crate::error::QueryError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

const OP_NE: &str = "$ne";
const OP_LT: &str = "$lt";
const OP_LTE: &str = "$lte";
const OP_GT: &str = "$gt";
const OP_GTE: &str = "$gte";
const OP_IN: &str = "$in";

/// Builder for the JSON query shape sent through the call capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    clauses: Map<String, Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field == value`. Replaces any earlier clause on the same field.
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.insert(field.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn ne(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, OP_NE, value.into())
    }

    #[must_use]
    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, OP_LT, value.into())
    }

    #[must_use]
    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, OP_LTE, value.into())
    }

    #[must_use]
    pub fn gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, OP_GT, value.into())
    }

    #[must_use]
    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.operator(field, OP_GTE, value.into())
    }

    /// `field` is one of `values`.
    #[must_use]
    pub fn is_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.operator(field, OP_IN, Value::Array(values))
    }

    // Operators on one field accumulate into a single operator object, so
    // `.gt("age", 1).lt("age", 9)` becomes `{"age": {"$gt": 1, "$lt": 9}}`.
    fn operator(mut self, field: &str, op: &str, operand: Value) -> Self {
        let slot = self
            .clauses
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !is_operator_object(slot) {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(ops) = slot {
            ops.insert(op.to_string(), operand);
        }
        self
    }

    /// Field names referenced by this query.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.clauses.clone())
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Self {
        Value::Object(query.clauses)
    }
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

/// A single predicate on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    In(Vec<Value>),
}

impl Condition {
    /// Parses the right-hand side of a query clause.
    ///
    /// A non-empty object whose keys all start with `$` is an operator
    /// object; anything else is an equality operand.
    pub fn parse(field: &str, clause: &Value) -> Result<Vec<Self>, QueryError> {
        let Value::Object(ops) = clause else {
            return Ok(vec![Self::Eq(clause.clone())]);
        };
        if !is_operator_object(clause) {
            return Ok(vec![Self::Eq(clause.clone())]);
        }

        ops.iter()
            .map(|(op, operand)| {
                let condition = match op.as_str() {
                    OP_NE => Self::Ne(operand.clone()),
                    OP_LT => Self::Lt(operand.clone()),
                    OP_LTE => Self::Lte(operand.clone()),
                    OP_GT => Self::Gt(operand.clone()),
                    OP_GTE => Self::Gte(operand.clone()),
                    OP_IN => match operand {
                        Value::Array(values) => Self::In(values.clone()),
                        _ => {
                            return Err(QueryError::InvalidOperand {
                                field: field.to_string(),
                                operator: op.clone(),
                            });
                        }
                    },
                    _ => {
                        return Err(QueryError::UnknownOperator {
                            field: field.to_string(),
                            operator: op.clone(),
                        });
                    }
                };
                Ok(condition)
            })
            .collect()
    }

    /// Evaluates the predicate against a column value (`None` when the
    /// record lacks the column, which compares like `null`).
    pub fn matches(&self, candidate: Option<&Value>) -> bool {
        let candidate = candidate.unwrap_or(&Value::Null);
        match self {
            Self::Eq(v) => loose_eq(candidate, v),
            Self::Ne(v) => !loose_eq(candidate, v),
            Self::Lt(v) => compare(candidate, v) == Some(Ordering::Less),
            Self::Lte(v) => matches!(
                compare(candidate, v),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Gt(v) => compare(candidate, v) == Some(Ordering::Greater),
            Self::Gte(v) => matches!(
                compare(candidate, v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::In(values) => values.iter().any(|v| loose_eq(candidate, v)),
        }
    }
}

// Numbers compare by value so that `5` and `5.0` are equal.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// A parsed query, ready to be evaluated against records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Vec<Condition>)>,
}

impl Filter {
    /// Parses a query object. `null` is accepted as the empty query.
    pub fn parse(query: &Value) -> Result<Self, QueryError> {
        let clauses = match query {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(QueryError::NotAnObject),
        };

        let clauses = clauses
            .iter()
            .map(|(field, clause)| {
                Condition::parse(field, clause).map(|conditions| (field.clone(), conditions))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(Self { clauses })
    }

    /// True when every clause holds for `record`. The empty filter matches everything.
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|(field, conditions)| {
            let candidate = record.get(field);
            conditions.iter().all(|c| c.matches(candidate))
        })
    }
}
