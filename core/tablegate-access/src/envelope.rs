//! The uniform result shapes returned to request handlers.

use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category name of every successful operation.
pub const SUCCESS: &str = "Operation Successful";

/// Success envelope: `{ name, message, data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub name: String,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            name: SUCCESS.to_string(),
            message: message.into(),
            data,
        }
    }

    /// Replaces the payload, keeping name and message.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            name: self.name,
            message: self.message,
            data: f(self.data),
        }
    }
}

/// Error envelope: `{ name, message, data? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&AccessError> for ErrorEnvelope {
    fn from(err: &AccessError) -> Self {
        Self {
            name: err.name().to_string(),
            message: err.to_string(),
            data: err.data(),
        }
    }
}

impl From<AccessError> for ErrorEnvelope {
    fn from(err: AccessError) -> Self {
        Self::from(&err)
    }
}

/// Converts an operation result into the envelope pair handed to callers.
pub fn into_envelopes<T>(
    result: Result<Envelope<T>, AccessError>,
) -> Result<Envelope<T>, ErrorEnvelope> {
    result.map_err(ErrorEnvelope::from)
}
