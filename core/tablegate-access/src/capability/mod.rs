//! The call capability: the only way this layer reaches the backend.
//!
//! A capability dispatches a named action (`"<service>.<verb>"`) with a JSON
//! parameter object and resolves to the backend's JSON reply. How the action
//! travels (in-process broker, RPC, HTTP) is the implementor's business.

pub mod mock;

use crate::error::AccessError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Dispatches named actions to the persistence backend.
#[async_trait]
pub trait CallCapability: Send + Sync {
    /// Sends `params` to `action` and waits for the reply.
    async fn call(&self, action: &str, params: Value) -> Result<Value, CallError>;
}

#[async_trait]
impl<T: CallCapability + ?Sized> CallCapability for Arc<T> {
    async fn call(&self, action: &str, params: Value) -> Result<Value, CallError> {
        (**self).call(action, params).await
    }
}

/// Why a capability call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The persistence engine reported a failure.
    #[error("backend error: {0}")]
    Backend(BackendError),

    /// The remote side answered with an error that is already classified.
    /// It is handed to the caller unchanged.
    #[error("rejected: {0}")]
    Rejected(AccessError),

    /// Anything else: routing, timeouts, serialization, crashed handlers.
    #[error("transport error: {message}")]
    Transport {
        code: Option<String>,
        message: String,
    },
}

impl CallError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            code: None,
            message: message.into(),
        }
    }

    pub fn transport_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl From<BackendError> for CallError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Failure reported by the persistence engine itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Generic engine error with its native message (bad SQL, unknown column, ...).
    #[error("{message}")]
    Engine { message: String },

    /// Per-field validation failures.
    #[error("validation failed on {} field(s)", violations.len())]
    Validation { violations: Vec<BackendViolation> },

    /// An engine error of a shape this layer does not recognise.
    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl BackendError {
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}

/// A single field failure, with the backend's own type text
/// (e.g. `"notNull Violation"`, `"unique violation"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendViolation {
    pub path: String,
    pub kind: String,
}

impl BackendViolation {
    pub const NOT_NULL: &'static str = "notNull Violation";
    pub const UNIQUE: &'static str = "unique violation";

    pub fn new(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }

    pub fn not_null(path: impl Into<String>) -> Self {
        Self::new(path, Self::NOT_NULL)
    }

    pub fn unique(path: impl Into<String>) -> Self {
        Self::new(path, Self::UNIQUE)
    }
}
