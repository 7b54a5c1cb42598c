//! Failure normalization.
//!
//! Two rules live here:
//! - [`classify_backend_error`] turns a persistence-engine failure into a
//!   `DatabaseError` with per-field constraint details.
//! - [`Operation::settle`] is the single boundary rule every protocol
//!   operation ends with: classified errors pass through unchanged, backend
//!   constraint failures are classified at write boundaries, everything else
//!   is flattened to `UnknownError`.

use crate::capability::{BackendError, BackendViolation, CallError};
use crate::error::{AccessError, AccessResult, ConstraintKind, ConstraintViolation};
use tracing::warn;

/// Classifies a persistence-engine failure.
pub fn classify_backend_error(err: &BackendError) -> AccessError {
    match err {
        BackendError::Engine { message } => AccessError::Database {
            message: message.clone(),
            violations: Vec::new(),
        },
        BackendError::Validation { violations } => {
            let violations: Vec<ConstraintViolation> =
                violations.iter().map(classify_violation).collect();
            AccessError::Database {
                message: summarize(&violations),
                violations,
            }
        }
        BackendError::Other { .. } => AccessError::Database {
            message: "Unknown Error".to_string(),
            violations: Vec::new(),
        },
    }
}

fn classify_violation(v: &BackendViolation) -> ConstraintViolation {
    let kind = match v.kind.as_str() {
        BackendViolation::NOT_NULL => ConstraintKind::NotNull,
        BackendViolation::UNIQUE => ConstraintKind::Unique,
        other => ConstraintKind::Unknown(other.to_string()),
    };
    ConstraintViolation {
        field: v.path.clone(),
        kind,
    }
}

fn summarize(violations: &[ConstraintViolation]) -> String {
    let has = |want: fn(&ConstraintKind) -> bool| violations.iter().any(|v| want(&v.kind));

    let mut message = String::from("Details:");
    if has(|k| matches!(k, ConstraintKind::NotNull)) {
        message.push_str(" NOT NULL constraint not respected;");
    }
    if has(|k| matches!(k, ConstraintKind::Unique)) {
        message.push_str(" UNIQUE constraint not respected;");
    }
    if has(|k| matches!(k, ConstraintKind::Unknown(_))) {
        message.push_str(" Unknown error;");
    }
    message
}

/// A failure somewhere inside an operation's pipeline, before the boundary
/// rule has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    /// Already classified (validation, precondition, nested operation).
    Classified(AccessError),
    /// Raw failure of a capability call.
    Call(CallError),
    /// The backend replied with something the operation cannot read.
    MalformedReply(String),
}

impl From<AccessError> for StepError {
    fn from(err: AccessError) -> Self {
        Self::Classified(err)
    }
}

impl From<CallError> for StepError {
    fn from(err: CallError) -> Self {
        Self::Call(err)
    }
}

/// The protocol operations, as seen by the boundary rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Find,
    Count,
    Insert,
    InsertMany,
    UpdateById,
    UpdateMany,
    RemoveById,
    RemoveMany,
    RemoveAll,
}

impl Operation {
    /// Verb used in action names and logs.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::Count => "count",
            Self::Insert => "insert",
            Self::InsertMany => "insertMany",
            Self::UpdateById => "updateById",
            Self::UpdateMany => "updateMany",
            Self::RemoveById => "removeById",
            Self::RemoveMany => "removeMany",
            Self::RemoveAll => "removeAll",
        }
    }

    fn classifies_constraints(self) -> bool {
        matches!(
            self,
            Self::Insert | Self::InsertMany | Self::UpdateById | Self::UpdateMany
        )
    }

    fn unknown_message(self) -> &'static str {
        match self {
            Self::Find | Self::Count => {
                "Internal Error: something went wrong while searching for entities"
            }
            Self::Insert | Self::InsertMany => {
                "Internal Error: something went wrong while inserting the entities"
            }
            Self::UpdateById | Self::UpdateMany => {
                "Internal Error: something went wrong while updating the entities"
            }
            Self::RemoveById => "Internal Error: something went wrong while deleting the entity",
            Self::RemoveMany => "Internal Error: something went wrong while deleting the entities",
            Self::RemoveAll => "Internal Error: something went wrong while emptying the table",
        }
    }

    // Operations with an existence precondition restate NothingFound in
    // their own words.
    fn nothing_found_message(self) -> Option<&'static str> {
        match self {
            Self::UpdateById | Self::UpdateMany => Some("Nothing was updated"),
            Self::RemoveById => Some("Wrong id: nothing was deleted"),
            _ => None,
        }
    }

    /// Applies the boundary rule to a pipeline failure.
    pub fn settle(self, err: StepError) -> AccessError {
        match err {
            StepError::Classified(err) | StepError::Call(CallError::Rejected(err)) => {
                self.pass_through(err)
            }
            StepError::Call(CallError::Backend(backend)) if self.classifies_constraints() => {
                classify_backend_error(&backend)
            }
            StepError::Call(other) => {
                warn!(operation = self.verb(), error = %other, "flattening call failure");
                AccessError::unknown(self.unknown_message())
            }
            StepError::MalformedReply(reason) => {
                warn!(operation = self.verb(), %reason, "malformed backend reply");
                AccessError::unknown(self.unknown_message())
            }
        }
    }

    fn pass_through(self, err: AccessError) -> AccessError {
        match (self.nothing_found_message(), err.is_nothing_found()) {
            (Some(message), true) => AccessError::nothing_found(message),
            _ => err,
        }
    }
}

/// Ends a pipeline at an operation boundary.
pub trait AtBoundary<T> {
    fn at_boundary(self, op: Operation) -> AccessResult<T>;
}

impl<T> AtBoundary<T> for Result<T, StepError> {
    fn at_boundary(self, op: Operation) -> AccessResult<T> {
        self.map_err(|err| op.settle(err))
    }
}
