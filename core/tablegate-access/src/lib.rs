//! Schema-safe entity access over an asynchronous call capability.
//!
//! This crate sits between request handlers and a remote persistence backend
//! that can only be reached through a [`CallCapability`]. It makes every
//! operation against a registered entity type schema-safe, shapes results to
//! a projection, and collapses backend failures into one error vocabulary.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Validator**: checks named inputs and field names before dispatch
//! - **Projector**: restricts returned records to the requested fields
//! - **Normalizer**: classifies constraint failures and applies the
//!   pass-through-or-flatten rule at every operation boundary
//! - **Handle**: the entity access protocol (`find`, `insert`, `update_many`, ...)
//!
//! ## Operation pipeline
//!
//! 1. **Validate**: parameters, then query keys and projection entries
//! 2. **Precondition**: id-based writes confirm the record exists
//! 3. **Dispatch**: one call per backend action (`"<service>.<verb>"`)
//! 4. **Shape**: project rows, extract generated identities
//! 5. **Settle**: map any failure to a stable [`AccessError`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tablegate_access::{AccessHandle, Search, mock::MemoryBackend};
//! use tablegate_model::{EntitySchema, FieldDef, SchemaCatalog};
//!
//! # tokio_test::block_on(async {
//! let catalog = Arc::new(SchemaCatalog::new([EntitySchema::new("User")
//!     .field(FieldDef::identity("id"))
//!     .field(FieldDef::string("username").required().unique())])
//!     .unwrap());
//! let backend = MemoryBackend::new(catalog.clone());
//! let users = AccessHandle::new(&catalog, "User", None).unwrap();
//!
//! users.insert(&backend, &json!({ "username": "ada" })).await.unwrap();
//! let found = users
//!     .find_one(&backend, Search::new().query(json!({ "username": "ada" })))
//!     .await
//!     .unwrap();
//! assert_eq!(found.data["username"], "ada");
//! # });
//! ```

pub mod capability;
mod config;
mod envelope;
mod error;
mod handle;
mod join;
pub mod normalizer;
mod projector;
pub mod validator;

pub use capability::mock;
pub use capability::{BackendError, BackendViolation, CallCapability, CallError};
pub use config::AccessConfig;
pub use envelope::{Envelope, ErrorEnvelope, SUCCESS, into_envelopes};
pub use error::{
    AccessError, AccessResult, ConstraintKind, ConstraintViolation, FieldViolation,
};
pub use handle::{AccessHandle, Search};
pub use join::join_all_or_first_error;
pub use normalizer::{AtBoundary, Operation, StepError, classify_backend_error};
pub use projector::{project, project_record};
pub use validator::{FieldCheck, FieldValidator, Param, ParamValidator};
