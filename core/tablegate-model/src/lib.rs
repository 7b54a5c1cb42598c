//! Core schema model for tablegate.
//!
//! Defines the types the access layer validates against:
//! - [`EntitySchema`] / [`FieldDef`]: an entity type's ordered columns
//! - [`SchemaCatalog`]: the process-wide, immutable registry of schemas
//! - [`Query`] / [`Filter`]: the query object shape and its evaluation
//! - [`Record`]: a row as exchanged with the backend
//!
//! Nothing here performs I/O beyond optionally reading schema definitions
//! from a JSON file at startup.

mod catalog;
mod error;
mod query;
mod record;
mod schema;

pub use catalog::SchemaCatalog;
pub use error::{CatalogError, CatalogResult, QueryError};
pub use query::{Condition, Filter, Query};
pub use record::{Record, RecordExt};
pub use schema::{EntitySchema, FieldDef, FieldType};
