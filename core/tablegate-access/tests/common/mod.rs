//! Shared fixtures for access tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tablegate_access::mock::MemoryBackend;
use tablegate_access::{AccessHandle, CallCapability, CallError};
use tablegate_model::{EntitySchema, FieldDef, SchemaCatalog};

/// The four entity types used throughout the access tests.
pub fn catalog() -> Arc<SchemaCatalog> {
    let schemas = [
        EntitySchema::new("User")
            .field(FieldDef::identity("id"))
            .field(FieldDef::string("username").required().unique())
            .field(FieldDef::text("password").required())
            .field(FieldDef::string("role").required().with_default("USER"))
            .field(FieldDef::integer("age")),
        EntitySchema::new("Token")
            .field(FieldDef::identity("id"))
            .field(FieldDef::text("token").required())
            .field(FieldDef::uuid("userId").required()),
        EntitySchema::new("Table1")
            .field(FieldDef::identity("id"))
            .field(
                FieldDef::string("first")
                    .required()
                    .unique()
                    .with_default("Default"),
            )
            .field(FieldDef::text("second").required())
            .field(FieldDef::double("third").required()),
        EntitySchema::new("Table2")
            .field(FieldDef::identity("id"))
            .field(FieldDef::text("first").required())
            .field(FieldDef::bigint("second")),
    ];
    Arc::new(SchemaCatalog::new(schemas).expect("fixture catalog is valid"))
}

pub fn handle(entity_type: &str) -> AccessHandle {
    AccessHandle::new(&catalog(), entity_type, None).expect("fixture entity type")
}

pub fn backend() -> MemoryBackend {
    MemoryBackend::new(catalog())
}

/// A handle and an empty backend for `entity_type`.
pub fn setup(entity_type: &str) -> (AccessHandle, MemoryBackend) {
    (handle(entity_type), backend())
}

/// Routes `tablegate` logs to the test writer; set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A capability that answers from a fixed list of replies, in order, and
/// records the actions it saw. Running out of replies is a transport error.
pub struct Scripted {
    replies: Mutex<Vec<Result<Value, CallError>>>,
    seen: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(mut replies: Vec<Result<Value, CallError>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: Value) -> Self {
        Self::new(vec![Ok(reply)])
    }

    pub fn failing(err: CallError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallCapability for Scripted {
    async fn call(&self, action: &str, _params: Value) -> Result<Value, CallError> {
        self.seen.lock().unwrap().push(action.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(CallError::transport("script exhausted")))
    }
}
