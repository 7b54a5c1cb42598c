//! An in-memory backend for testing.
//!
//! [`MemoryBackend`] answers every verb the access protocol dispatches,
//! enforcing NOT NULL, UNIQUE and defaults from the catalog's field
//! definitions and generating UUID v4 identities. Every call is recorded,
//! and failures can be injected per action.

use super::{BackendError, BackendViolation, CallCapability, CallError};
use crate::config::AccessConfig;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tablegate_model::{EntitySchema, Filter, Record, SchemaCatalog};
use uuid::Uuid;

type Fault = Box<dyn Fn(&str, &Value) -> Option<CallError> + Send + Sync>;

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub action: String,
    pub params: Value,
}

/// In-memory persistence backend keyed by entity type.
pub struct MemoryBackend {
    catalog: Arc<SchemaCatalog>,
    config: AccessConfig,
    tables: Mutex<HashMap<String, Vec<Record>>>,
    calls: Mutex<Vec<RecordedCall>>,
    faults: Mutex<Vec<Fault>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    /// Creates an empty backend using the default action naming.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self::with_config(catalog, AccessConfig::default())
    }

    pub fn with_config(catalog: Arc<SchemaCatalog>, config: AccessConfig) -> Self {
        Self {
            catalog,
            config,
            tables: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Injects a failure: before a call is served, each fault is asked in
    /// registration order and the first `Some` is returned instead.
    pub fn fail_when<F>(&self, fault: F)
    where
        F: Fn(&str, &Value) -> Option<CallError> + Send + Sync + 'static,
    {
        lock(&self.faults).push(Box::new(fault));
    }

    /// Removes every injected failure.
    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    /// Stores rows as-is, bypassing constraint checks.
    pub fn seed(&self, entity_type: &str, rows: impl IntoIterator<Item = Record>) {
        lock(&self.tables)
            .entry(entity_type.to_string())
            .or_default()
            .extend(rows);
    }

    /// Current rows of `entity_type`, in insertion order.
    pub fn rows(&self, entity_type: &str) -> Vec<Record> {
        lock(&self.tables)
            .get(entity_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of received calls whose action ends with `.verb`.
    pub fn calls_to(&self, verb: &str) -> usize {
        let suffix = format!(".{verb}");
        lock(&self.calls)
            .iter()
            .filter(|c| c.action.ends_with(&suffix))
            .count()
    }

    fn injected(&self, action: &str, params: &Value) -> Option<CallError> {
        lock(&self.faults).iter().find_map(|f| f(action, params))
    }

    fn serve(&self, action: &str, params: &Value) -> Result<Value, CallError> {
        let (service, verb) = action
            .rsplit_once('.')
            .ok_or_else(|| CallError::transport_with_code("ACTION_NOT_FOUND", action))?;
        let entity_type = self
            .config
            .entity_type(service)
            .filter(|t| self.catalog.contains(t))
            .ok_or_else(|| CallError::transport_with_code("SERVICE_NOT_FOUND", service))?;
        let schema = self
            .catalog
            .schema(entity_type)
            .map_err(|e| CallError::transport(e.to_string()))?;

        let mut tables = lock(&self.tables);
        let table = Table {
            schema,
            rows: tables.entry(entity_type.to_string()).or_default(),
        };

        match verb {
            "find" => table.find(params),
            "count" => table.count(params),
            "insert" => table.insert(params),
            "insertMany" => table.insert_many(params),
            "updateById" => table.update_by_id(params),
            "removeById" => table.remove_by_id(params),
            "removeMany" => table.remove_many(params),
            "removeAll" => Ok(table.remove_all()),
            _ => Err(CallError::transport_with_code("ACTION_NOT_FOUND", action)),
        }
    }
}

#[async_trait]
impl CallCapability for MemoryBackend {
    async fn call(&self, action: &str, params: Value) -> Result<Value, CallError> {
        lock(&self.calls).push(RecordedCall {
            action: action.to_string(),
            params: params.clone(),
        });
        if let Some(err) = self.injected(action, &params) {
            return Err(err);
        }
        self.serve(action, &params)
    }
}

struct Table<'a> {
    schema: &'a EntitySchema,
    rows: &'a mut Vec<Record>,
}

impl Table<'_> {
    fn identity(&self) -> &str {
        self.schema
            .fields
            .iter()
            .find(|f| f.primary_key)
            .map_or("id", |f| f.name.as_str())
    }

    fn filter(params: &Value) -> Result<Filter, CallError> {
        let query = params.get("query").unwrap_or(&Value::Null);
        Filter::parse(query).map_err(|e| BackendError::engine(e.to_string()).into())
    }

    fn position(&self, id: &Value) -> Option<usize> {
        let identity = self.identity();
        self.rows.iter().position(|r| r.get(identity) == Some(id))
    }

    fn find(self, params: &Value) -> Result<Value, CallError> {
        let filter = Self::filter(params)?;
        let limit = params
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let rows: Vec<Value> = self
            .rows
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .map(Value::Object)
            .collect();
        Ok(Value::Array(rows))
    }

    fn count(self, params: &Value) -> Result<Value, CallError> {
        let filter = Self::filter(params)?;
        Ok(json!(self.rows.iter().filter(|r| filter.matches(r)).count()))
    }

    fn insert(self, params: &Value) -> Result<Value, CallError> {
        let entity = object(params, "entity")?;
        let row = self.prepare(entity, &[])?;
        self.rows.push(row.clone());
        Ok(Value::Object(row))
    }

    // All rows are checked before any is stored.
    fn insert_many(self, params: &Value) -> Result<Value, CallError> {
        let Some(Value::Array(entities)) = params.get("entities") else {
            return Err(BackendError::engine("entities must be an array").into());
        };
        let mut staged: Vec<Record> = Vec::with_capacity(entities.len());
        for entity in entities {
            let entity = entity
                .as_object()
                .ok_or_else(|| CallError::from(BackendError::engine("entity must be an object")))?;
            let row = self.prepare(entity, &staged)?;
            staged.push(row);
        }
        self.rows.extend(staged.iter().cloned());
        Ok(Value::Array(staged.into_iter().map(Value::Object).collect()))
    }

    fn update_by_id(self, params: &Value) -> Result<Value, CallError> {
        let id = params.get("id").unwrap_or(&Value::Null);
        let update = object(params, "update")?;
        let Some(index) = self.position(id) else {
            return Ok(Value::Null);
        };

        let mut row = self.rows[index].clone();
        for (key, value) in update {
            if self.schema.get(key).is_none() {
                return Err(unknown_column(key));
            }
            row.insert(key.clone(), value.clone());
        }

        let others: Vec<Record> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, r)| r.clone())
            .collect();
        self.check(&row, &others)?;
        self.rows[index] = row.clone();
        Ok(Value::Object(row))
    }

    fn remove_by_id(self, params: &Value) -> Result<Value, CallError> {
        let id = params.get("id").unwrap_or(&Value::Null);
        Ok(match self.position(id) {
            Some(index) => Value::Object(self.rows.remove(index)),
            None => Value::Null,
        })
    }

    fn remove_many(self, params: &Value) -> Result<Value, CallError> {
        let filter = Self::filter(params)?;
        let before = self.rows.len();
        self.rows.retain(|r| !filter.matches(r));
        Ok(json!(before - self.rows.len()))
    }

    fn remove_all(self) -> Value {
        let removed = self.rows.len();
        self.rows.clear();
        json!(removed)
    }

    /// Builds a full row from an insert payload: columns in schema order,
    /// defaults applied, identity generated when absent.
    fn prepare(&self, entity: &Record, staged: &[Record]) -> Result<Record, CallError> {
        if let Some(key) = entity.keys().find(|k| self.schema.get(k).is_none()) {
            return Err(unknown_column(key));
        }

        let mut row = Record::new();
        for field in &self.schema.fields {
            let value = match entity.get(&field.name) {
                Some(v) => v.clone(),
                None if field.primary_key => Value::String(Uuid::new_v4().to_string()),
                None => field.default.clone().unwrap_or(Value::Null),
            };
            row.insert(field.name.clone(), value);
        }

        let existing: Vec<Record> = self.rows.iter().chain(staged).cloned().collect();
        self.check(&row, &existing)?;
        Ok(row)
    }

    fn check(&self, row: &Record, others: &[Record]) -> Result<(), CallError> {
        let mut violations = Vec::new();
        for field in &self.schema.fields {
            let value = row.get(&field.name).unwrap_or(&Value::Null);
            if value.is_null() {
                if !field.allow_null {
                    violations.push(BackendViolation::not_null(&field.name));
                }
                continue;
            }
            let must_be_unique = field.unique || field.primary_key;
            if must_be_unique && others.iter().any(|o| o.get(&field.name) == Some(value)) {
                violations.push(BackendViolation::unique(&field.name));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(BackendError::Validation { violations }.into())
        }
    }
}

fn object<'a>(params: &'a Value, key: &str) -> Result<&'a Record, CallError> {
    params
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| BackendError::engine(format!("{key} must be an object")).into())
}

fn unknown_column(key: &str) -> CallError {
    BackendError::engine(format!("Unknown column '{key}' in 'field list'")).into()
}
