//! Access handles: the entity access protocol for one entity type.

use crate::capability::{CallCapability, CallError};
use crate::config::AccessConfig;
use crate::envelope::Envelope;
use crate::error::{AccessError, AccessResult};
use crate::join::join_all_or_first_error;
use crate::normalizer::{AtBoundary, Operation, StepError};
use crate::projector::project;
use crate::validator::{FieldValidator, Param, ParamValidator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tablegate_model::{Record, SchemaCatalog};
use tracing::debug;

/// Arguments of a search.
///
/// `query` defaults to the empty query, `projection` to the handle's default
/// projection, and `limit` to no limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Search {
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub projection: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl Search {
    /// A search with every argument left at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query object.
    #[must_use]
    pub fn query(mut self, query: impl Into<Value>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Overrides the handle's default projection.
    #[must_use]
    pub fn projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Caps the number of records the backend returns.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Schema-safe access to one entity type.
///
/// A handle is immutable after construction and holds no connection; every
/// operation receives the call capability to dispatch through. It can be
/// shared freely between tasks.
#[derive(Debug, Clone)]
pub struct AccessHandle {
    entity_type: String,
    fields: Vec<String>,
    identity: String,
    default_projection: Vec<String>,
    service: String,
}

impl AccessHandle {
    /// Builds a handle with the default action naming.
    pub fn new(
        catalog: &SchemaCatalog,
        entity_type: &str,
        projection: Option<Vec<String>>,
    ) -> AccessResult<Self> {
        Self::with_config(catalog, entity_type, projection, &AccessConfig::default())
    }

    /// Builds a handle; `projection` becomes the default projection and
    /// falls back to every column.
    pub fn with_config(
        catalog: &SchemaCatalog,
        entity_type: &str,
        projection: Option<Vec<String>>,
        config: &AccessConfig,
    ) -> AccessResult<Self> {
        if entity_type.is_empty() {
            return Err(AccessError::MissingTableName);
        }
        let (fields, identity) = match (
            catalog.fields(entity_type),
            catalog.identity_field(entity_type),
        ) {
            (Ok(fields), Ok(identity)) => (fields.to_vec(), identity.to_string()),
            _ => return Err(AccessError::InvalidTableName(entity_type.to_string())),
        };

        let default_projection = match projection {
            None => fields.clone(),
            Some(projection) => {
                if let Some(unknown) = projection.iter().find(|&p| !fields.contains(p)) {
                    return Err(AccessError::InvalidFilterField {
                        entity_type: entity_type.to_string(),
                        field: unknown.clone(),
                    });
                }
                if projection.is_empty() {
                    return Err(AccessError::InvalidFilter);
                }
                projection
            }
        };

        Ok(Self {
            entity_type: entity_type.to_string(),
            service: config.service_name(entity_type),
            fields,
            identity,
            default_projection,
        })
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Every column, in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn identity_field(&self) -> &str {
        &self.identity
    }

    pub fn default_projection(&self) -> &[String] {
        &self.default_projection
    }

    /// Backend service this handle dispatches to.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Full action name for `op`.
    pub fn action(&self, op: Operation) -> String {
        format!("{}.{}", self.service, op.verb())
    }

    pub fn field_validator(&self) -> FieldValidator<'_> {
        FieldValidator::new(&self.fields)
    }

    fn params(&self) -> ParamValidator<'_> {
        ParamValidator::new(&self.fields)
    }

    async fn dispatch<C>(&self, call: &C, op: Operation, params: Value) -> Result<Value, CallError>
    where
        C: CallCapability + ?Sized,
    {
        let action = self.action(op);
        debug!(%action, "dispatching");
        call.call(&action, params).await
    }

    fn identity_of(&self, reply: &Value) -> Result<Value, StepError> {
        self.require_identity(reply.get(&self.identity))
    }

    fn require_identity(&self, id: Option<&Value>) -> Result<Value, StepError> {
        id.filter(|id| !id.is_null())
            .cloned()
            .ok_or_else(|| StepError::MalformedReply(format!("reply has no '{}'", self.identity)))
    }

    fn identity_query(&self, id: &Value) -> Value {
        let mut query = Map::new();
        query.insert(self.identity.clone(), id.clone());
        Value::Object(query)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Finds every record matching `search`, projected.
    ///
    /// Zero matches is `NothingFound`.
    pub async fn find<C>(&self, call: &C, search: Search) -> AccessResult<Envelope<Vec<Record>>>
    where
        C: CallCapability + ?Sized,
    {
        self.find_steps(call, search)
            .await
            .at_boundary(Operation::Find)
    }

    async fn find_steps<C>(
        &self,
        call: &C,
        search: Search,
    ) -> Result<Envelope<Vec<Record>>, StepError>
    where
        C: CallCapability + ?Sized,
    {
        let query = search.query.unwrap_or_else(|| Value::Object(Map::new()));
        let projection = search
            .projection
            .unwrap_or_else(|| self.default_projection.clone());

        if !query.is_object() {
            return Err(AccessError::invalid("search.query", "it needs to be an object").into());
        }
        let fields = self.field_validator();
        fields.verify_fields(&query)?;
        if projection.is_empty() {
            return Err(AccessError::InvalidFilter.into());
        }
        if let Some(violation) = fields.check_projection(&projection) {
            return Err(AccessError::InvalidField(violation).into());
        }

        let mut params = json!({ "query": query });
        if let Some(limit) = search.limit {
            params["limit"] = json!(limit);
        }

        let reply = self.dispatch(call, Operation::Find, params).await?;
        let Value::Array(rows) = reply else {
            return Err(StepError::MalformedReply("find reply is not an array".into()));
        };
        let records = project(rows, &projection)
            .map_err(|i| StepError::MalformedReply(format!("row {i} is not an object")))?;

        if records.is_empty() {
            return Err(AccessError::nothing_found("Search Complete: 0 element found").into());
        }
        Ok(Envelope::success(
            format!("Search Complete: {} element(s) found", records.len()),
            records,
        ))
    }

    /// Finds the first record matching `search`.
    pub async fn find_one<C>(&self, call: &C, search: Search) -> AccessResult<Envelope<Record>>
    where
        C: CallCapability + ?Sized,
    {
        let found = self.find(call, search.limit(1)).await?;
        let record = found
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::nothing_found("Search Complete: 0 element found"))?;
        Ok(Envelope::success("Search Complete: element found", record))
    }

    /// Finds the record whose identity is `id`.
    pub async fn find_by_id<C>(
        &self,
        call: &C,
        id: &Value,
        projection: Option<Vec<String>>,
    ) -> AccessResult<Envelope<Record>>
    where
        C: CallCapability + ?Sized,
    {
        self.params().validate(&[("id", Param::Id(id))])?;
        let search = Search {
            query: Some(self.identity_query(id)),
            projection,
            limit: None,
        };
        self.find_one(call, search).await
    }

    /// Counts the records matching `query`. Zero is a successful count.
    pub async fn count<C>(&self, call: &C, query: &Value) -> AccessResult<Envelope<u64>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params().validate(&[("query", Param::Query(query))])?;
            let reply = self
                .dispatch(call, Operation::Count, json!({ "query": query }))
                .await?;
            let n = reply
                .as_u64()
                .ok_or_else(|| StepError::MalformedReply("count is not an integer".into()))?;
            Ok::<_, StepError>(Envelope::success(
                format!("Count Complete: {n} element(s) found"),
                n,
            ))
        }
        .await
        .at_boundary(Operation::Count)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Inserts one entity and returns its generated identity.
    pub async fn insert<C>(&self, call: &C, entity: &Value) -> AccessResult<Envelope<Value>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params().validate(&[("entity", Param::Entity(entity))])?;
            let reply = self
                .dispatch(call, Operation::Insert, json!({ "entity": entity }))
                .await?;
            let id = self.identity_of(&reply)?;
            Ok::<_, StepError>(Envelope::success(
                format!("Insert Done: element (id: {}) inserted in table", show(&id)),
                id,
            ))
        }
        .await
        .at_boundary(Operation::Insert)
    }

    /// Inserts a batch and returns the generated identities in batch order.
    ///
    /// A failing batch is whatever the backend makes of it; nothing is rolled
    /// back here.
    pub async fn insert_many<C>(
        &self,
        call: &C,
        entities: &Value,
    ) -> AccessResult<Envelope<Vec<Value>>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params()
                .validate(&[("entities", Param::Entities(entities))])?;
            let reply = self
                .dispatch(call, Operation::InsertMany, json!({ "entities": entities }))
                .await?;
            let Value::Array(rows) = reply else {
                return Err(StepError::MalformedReply(
                    "insertMany reply is not an array".into(),
                ));
            };
            let ids = rows
                .iter()
                .map(|row| self.identity_of(row))
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, StepError>(Envelope::success(
                format!("Inserts Done: {} element(s) inserted in table", ids.len()),
                ids,
            ))
        }
        .await
        .at_boundary(Operation::InsertMany)
    }

    /// Updates the record whose identity is `id`.
    ///
    /// The record must exist: a missing id is `NothingFound` and no update
    /// is dispatched.
    pub async fn update_by_id<C>(
        &self,
        call: &C,
        id: &Value,
        update: &Value,
    ) -> AccessResult<Envelope<Value>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params()
                .validate(&[("id", Param::Id(id)), ("update", Param::Update(update))])?;
            self.find_by_id(call, id, Some(vec![self.identity.clone()]))
                .await?;
            debug!(entity_type = %self.entity_type, id = %show(id), "update precondition met");

            let reply = self
                .dispatch(
                    call,
                    Operation::UpdateById,
                    json!({ "id": id, "update": update }),
                )
                .await?;
            let id = self.identity_of(&reply)?;
            Ok::<_, StepError>(Envelope::success(
                format!("Update Done: element (id: {}) updated in table", show(&id)),
                id,
            ))
        }
        .await
        .at_boundary(Operation::UpdateById)
    }

    /// Updates every record matching `query`.
    ///
    /// One `updateById` is issued per matching record, all concurrently. If
    /// any of them fails the whole call fails with that error.
    pub async fn update_many<C>(
        &self,
        call: &C,
        query: &Value,
        update: &Value,
    ) -> AccessResult<Envelope<Vec<Value>>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params().validate(&[
                ("query", Param::Query(query)),
                ("update", Param::Update(update)),
            ])?;
            let matched = self
                .find(
                    call,
                    Search::new()
                        .query(query.clone())
                        .projection([self.identity.clone()]),
                )
                .await?;
            let ids = matched
                .data
                .iter()
                .map(|row| self.require_identity(row.get(&self.identity)))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(entity_type = %self.entity_type, matched = ids.len(), "fanning out updates");

            let updated =
                join_all_or_first_error(ids.iter().map(|id| self.update_by_id(call, id, update)))
                    .await?;
            let ids: Vec<Value> = updated.into_iter().map(|e| e.data).collect();
            Ok::<_, StepError>(Envelope::success(
                format!("Updates Done: {} element(s) updated", ids.len()),
                ids,
            ))
        }
        .await
        .at_boundary(Operation::UpdateMany)
    }

    /// Removes the record whose identity is `id`.
    pub async fn remove_by_id<C>(&self, call: &C, id: &Value) -> AccessResult<Envelope<Value>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params().validate(&[("id", Param::Id(id))])?;
            self.find_by_id(call, id, Some(vec![self.identity.clone()]))
                .await?;
            let reply = self
                .dispatch(call, Operation::RemoveById, json!({ "id": id }))
                .await?;
            if reply.is_null() {
                return Err(AccessError::nothing_found("Wrong id: nothing was deleted").into());
            }
            Ok::<_, StepError>(Envelope::success(
                format!("Delete Complete: element (id: {}) deleted", show(id)),
                id.clone(),
            ))
        }
        .await
        .at_boundary(Operation::RemoveById)
    }

    /// Removes every record matching `query`. Zero matches is a success.
    pub async fn remove_many<C>(&self, call: &C, query: &Value) -> AccessResult<Envelope<u64>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.params().validate(&[("query", Param::Query(query))])?;
            let reply = self
                .dispatch(call, Operation::RemoveMany, json!({ "query": query }))
                .await?;
            let n = reply
                .as_u64()
                .ok_or_else(|| StepError::MalformedReply("removeMany reply is not a count".into()))?;
            Ok::<_, StepError>(Envelope::success(
                format!("Delete Complete: {n} element(s) deleted"),
                n,
            ))
        }
        .await
        .at_boundary(Operation::RemoveMany)
    }

    /// Empties the table.
    pub async fn remove_all<C>(&self, call: &C) -> AccessResult<Envelope<()>>
    where
        C: CallCapability + ?Sized,
    {
        async {
            self.dispatch(call, Operation::RemoveAll, json!({})).await?;
            Ok::<_, StepError>(Envelope::success("Delete Complete", ()))
        }
        .await
        .at_boundary(Operation::RemoveAll)
    }
}

// Identities are usually strings; print them without JSON quotes.
fn show(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
