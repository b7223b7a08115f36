//! # In-Memory API Backend
//!
//! A REST-shaped backend that stands in for the remote CRUD service behind the
//! same [`Transport`] seam the real transport would use. The demo binary and
//! integration tests run against it.
//!
//! # Concurrency Model
//! One tokio task owns every endpoint store and processes requests
//! sequentially from an mpsc channel, answering over oneshot channels — so no
//! locks are needed. [`ChannelTransport`] is the cheap-to-clone sender side;
//! the backend shuts down when the last transport handle is dropped, or
//! eagerly on [`ChannelTransport::close`] after draining the queue.
//!
//! The backend owns the server side of the record lifecycle: it assigns
//! identifiers and `created_at`/`updated_at` timestamps on create, bumps
//! `updated_at` on update, enforces the page-size cap, and attaches the
//! read-only `_count` aggregates and requested relation embeds.

use crate::error::ApiError;
use crate::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SortDirection};
use crate::transport::{ApiRequest, Method, Transport};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// A reverse "has many" relation counted into the read-only `_count` object.
#[derive(Debug, Clone, Copy)]
pub struct CountRelation {
    /// The child collection, e.g. `"billings"`.
    pub endpoint: &'static str,
    /// The child field holding this entity's id.
    pub foreign_key: &'static str,
}

/// A belongs-to relation that can be embedded via the `include` flag.
#[derive(Debug, Clone, Copy)]
pub struct IncludeRelation {
    /// The relation name as requested and embedded, e.g. `"restaurant"`.
    pub name: &'static str,
    /// The related collection, e.g. `"restaurants"`.
    pub endpoint: &'static str,
    /// The local field holding the related id.
    pub local_key: &'static str,
}

/// Per-endpoint metadata the backend needs to serve an entity.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec {
    pub endpoint: &'static str,
    /// Fields that may appear in a filter; anything else is a request failure.
    pub filter_fields: &'static [&'static str],
    /// Subset of `filter_fields` designated for substring matching.
    pub text_filter_fields: &'static [&'static str],
    pub counts: &'static [CountRelation],
    pub includes: &'static [IncludeRelation],
}

/// Keys only the server may write.
const RESERVED_FIELDS: [&str; 4] = ["id", "created_at", "updated_at", "_count"];

struct Store {
    spec: EndpointSpec,
    records: HashMap<String, Value>,
    next_id: u64,
}

impl Store {
    fn new(spec: EndpointSpec) -> Self {
        Self {
            spec,
            records: HashMap::new(),
            next_id: 0,
        }
    }
}

/// Response channel answered once per request.
pub type ApiResponder = oneshot::Sender<Result<Value, ApiError>>;

enum BackendMessage {
    Request(ApiRequest, ApiResponder),
    Close,
}

/// The backend task: owns all stores, processes requests sequentially.
pub struct ApiServer {
    receiver: mpsc::Receiver<BackendMessage>,
    stores: HashMap<&'static str, Store>,
}

impl ApiServer {
    /// Creates the backend and its transport handle.
    pub fn new(buffer_size: usize) -> (Self, ChannelTransport) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let server = Self {
            receiver,
            stores: HashMap::new(),
        };
        (server, ChannelTransport { sender })
    }

    /// Registers an endpoint. Chainable for wiring.
    pub fn serve(mut self, spec: EndpointSpec) -> Self {
        self.stores.insert(spec.endpoint, Store::new(spec));
        self
    }

    /// Runs the request loop until every transport handle is dropped or a
    /// [`ChannelTransport::close`] message arrives. The close message travels
    /// the request channel, so everything queued before it is still served.
    pub async fn run(mut self) {
        info!(endpoints = self.stores.len(), "API backend started");
        while let Some(message) = self.receiver.recv().await {
            let (request, respond_to) = match message {
                BackendMessage::Request(request, respond_to) => (request, respond_to),
                BackendMessage::Close => {
                    info!("Close requested");
                    break;
                }
            };
            debug!(method = %request.method, path = %request.path, "Request");
            let result = self.handle(request);
            if let Err(e) = &result {
                warn!(error = %e, "Request failed");
            }
            let _ = respond_to.send(result);
        }
        info!("API backend shutdown");
    }

    fn handle(&mut self, request: ApiRequest) -> Result<Value, ApiError> {
        let path = request.path.trim_start_matches('/');
        let (endpoint, id) = match path.split_once('/') {
            Some((endpoint, id)) => (endpoint.to_string(), Some(id.to_string())),
            None => (path.to_string(), None),
        };
        if !self.stores.contains_key(endpoint.as_str()) {
            return Err(ApiError::Network(format!("no such endpoint: {endpoint}")));
        }
        match (request.method, id) {
            (Method::Post, None) => self.create(&endpoint, request.body),
            (Method::Get, None) => self.list(&endpoint, &request.params),
            (Method::Get, Some(id)) => self.get(&endpoint, &id, &request.params),
            (Method::Patch, Some(id)) => self.update(&endpoint, &id, request.body),
            (Method::Delete, Some(id)) => self.delete(&endpoint, &id),
            (method, _) => Err(ApiError::Network(format!(
                "unsupported route: {method} {}",
                request.path
            ))),
        }
    }

    fn create(&mut self, endpoint: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let mut fields = require_object(endpoint, body)?;
        let record = {
            let store = self.store_mut(endpoint);
            store.next_id += 1;
            let id = format!("{}_{}", endpoint, store.next_id);
            let now = json!(Utc::now());
            for reserved in RESERVED_FIELDS {
                fields.remove(reserved);
            }
            fields.insert("id".to_string(), json!(id));
            fields.insert("created_at".to_string(), now.clone());
            fields.insert("updated_at".to_string(), now);
            let record = Value::Object(fields);
            store.records.insert(id.clone(), record.clone());
            info!(endpoint, %id, size = store.records.len(), "Created");
            record
        };
        self.decorate(endpoint, record, &[])
    }

    fn get(&self, endpoint: &str, id: &str, params: &[(String, String)]) -> Result<Value, ApiError> {
        let include = self.parse_include(endpoint, params)?;
        let record = self
            .store(endpoint)
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(endpoint, id))?;
        debug!(endpoint, %id, "Get");
        self.decorate(endpoint, record, &include)
    }

    fn update(&mut self, endpoint: &str, id: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let patch = require_object(endpoint, body)?;
        let record = {
            let store = self.store_mut(endpoint);
            let record = store
                .records
                .get_mut(id)
                .ok_or_else(|| ApiError::not_found(endpoint, id))?;
            let fields = record
                .as_object_mut()
                .ok_or_else(|| ApiError::Network(format!("corrupt record in {endpoint}")))?;
            // An explicit null in the patch clears the field (e.g. a linked
            // reference); keys absent from the patch are untouched.
            for (key, value) in patch {
                if !RESERVED_FIELDS.contains(&key.as_str()) {
                    fields.insert(key, value);
                }
            }
            fields.insert("updated_at".to_string(), json!(Utc::now()));
            info!(endpoint, %id, "Updated");
            record.clone()
        };
        self.decorate(endpoint, record, &[])
    }

    fn delete(&mut self, endpoint: &str, id: &str) -> Result<Value, ApiError> {
        let store = self.store_mut(endpoint);
        if store.records.remove(id).is_none() {
            warn!(endpoint, %id, "Not found");
            return Err(ApiError::not_found(endpoint, id));
        }
        info!(endpoint, %id, size = store.records.len(), "Deleted");
        Ok(Value::Null)
    }

    fn list(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value, ApiError> {
        let controls = self.parse_list_controls(endpoint, params)?;
        let store = self.store(endpoint);

        let mut matches: Vec<&Value> = store
            .records
            .values()
            .filter(|record| controls.filters.iter().all(|f| f.matches(record)))
            .collect();
        let total = matches.len() as u64;

        matches.sort_by(|a, b| {
            let by_field = match controls.sort_by.as_deref() {
                Some(field) => {
                    let ordering = compare_field(a, b, field);
                    match controls.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                }
                None => Ordering::Equal,
            };
            by_field.then_with(|| id_ordering(a, b))
        });

        let items = matches
            .into_iter()
            .skip(controls.offset as usize)
            .take(controls.limit as usize)
            .map(|record| self.decorate(endpoint, record.clone(), &controls.include))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(endpoint, total, returned = items.len(), "List");
        Ok(json!({ "items": items, "total": total }))
    }

    /// Attaches the read-only `_count` aggregates and requested embeds.
    fn decorate(&self, endpoint: &str, record: Value, include: &[String]) -> Result<Value, ApiError> {
        let spec = self.store(endpoint).spec;
        let mut fields = match record {
            Value::Object(fields) => fields,
            _ => return Err(ApiError::Network(format!("corrupt record in {endpoint}"))),
        };
        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if !spec.counts.is_empty() {
            let mut counts = Map::new();
            for relation in spec.counts {
                let n = self
                    .stores
                    .get(relation.endpoint)
                    .map(|child| {
                        child
                            .records
                            .values()
                            .filter(|r| {
                                r.get(relation.foreign_key).and_then(Value::as_str)
                                    == Some(id.as_str())
                            })
                            .count()
                    })
                    .unwrap_or(0);
                counts.insert(relation.endpoint.to_string(), json!(n));
            }
            fields.insert("_count".to_string(), Value::Object(counts));
        }

        for name in include {
            let relation = spec
                .includes
                .iter()
                .find(|r| r.name == name.as_str())
                .ok_or_else(|| {
                    ApiError::Network(format!("unknown include `{name}` on {endpoint}"))
                })?;
            let embedded = fields
                .get(relation.local_key)
                .and_then(Value::as_str)
                .and_then(|fk| self.stores.get(relation.endpoint)?.records.get(fk))
                .cloned();
            fields.insert(relation.name.to_string(), embedded.unwrap_or(Value::Null));
        }

        Ok(Value::Object(fields))
    }

    fn parse_list_controls(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<ListControls, ApiError> {
        let spec = self.store(endpoint).spec;
        let mut controls = ListControls::default();
        for (key, value) in params {
            match key.as_str() {
                "offset" => {
                    controls.offset = value
                        .parse()
                        .map_err(|_| ApiError::Network(format!("invalid offset: {value}")))?;
                }
                "limit" => {
                    let limit: u64 = value
                        .parse()
                        .map_err(|_| ApiError::Network(format!("invalid limit: {value}")))?;
                    controls.limit = limit.min(MAX_PAGE_SIZE);
                }
                "sort_by" => controls.sort_by = Some(value.clone()),
                "direction" => {
                    controls.direction = match value.as_str() {
                        "asc" => SortDirection::Asc,
                        "desc" => SortDirection::Desc,
                        other => {
                            return Err(ApiError::Network(format!("invalid direction: {other}")));
                        }
                    };
                }
                "include" => {
                    if !spec.includes.iter().any(|r| r.name == value.as_str()) {
                        return Err(ApiError::Network(format!(
                            "unknown include `{value}` on {endpoint}"
                        )));
                    }
                    controls.include.push(value.clone());
                }
                field => {
                    controls.filters.push(parse_filter(&spec, field, value)?);
                }
            }
        }
        Ok(controls)
    }

    fn parse_include(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Vec<String>, ApiError> {
        let spec = self.store(endpoint).spec;
        let mut include = Vec::new();
        for (key, value) in params {
            if key == "include" {
                if !spec.includes.iter().any(|r| r.name == value.as_str()) {
                    return Err(ApiError::Network(format!(
                        "unknown include `{value}` on {endpoint}"
                    )));
                }
                include.push(value.clone());
            }
        }
        Ok(include)
    }

    // Both only called with endpoints validated by `handle`.
    fn store(&self, endpoint: &str) -> &Store {
        &self.stores[endpoint]
    }

    fn store_mut(&mut self, endpoint: &str) -> &mut Store {
        self.stores
            .get_mut(endpoint)
            .unwrap_or_else(|| unreachable!("endpoint validated in handle"))
    }
}

struct ListControls {
    filters: Vec<WireFilter>,
    offset: u64,
    limit: u64,
    sort_by: Option<String>,
    direction: SortDirection,
    include: Vec<String>,
}

impl Default for ListControls {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: None,
            direction: SortDirection::Asc,
            include: Vec::new(),
        }
    }
}

enum WireFilter {
    Equals { field: String, value: String },
    Contains { field: String, value: String },
}

impl WireFilter {
    fn matches(&self, record: &Value) -> bool {
        match self {
            Self::Equals { field, value } => match record.get(field.as_str()) {
                Some(Value::String(s)) => s == value,
                Some(Value::Number(n)) => {
                    value.parse::<f64>().ok() == n.as_f64()
                }
                _ => false,
            },
            Self::Contains { field, value } => record
                .get(field.as_str())
                .and_then(Value::as_str)
                .map(|s| s.to_lowercase().contains(&value.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

fn parse_filter(spec: &EndpointSpec, key: &str, value: &str) -> Result<WireFilter, ApiError> {
    if let Some(field) = key.strip_suffix("[contains]") {
        if !spec.text_filter_fields.contains(&field) {
            return Err(ApiError::Network(format!(
                "field `{field}` on {} does not support substring filters",
                spec.endpoint
            )));
        }
        return Ok(WireFilter::Contains {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    if !spec.filter_fields.contains(&key) {
        return Err(ApiError::Network(format!(
            "unknown filter field `{key}` on {}",
            spec.endpoint
        )));
    }
    Ok(WireFilter::Equals {
        field: key.to_string(),
        value: value.to_string(),
    })
}

fn require_object(endpoint: &str, body: Option<Value>) -> Result<Map<String, Value>, ApiError> {
    match body {
        Some(Value::Object(fields)) => Ok(fields),
        _ => Err(ApiError::Network(format!(
            "{endpoint} requires a JSON object body"
        ))),
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Ids compare by `(len, lexical)` so `billings_2 < billings_10`; ties in the
/// sort field therefore break in creation order, id ascending.
fn id_ordering(a: &Value, b: &Value) -> Ordering {
    let id_a = a.get("id").and_then(Value::as_str).unwrap_or_default();
    let id_b = b.get("id").and_then(Value::as_str).unwrap_or_default();
    (id_a.len(), id_a).cmp(&(id_b.len(), id_b))
}

/// The sender half of the backend channel; implements [`Transport`].
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<BackendMessage>,
}

impl ChannelTransport {
    /// Asks the backend to stop after serving everything already queued.
    ///
    /// Required for orchestrated shutdown: the backend cannot know how many
    /// transport clones are still held by live clients, so waiting for them
    /// all to drop would hang while any client outlives the system.
    pub async fn close(&self) {
        let _ = self.sender.send(BackendMessage::Close).await;
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(BackendMessage::Request(request, respond_to))
            .await
            .map_err(|_| ApiError::Network("backend closed".to_string()))?;
        response
            .await
            .map_err(|_| ApiError::Network("backend dropped response".to_string()))?
    }
}
