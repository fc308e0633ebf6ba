//! Shared test support: an in-memory REST backend with call recording and
//! failure injection.

#![allow(dead_code)]

pub mod mock_data;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use casebook::config::ViewConfig;
use casebook::remote::{ListQuery, Page, RemoteStore, ResourceTransport, RetryPolicy};
use casebook::{CasebookError, EntityId, EntityRecord, Resource, Result};
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// Transport operations, for counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
    BulkDelete,
}

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ListQuery),
    Get(EntityId),
    Create(Map<String, Value>),
    Update(EntityId, Map<String, Value>),
    Delete(EntityId),
    BulkDelete(Vec<EntityId>),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::List(_) => Op::List,
            Call::Get(_) => Op::Get,
            Call::Create(_) => Op::Create,
            Call::Update(..) => Op::Update,
            Call::Delete(_) => Op::Delete,
            Call::BulkDelete(_) => Op::BulkDelete,
        }
    }
}

/// In-memory backend for a single resource.
///
/// `list` understands `search` (case-insensitive substring over string
/// attributes), equality filters on any other parameter, and `page`/`limit`.
pub struct MemoryTransport {
    records: Mutex<Vec<EntityRecord>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<(Op, fn() -> CasebookError)>>,
    latency: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<EntityRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            latency: Mutex::new(None),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Fail the next call of `op` with the error built by `make`
    pub fn fail_next(&self, op: Op, make: fn() -> CasebookError) {
        self.fail_times(op, 1, make);
    }

    pub fn fail_times(&self, op: Op, times: usize, make: fn() -> CasebookError) {
        let mut failures = self.failures.lock();
        for _ in 0..times {
            failures.push_back((op, make));
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls.lock().iter().filter(|c| c.op() == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().last().cloned()
    }

    pub fn records(&self) -> Vec<EntityRecord> {
        self.records.lock().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.lock().iter().any(|r| r.id().as_str() == id)
    }

    /// Remove a record behind the client's back
    pub fn remove_silently(&self, id: &str) {
        self.records.lock().retain(|r| r.id().as_str() != id);
    }

    async fn begin(&self, call: Call) -> Result<()> {
        let op = call.op();
        self.calls.lock().push(call);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = {
            let mut failures = self.failures.lock();
            let position = failures.iter().position(|(o, _)| *o == op);
            position.and_then(|i| failures.remove(i))
        };
        match failure {
            Some((_, make)) => Err(make()),
            None => Ok(()),
        }
    }

    fn not_found(id: &EntityId) -> CasebookError {
        CasebookError::NotFound(id.to_string())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_query(record: &EntityRecord, query: &ListQuery) -> bool {
    query.params().iter().all(|(key, value)| match key.as_str() {
        "page" | "limit" | "sortBy" | "sortOrder" => true,
        "search" => {
            let needle = value.to_lowercase();
            record
                .attributes()
                .values()
                .filter_map(Value::as_str)
                .any(|s| s.to_lowercase().contains(&needle))
        }
        field => record.get_str(field) == Some(value.as_str()),
    })
}

impl ResourceTransport for MemoryTransport {
    async fn list(&self, _resource: &Resource, query: &ListQuery) -> Result<Page> {
        self.begin(Call::List(query.clone())).await?;

        let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let limit: usize = query
            .get("limit")
            .and_then(|l| l.parse().ok())
            .unwrap_or(20);

        let records = self.records.lock();
        let matching: Vec<EntityRecord> = records
            .iter()
            .filter(|r| matches_query(r, query))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let visible = matching
            .into_iter()
            .skip((page.max(1) - 1) * limit)
            .take(limit)
            .collect();
        Ok(Page::new(visible, Some(total)))
    }

    async fn get(&self, _resource: &Resource, id: &EntityId) -> Result<EntityRecord> {
        self.begin(Call::Get(id.clone())).await?;
        self.records
            .lock()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(
        &self,
        _resource: &Resource,
        payload: &Map<String, Value>,
    ) -> Result<EntityRecord> {
        self.begin(Call::Create(payload.clone())).await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = EntityRecord::new(format!("new-{n}"), payload.clone());
        self.records.lock().push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        _resource: &Resource,
        id: &EntityId,
        payload: &Map<String, Value>,
    ) -> Result<EntityRecord> {
        self.begin(Call::Update(id.clone(), payload.clone())).await?;
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        let mut attributes = record.attributes().clone();
        for (key, value) in payload {
            attributes.insert(key.clone(), value.clone());
        }
        *record = EntityRecord::new(id.clone(), attributes);
        Ok(record.clone())
    }

    async fn delete(&self, _resource: &Resource, id: &EntityId) -> Result<()> {
        self.begin(Call::Delete(id.clone())).await?;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn bulk_delete(&self, _resource: &Resource, ids: &[EntityId]) -> Result<()> {
        self.begin(Call::BulkDelete(ids.to_vec())).await?;
        self.records.lock().retain(|r| !ids.contains(r.id()));
        Ok(())
    }
}

/// A store over `transport` that never retries, for deterministic counts
pub fn store(transport: MemoryTransport) -> RemoteStore<MemoryTransport> {
    RemoteStore::new(transport).with_retry(RetryPolicy::none())
}

/// View settings with close animation off, so closes settle immediately
pub fn instant_view_config() -> ViewConfig {
    ViewConfig {
        animate_dialog_close: false,
        ..ViewConfig::default()
    }
}

pub fn network_error() -> CasebookError {
    CasebookError::Network("connection reset by peer".to_string())
}
