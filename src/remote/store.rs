//! Cache-aware reads and invalidating writes over a transport.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::entity::{EntityId, EntityRecord};
use crate::error::{CasebookError, Result};
use crate::resources::Resource;

use super::cache::QueryCache;
use super::query::{ListQuery, Page};
use super::retry::{RetryPolicy, execute_with_retry};
use super::ResourceTransport;

/// Remote Store Adapter for every resource reachable through one transport.
///
/// Reads are served from the shared [`QueryCache`] while fresh, otherwise
/// fetched with retries on transient failures. Writes are attempted once
/// and, on success, invalidate every cached list of the resource. The cache
/// is never patched optimistically: callers refetch after a write.
///
/// Cloning is cheap; clones share the transport and the cache.
pub struct RemoteStore<T> {
    transport: Arc<T>,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
}

impl<T> Clone for RemoteStore<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
            retry: self.retry.clone(),
        }
    }
}

impl<T: ResourceTransport> RemoteStore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: Arc::new(QueryCache::default()),
            retry: RetryPolicy::default(),
        }
    }

    /// Build a store whose cache windows and retry policy come from `config`
    pub fn from_config(transport: T, config: &Config) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: Arc::new(QueryCache::from(&config.cache)),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One page of `resource` matching `query`
    pub async fn list(&self, resource: &Resource, query: &ListQuery) -> Result<Page> {
        if let Some(page) = self.cache.get_list(resource.name(), query) {
            debug!(resource = resource.name(), query = %query.cache_key(), "list cache hit");
            return Ok(page);
        }

        let generation = self.cache.begin_fetch(resource.name());
        let result = execute_with_retry(&self.retry, || self.transport.list(resource, query)).await;
        match result {
            Ok(page) => {
                self.cache.put_list(resource.name(), query, page.clone(), generation);
                Ok(page)
            }
            Err(e) => Err(self.observe_failure(resource, "list", e)),
        }
    }

    /// One record of `resource`
    pub async fn get(&self, resource: &Resource, id: &EntityId) -> Result<EntityRecord> {
        if let Some(record) = self.cache.get_detail(resource.name(), id) {
            debug!(resource = resource.name(), %id, "detail cache hit");
            return Ok(record);
        }

        let generation = self.cache.begin_fetch(resource.name());
        let result = execute_with_retry(&self.retry, || self.transport.get(resource, id)).await;
        match result {
            Ok(record) => {
                self.cache.put_detail(resource.name(), record.clone(), generation);
                Ok(record)
            }
            Err(e) => Err(self.observe_failure(resource, "get", e)),
        }
    }

    pub async fn create(
        &self,
        resource: &Resource,
        payload: &Map<String, Value>,
    ) -> Result<EntityRecord> {
        match self.transport.create(resource, payload).await {
            Ok(record) => {
                info!(resource = resource.name(), id = %record.id(), "created record");
                self.cache.invalidate_lists(resource.name());
                Ok(record)
            }
            Err(e) => Err(self.observe_failure(resource, "create", e)),
        }
    }

    pub async fn update(
        &self,
        resource: &Resource,
        id: &EntityId,
        payload: &Map<String, Value>,
    ) -> Result<EntityRecord> {
        match self.transport.update(resource, id, payload).await {
            Ok(record) => {
                info!(resource = resource.name(), %id, "updated record");
                self.cache.invalidate_detail(resource.name(), id);
                self.cache.invalidate_lists(resource.name());
                Ok(record)
            }
            Err(e) => Err(self.observe_failure(resource, "update", e)),
        }
    }

    pub async fn delete(&self, resource: &Resource, id: &EntityId) -> Result<()> {
        match self.transport.delete(resource, id).await {
            Ok(()) => {
                info!(resource = resource.name(), %id, "deleted record");
                self.cache.invalidate_detail(resource.name(), id);
                self.cache.invalidate_lists(resource.name());
                Ok(())
            }
            Err(e) => Err(self.observe_failure(resource, "delete", e)),
        }
    }

    pub async fn bulk_delete(&self, resource: &Resource, ids: &[EntityId]) -> Result<()> {
        if ids.is_empty() {
            return Err(CasebookError::EmptySelection);
        }
        match self.transport.bulk_delete(resource, ids).await {
            Ok(()) => {
                info!(
                    resource = resource.name(),
                    count = ids.len(),
                    "deleted records"
                );
                for id in ids {
                    self.cache.invalidate_detail(resource.name(), id);
                }
                self.cache.invalidate_lists(resource.name());
                Ok(())
            }
            Err(e) => Err(self.observe_failure(resource, "bulk delete", e)),
        }
    }

    /// A vanished record makes every cached list of its resource suspect
    fn observe_failure(
        &self,
        resource: &Resource,
        operation: &str,
        error: CasebookError,
    ) -> CasebookError {
        if matches!(error, CasebookError::NotFound(_)) {
            self.cache.invalidate_lists(resource.name());
        }
        warn!(resource = resource.name(), operation, "request failed: {error}");
        error
    }
}
