//! Shared cache of list and detail results.
//!
//! Entries are keyed by resource name plus either the serialized list query
//! or the record id. An entry is *fresh* for `stale_time` after it was
//! fetched; fresh entries are served without touching the backend. Entries
//! not read for `gc_time` are evicted by [`QueryCache::sweep`], which runs on
//! its own at most once per `gc_time` when results are stored. A stale read
//! of an entry already past `gc_time` evicts it immediately.
//!
//! Invalidation bumps a per-resource generation. A fetch records the
//! generation before it starts and hands it back when storing its result;
//! results from before an invalidation are dropped instead of cached.

use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::entity::{EntityId, EntityRecord};

use super::query::{ListQuery, Page};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    List { resource: String, query: String },
    Detail { resource: String, id: EntityId },
}

impl CacheKey {
    fn resource(&self) -> &str {
        match self {
            CacheKey::List { resource, .. } | CacheKey::Detail { resource, .. } => resource,
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    List(Page),
    Detail(EntityRecord),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
    last_read: Instant,
}

/// Token returned by [`QueryCache::begin_fetch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Freshness-windowed cache shared by every store of a process
#[derive(Debug)]
pub struct QueryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    generations: Mutex<HashMap<String, u64>>,
    stale_time: Duration,
    gc_time: Duration,
    last_sweep: Mutex<Instant>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for QueryCache {
    fn from(config: &CacheConfig) -> Self {
        Self::new(
            Duration::from_millis(config.stale_time_ms),
            Duration::from_millis(config.gc_time_ms),
        )
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generations: Mutex::new(HashMap::new()),
            stale_time,
            gc_time,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Record the current generation of `resource` before fetching it
    pub fn begin_fetch(&self, resource: &str) -> Generation {
        let mut generations = self.generations.lock();
        Generation(*generations.entry(resource.to_string()).or_insert(0))
    }

    fn read(&self, key: &CacheKey) -> Option<CachedValue> {
        let now = Instant::now();
        {
            let mut entry = self.entries.get_mut(key)?;
            if now.duration_since(entry.fetched_at) < self.stale_time {
                entry.last_read = now;
                return Some(entry.value.clone());
            }
        }
        debug!(resource = key.resource(), "cache stale");
        self.entries
            .remove_if(key, |_, entry| now.duration_since(entry.last_read) >= self.gc_time);
        None
    }

    /// Store `value` unless `resource` was invalidated after `generation`.
    /// Returns whether the value was stored.
    fn write(&self, key: CacheKey, value: CachedValue, generation: Generation) -> bool {
        let generations = self.generations.lock();
        let current = generations.get(key.resource()).copied().unwrap_or(0);
        if current != generation.0 {
            debug!(
                resource = key.resource(),
                "discarding result fetched before invalidation"
            );
            return false;
        }
        let now = Instant::now();
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
                last_read: now,
            },
        );
        drop(generations);
        self.sweep_if_due(now);
        true
    }

    fn sweep_if_due(&self, now: Instant) {
        if now.duration_since(*self.last_sweep.lock()) >= self.gc_time {
            self.sweep();
        }
    }

    /// Fresh cached page for `query`, if any
    pub fn get_list(&self, resource: &str, query: &ListQuery) -> Option<Page> {
        let key = CacheKey::List {
            resource: resource.to_string(),
            query: query.cache_key(),
        };
        match self.read(&key)? {
            CachedValue::List(page) => Some(page),
            CachedValue::Detail(_) => None,
        }
    }

    pub fn put_list(
        &self,
        resource: &str,
        query: &ListQuery,
        page: Page,
        generation: Generation,
    ) -> bool {
        let key = CacheKey::List {
            resource: resource.to_string(),
            query: query.cache_key(),
        };
        self.write(key, CachedValue::List(page), generation)
    }

    /// Fresh cached record, if any
    pub fn get_detail(&self, resource: &str, id: &EntityId) -> Option<EntityRecord> {
        let key = CacheKey::Detail {
            resource: resource.to_string(),
            id: id.clone(),
        };
        match self.read(&key)? {
            CachedValue::Detail(record) => Some(record),
            CachedValue::List(_) => None,
        }
    }

    pub fn put_detail(&self, resource: &str, record: EntityRecord, generation: Generation) -> bool {
        let key = CacheKey::Detail {
            resource: resource.to_string(),
            id: record.id().clone(),
        };
        self.write(key, CachedValue::Detail(record), generation)
    }

    /// Drop every cached list of `resource`. In-flight fetches of the
    /// resource will not store their results.
    pub fn invalidate_lists(&self, resource: &str) {
        let mut generations = self.generations.lock();
        *generations.entry(resource.to_string()).or_insert(0) += 1;
        self.entries.retain(|key, _| {
            !matches!(key, CacheKey::List { resource: r, .. } if r == resource)
        });
        debug!(resource, "invalidated cached lists");
    }

    /// Drop the cached record `id` of `resource`
    pub fn invalidate_detail(&self, resource: &str, id: &EntityId) {
        let mut generations = self.generations.lock();
        *generations.entry(resource.to_string()).or_insert(0) += 1;
        self.entries.remove(&CacheKey::Detail {
            resource: resource.to_string(),
            id: id.clone(),
        });
        debug!(resource, %id, "invalidated cached record");
    }

    /// Evict entries that have not been read for `gc_time`.
    /// Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        *self.last_sweep.lock() = now;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_read) < self.gc_time);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, "swept unused cache entries");
        }
        evicted
    }

    pub fn clear(&self) {
        let mut generations = self.generations.lock();
        for generation in generations.values_mut() {
            *generation += 1;
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(ids: &[&str]) -> Page {
        let records = ids
            .iter()
            .map(|id| EntityRecord::from_value(json!({"id": id})).unwrap())
            .collect();
        Page::new(records, Some(ids.len() as u64))
    }

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(300), Duration::from_secs(3600))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_hit_then_stale() {
        let cache = cache();
        let query = ListQuery::new().with("status", "active");
        let generation = cache.begin_fetch("contacts");
        assert!(cache.put_list("contacts", &query, page(&["a"]), generation));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get_list("contacts", &query).unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_list("contacts", &query).is_none());
    }

    #[test]
    fn test_queries_are_keyed_separately() {
        let cache = cache();
        let active = ListQuery::new().with("status", "active");
        let inactive = ListQuery::new().with("status", "inactive");
        let generation = cache.begin_fetch("contacts");
        cache.put_list("contacts", &active, page(&["a"]), generation);

        assert!(cache.get_list("contacts", &active).is_some());
        assert!(cache.get_list("contacts", &inactive).is_none());
        assert!(cache.get_list("payments", &active).is_none());
    }

    #[test]
    fn test_invalidate_lists_is_scoped_to_resource() {
        let cache = cache();
        let query = ListQuery::new();
        let contacts = cache.begin_fetch("contacts");
        let payments = cache.begin_fetch("payments");
        cache.put_list("contacts", &query, page(&["a"]), contacts);
        cache.put_list("payments", &query, page(&["p"]), payments);
        let record = EntityRecord::from_value(json!({"id": "a"})).unwrap();
        cache.put_detail("contacts", record, contacts);

        cache.invalidate_lists("contacts");

        assert!(cache.get_list("contacts", &query).is_none());
        assert!(cache.get_list("payments", &query).is_some());
        assert!(cache.get_detail("contacts", &EntityId::from("a")).is_some());
    }

    #[test]
    fn test_fetch_started_before_invalidation_is_discarded() {
        let cache = cache();
        let query = ListQuery::new();
        let generation = cache.begin_fetch("contacts");

        cache.invalidate_lists("contacts");

        assert!(!cache.put_list("contacts", &query, page(&["stale"]), generation));
        assert!(cache.get_list("contacts", &query).is_none());

        let generation = cache.begin_fetch("contacts");
        assert!(cache.put_list("contacts", &query, page(&["fresh"]), generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_unread_entries() {
        let cache = QueryCache::new(Duration::from_secs(60), Duration::from_secs(600));
        let kept = ListQuery::new().with("page", "1");
        let dropped = ListQuery::new().with("page", "2");
        let generation = cache.begin_fetch("contacts");
        cache.put_list("contacts", &kept, page(&["a"]), generation);
        cache.put_list("contacts", &dropped, page(&["b"]), generation);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.get_list("contacts", &kept).is_some());

        tokio::time::advance(Duration::from_secs(580)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_read_evicts_expired_entry() {
        let cache = QueryCache::new(Duration::from_secs(1), Duration::from_secs(2));
        let query = ListQuery::new().with("search", "noura");
        let generation = cache.begin_fetch("contacts");
        cache.put_list("contacts", &query, page(&["a"]), generation);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_list("contacts", &query).is_none());
        assert_eq!(cache.len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_list("contacts", &query).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_storing_sweeps_expired_entries() {
        let cache = QueryCache::new(Duration::from_secs(1), Duration::from_secs(2));
        for i in 0..500 {
            let query = ListQuery::new().with("search", format!("q{i}"));
            let generation = cache.begin_fetch("contacts");
            cache.put_list("contacts", &query, page(&["a"]), generation);
        }
        assert_eq!(cache.len(), 500);

        tokio::time::advance(Duration::from_secs(3600)).await;
        let latest = ListQuery::new().with("search", "latest");
        let generation = cache.begin_fetch("contacts");
        cache.put_list("contacts", &latest, page(&["b"]), generation);

        assert_eq!(cache.len(), 1);
        assert!(cache.get_list("contacts", &latest).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = cache();
        let generation = cache.begin_fetch("contacts");
        cache.put_list("contacts", &ListQuery::new(), page(&["a"]), generation);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.put_list("contacts", &ListQuery::new(), page(&["a"]), generation));
    }
}
