//! Normalized list queries and result pages.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::entity::{EntityId, EntityRecord};

/// Ordered query parameters for a list request.
///
/// Parameters are kept in insertion order so the serialized form, and with
/// it the cache key, is stable for equal view states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. A later value for the same name replaces the
    /// earlier one in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.params.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// URL-encoded form, used both as the query string and the cache key
    pub fn cache_key(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

/// One page of list results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<EntityRecord>,
    /// Total matching records on the server, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl Page {
    pub fn new(records: Vec<EntityRecord>, total: Option<u64>) -> Self {
        Self { records, total }
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.records.iter().map(|r| r.id().clone()).collect()
    }

    pub fn find(&self, id: &EntityId) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
