//! Remote Store Adapter.
//!
//! This module puts a uniform contract over the list/get/create/update/delete
//! operations of a REST resource:
//!
//! - [`ResourceTransport`] is the seam to the backend ([`HttpTransport`] in
//!   production, in-memory transports in tests)
//! - [`QueryCache`] holds list and detail results with freshness windows
//! - [`RemoteStore`] combines both: cached and retried reads, single-attempt
//!   mutations that invalidate cached lists on success
//! - [`FetchScope`] ties outstanding reads to the lifetime of a view

pub mod cache;
pub mod error;
pub mod http;
pub mod query;
pub mod retry;
pub mod scope;
pub mod store;

use std::future::Future;

use serde_json::{Map, Value};

use crate::entity::{EntityId, EntityRecord};
use crate::error::Result;
use crate::resources::Resource;

pub use cache::QueryCache;
pub use http::HttpTransport;
pub use query::{ListQuery, Page};
pub use retry::{RetryPolicy, execute_with_retry};
pub use scope::FetchScope;
pub use store::RemoteStore;

/// Common interface for REST backends
pub trait ResourceTransport: Send + Sync {
    /// Fetch one page of records matching `query`
    fn list(
        &self,
        resource: &Resource,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page>> + Send;

    /// Fetch one record, failing with `NotFound` if it no longer exists
    fn get(
        &self,
        resource: &Resource,
        id: &EntityId,
    ) -> impl Future<Output = Result<EntityRecord>> + Send;

    /// Create a record from a validated payload
    fn create(
        &self,
        resource: &Resource,
        payload: &Map<String, Value>,
    ) -> impl Future<Output = Result<EntityRecord>> + Send;

    /// Partially update a record
    fn update(
        &self,
        resource: &Resource,
        id: &EntityId,
        payload: &Map<String, Value>,
    ) -> impl Future<Output = Result<EntityRecord>> + Send;

    fn delete(&self, resource: &Resource, id: &EntityId)
    -> impl Future<Output = Result<()>> + Send;

    fn bulk_delete(
        &self,
        resource: &Resource,
        ids: &[EntityId],
    ) -> impl Future<Output = Result<()>> + Send;
}
