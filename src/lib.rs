pub mod config;
pub mod entity;
pub mod error;
mod macros;
pub mod remote;
pub mod resources;
pub mod schema;
pub mod view;
pub mod workspace;

#[cfg(test)]
mod test_guards;

pub use config::{ApiConfig, CacheConfig, Config, RetryConfig, ViewConfig};
pub use entity::{EntityId, EntityRecord};
pub use error::{CasebookError, FieldErrors, Result};
pub use remote::{
    FetchScope, HttpTransport, ListQuery, Page, QueryCache, RemoteStore, ResourceTransport,
    RetryPolicy,
};
pub use resources::Resource;
pub use schema::{FieldSpec, Schema};
pub use view::{
    DeleteConfirmation, DialogMode, DialogOrchestrator, DialogState, FilterController, FormState,
    Notice, NoticeLevel, SelectionSet, SortKey, SortOrder, ViewFilterState,
};
pub use workspace::{EntityWorkspace, ListStatus, SubmitOutcome, WorkspaceViewModel};
