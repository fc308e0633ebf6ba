//! Client-side state of a list view.
//!
//! - Filter/Selection Controller: [`ViewFilterState`], [`SearchDebouncer`],
//!   [`SelectionSet`], combined in [`FilterController`]
//! - Dialog/Form Orchestrator: [`DialogOrchestrator`], [`FormState`],
//!   [`DeleteConfirmation`]
//! - [`Notice`] banners for list-level outcomes

pub mod confirm;
pub mod controller;
pub mod debounce;
pub mod dialog;
pub mod filter;
pub mod form;
pub mod notice;
pub mod selection;

pub use confirm::DeleteConfirmation;
pub use controller::FilterController;
pub use debounce::SearchDebouncer;
pub use dialog::{ActiveDialog, DialogMode, DialogOrchestrator, DialogState};
pub use filter::{ALL, Pagination, SortKey, SortOrder, ViewFilterState, is_unconstrained};
pub use form::FormState;
pub use notice::{Notice, NoticeLevel};
pub use selection::SelectionSet;
