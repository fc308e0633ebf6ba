//! Filter/Selection Controller: ephemeral view state of one list.

use std::time::Duration;

use crate::config::ViewConfig;
use crate::entity::EntityId;
use crate::remote::ListQuery;

use super::debounce::SearchDebouncer;
use super::filter::{SortKey, ViewFilterState};
use super::selection::SelectionSet;

/// Owns the filter state, the debounced search input and the bulk
/// selection of one list view. Nothing here is persisted.
pub struct FilterController {
    state: ViewFilterState,
    defaults: ViewFilterState,
    search_input: String,
    debouncer: SearchDebouncer<String>,
    selection: SelectionSet,
    persist_selection: bool,
}

impl FilterController {
    /// Must be called from within a tokio runtime (the search debouncer
    /// runs on a background task).
    pub fn new(config: &ViewConfig) -> Self {
        Self::with_defaults(
            ViewFilterState::new(config.page_size),
            Duration::from_millis(config.search_debounce_ms),
            config.persist_selection_across_filter_changes,
        )
    }

    pub fn with_defaults(
        defaults: ViewFilterState,
        search_debounce: Duration,
        persist_selection: bool,
    ) -> Self {
        Self {
            state: defaults.clone(),
            defaults,
            search_input: String::new(),
            debouncer: SearchDebouncer::new(search_debounce),
            selection: SelectionSet::new(),
            persist_selection,
        }
    }

    pub fn state(&self) -> &ViewFilterState {
        &self.state
    }

    pub fn defaults(&self) -> &ViewFilterState {
        &self.defaults
    }

    /// The effective query for the current state
    pub fn query(&self) -> ListQuery {
        self.state.to_query()
    }

    /// Raw text in the search box, ahead of the debounced state
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Record a keystroke; the value reaches the state after the quiet period
    pub fn type_search(&mut self, text: &str) {
        self.search_input = text.to_string();
        self.debouncer.push(text.to_string());
    }

    /// Wait for the search input to settle and apply it.
    /// Returns whether the effective state changed.
    pub async fn settle_search(&mut self) -> bool {
        match self.debouncer.settled().await {
            Some(text) => self.state.set_search(&text),
            None => false,
        }
    }

    /// Apply a settled search value if one is already available
    pub fn poll_search(&mut self) -> bool {
        let mut changed = false;
        while let Some(text) = self.debouncer.try_settled() {
            changed |= self.state.set_search(&text);
        }
        changed
    }

    pub fn set_filter(&mut self, name: &str, value: &str) -> bool {
        self.state.set_filter(name, value)
    }

    pub fn set_status(&mut self, value: &str) -> bool {
        self.state.set_status(value)
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) -> bool {
        self.state.set_sort(sort)
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        self.state.set_page(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.state.next_page()
    }

    pub fn prev_page(&mut self) -> bool {
        self.state.prev_page()
    }

    /// Reset every filter and the search text at once, dropping any search
    /// input still waiting out its quiet period.
    pub fn clear_filters(&mut self) -> bool {
        self.debouncer.cancel();
        self.search_input.clear();
        if self.state == self.defaults {
            return false;
        }
        self.state = self.defaults.clone();
        true
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle_selection(&mut self, id: &EntityId) -> bool {
        self.selection.toggle(id)
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) {
        self.selection.select_all(ids);
    }

    pub fn deselect(&mut self, id: &EntityId) -> bool {
        self.selection.deselect(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn persists_selection(&self) -> bool {
        self.persist_selection
    }

    /// Apply the selection policy to a freshly loaded page.
    /// Returns how many selected ids were dropped.
    pub fn reconcile_selection<'a>(
        &mut self,
        visible: impl IntoIterator<Item = &'a EntityId>,
    ) -> usize {
        if self.persist_selection {
            return 0;
        }
        self.selection.retain(visible)
    }
}
