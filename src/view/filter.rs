//! Client-side list view state and its translation into a list query.

use std::collections::BTreeMap;

use crate::config::MAX_PAGE_SIZE;
use crate::error::CasebookError;
use crate::remote::ListQuery;

/// Filter value meaning "apply no constraint"; never sent to the server
pub const ALL: &str = "all";

/// Whether `value` constrains nothing: blank, or the `all` sentinel in any case
pub fn is_unconstrained(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || unicase::eq(value, ALL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

crate::macros::enum_display_fromstr!(SortOrder, CasebookError::invalid_value, {
    Asc => "asc",
    Desc => "desc",
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// 1-based page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(20)
    }
}

/// Search text, categorical filters, status, page and sort of one list view.
///
/// Values are normalized as they are set: unconstrained categorical values
/// are removed rather than stored, so two states that filter the same way
/// compare equal. Every change that alters the result set moves the cursor
/// back to the first page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewFilterState {
    search: String,
    filters: BTreeMap<String, String>,
    status: Option<String>,
    pagination: Pagination,
    sort: Option<SortKey>,
}

impl ViewFilterState {
    pub fn new(limit: u32) -> Self {
        Self {
            pagination: Pagination::new(limit),
            ..Self::default()
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Current value of a categorical filter, [`ALL`] when unset
    pub fn filter(&self, name: &str) -> &str {
        self.filters.get(name).map(String::as_str).unwrap_or(ALL)
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or(ALL)
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page(&self) -> u32 {
        self.pagination.page
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    /// Apply settled search text. Returns whether the state changed.
    pub fn set_search(&mut self, text: &str) -> bool {
        let text = text.trim();
        if self.search == text {
            return false;
        }
        self.search = text.to_string();
        self.pagination.page = 1;
        true
    }

    pub fn set_filter(&mut self, name: &str, value: &str) -> bool {
        let changed = if is_unconstrained(value) {
            self.filters.remove(name).is_some()
        } else {
            let value = value.trim();
            if self.filters.get(name).map(String::as_str) == Some(value) {
                false
            } else {
                self.filters.insert(name.to_string(), value.to_string());
                true
            }
        };
        if changed {
            self.pagination.page = 1;
        }
        changed
    }

    pub fn set_status(&mut self, value: &str) -> bool {
        let status = (!is_unconstrained(value)).then(|| value.trim().to_string());
        if self.status == status {
            return false;
        }
        self.status = status;
        self.pagination.page = 1;
        true
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) -> bool {
        if self.sort == sort {
            return false;
        }
        self.sort = sort;
        self.pagination.page = 1;
        true
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.pagination.page == page {
            return false;
        }
        self.pagination.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.pagination.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        self.set_page(self.pagination.page.saturating_sub(1))
    }

    pub fn set_limit(&mut self, limit: u32) -> bool {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        if self.pagination.limit == limit {
            return false;
        }
        self.pagination = Pagination::new(limit);
        true
    }

    /// Whether anything narrows the result set
    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || !self.filters.is_empty() || self.status.is_some()
    }

    /// The effective query: `search`, filters by name, `status`, `page`,
    /// `limit`, `sortBy`, `sortOrder`. Unconstrained values are omitted.
    pub fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new();
        if !self.search.is_empty() {
            query.push("search", self.search.as_str());
        }
        for (name, value) in &self.filters {
            query.push(name.as_str(), value.as_str());
        }
        if let Some(status) = &self.status {
            query.push("status", status.as_str());
        }
        query.push("page", self.pagination.page.to_string());
        query.push("limit", self.pagination.limit.to_string());
        if let Some(sort) = &self.sort {
            query.push("sortBy", sort.field.as_str());
            query.push("sortOrder", sort.order.to_string());
        }
        query
    }
}

impl From<&ViewFilterState> for ListQuery {
    fn from(state: &ViewFilterState) -> Self {
        state.to_query()
    }
}
