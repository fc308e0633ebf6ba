//! Ids marked for bulk operations.

use std::collections::BTreeSet;

use crate::entity::EntityId;

/// Ordered set of selected record ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<EntityId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &EntityId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn select(&mut self, id: &EntityId) {
        self.ids.insert(id.clone());
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) {
        self.ids.extend(ids.into_iter().cloned());
    }

    pub fn deselect(&mut self, id: &EntityId) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Keep only ids that are also in `visible`. Returns how many were dropped.
    pub fn retain<'a>(&mut self, visible: impl IntoIterator<Item = &'a EntityId>) -> usize {
        let visible: BTreeSet<&EntityId> = visible.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| visible.contains(id));
        before - self.ids.len()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.ids.iter()
    }

    pub fn to_vec(&self) -> Vec<EntityId> {
        self.ids.iter().cloned().collect()
    }
}
