//! Render-ready snapshot of a workspace.
//!
//! This module separates state (`EntityWorkspace`) from what a view draws
//! (`WorkspaceViewModel`), so rendering decisions can be tested without any
//! UI framework.

use crate::entity::EntityId;
use crate::error::FieldErrors;
use crate::remote::ResourceTransport;
use crate::view::{DialogMode, DialogState, Notice};

use super::EntityWorkspace;

/// Load state of the visible list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed { message: String, retryable: bool },
}

impl ListStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListStatus::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ListStatus::Failed { .. })
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, ListStatus::Failed { retryable: true, .. })
    }
}

/// One list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: EntityId,
    pub title: String,
    pub selected: bool,
}

/// The single mounted dialog
#[derive(Debug, Clone, PartialEq)]
pub struct DialogView {
    pub mode: DialogMode,
    /// Mounted only for its exit transition
    pub closing: bool,
    /// Display name of the target record, when it is known
    pub title: Option<String>,
    pub can_submit: bool,
    pub delete_enabled: bool,
    pub field_errors: FieldErrors,
    pub submit_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkspaceViewModel {
    pub rows: Vec<RowView>,
    pub total: Option<u64>,
    pub page: u32,
    pub limit: u32,
    pub status: ListStatus,
    /// Loading placeholder instead of rows
    pub show_skeleton: bool,
    pub search_input: String,
    pub has_active_filters: bool,
    pub selected_count: usize,
    pub bulk_delete_prompt: Option<String>,
    pub dialog: Option<DialogView>,
    pub notice: Option<Notice>,
}

impl<T: ResourceTransport> EntityWorkspace<T> {
    pub fn view_model(&self) -> WorkspaceViewModel {
        let selection = self.controller.selection();
        let rows = self
            .page
            .records
            .iter()
            .map(|record| RowView {
                id: record.id().clone(),
                title: self.resource.display_name(record),
                selected: selection.contains(record.id()),
            })
            .collect();

        let dialog = self.dialogs.mounted().map(|active| {
            let closing = matches!(self.dialogs.state(), DialogState::Closing(_));
            let form = self.form.as_ref();
            DialogView {
                mode: active.mode(),
                closing,
                title: self
                    .current_entity()
                    .map(|record| self.resource.display_name(record)),
                can_submit: !closing
                    && active.mode().has_form()
                    && form.is_some_and(|f| f.can_submit()),
                delete_enabled: !closing
                    && active.mode() == DialogMode::Delete
                    && self
                        .confirmation
                        .as_ref()
                        .is_some_and(|c| c.is_confirmed()),
                field_errors: form.map(|f| f.errors().clone()).unwrap_or_default(),
                submit_error: form.and_then(|f| f.submit_error().map(str::to_string)),
            }
        });

        let state = self.controller.state();
        WorkspaceViewModel {
            rows,
            total: self.page.total,
            page: state.page(),
            limit: state.pagination().limit,
            show_skeleton: self.status.is_loading() && self.page.is_empty(),
            status: self.status.clone(),
            search_input: self.controller.search_input().to_string(),
            has_active_filters: state.has_active_filters(),
            selected_count: selection.len(),
            bulk_delete_prompt: self.bulk_prompt.clone(),
            dialog,
            notice: self.notice.clone(),
        }
    }
}
