//! The single controller object behind one entity list view.
//!
//! [`EntityWorkspace`] wires the three layers together: the
//! [`FilterController`] turns user input into a query, the [`RemoteStore`]
//! resolves it, and the [`DialogOrchestrator`] decides which dialog a row
//! action mounts. A view holds the workspace by value and reads
//! [`WorkspaceViewModel`] snapshots from it; there is no ambient state.
//!
//! Every read runs inside the workspace's [`FetchScope`]. Dropping the
//! workspace (or calling [`EntityWorkspace::shutdown`]) cancels whatever is
//! still in flight and its late results are discarded.

pub mod model;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::ViewConfig;
use crate::entity::{EntityId, EntityRecord};
use crate::error::{CasebookError, Result};
use crate::remote::{FetchScope, Page, RemoteStore, ResourceTransport};
use crate::resources::Resource;
use crate::view::{
    DeleteConfirmation, DialogMode, DialogOrchestrator, FilterController, FormState, Notice,
    SortKey,
};

pub use model::{DialogView, ListStatus, RowView, WorkspaceViewModel};

/// Outcome of a successful [`EntityWorkspace::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(EntityRecord),
    Updated(EntityRecord),
    /// The edit form matched the stored record; nothing was sent
    Unchanged,
}

pub struct EntityWorkspace<T> {
    resource: Resource,
    store: RemoteStore<T>,
    scope: FetchScope,
    controller: FilterController,
    dialogs: DialogOrchestrator,
    form: Option<FormState>,
    confirmation: Option<DeleteConfirmation>,
    /// Record loaded for the mounted dialog; kept through the close transition
    target: Option<EntityRecord>,
    bulk_prompt: Option<String>,
    page: Page,
    status: ListStatus,
    notice: Option<Notice>,
}

impl<T: ResourceTransport> EntityWorkspace<T> {
    /// Must be called from within a tokio runtime.
    pub fn new(resource: Resource, store: RemoteStore<T>, config: &ViewConfig) -> Self {
        Self::with_scope(resource, store, config, &FetchScope::new())
    }

    /// A workspace whose fetches are also cancelled with `parent`
    pub fn with_scope(
        resource: Resource,
        store: RemoteStore<T>,
        config: &ViewConfig,
        parent: &FetchScope,
    ) -> Self {
        Self {
            resource,
            store,
            scope: parent.child(),
            controller: FilterController::new(config),
            dialogs: DialogOrchestrator::new(config.animate_dialog_close),
            form: None,
            confirmation: None,
            target: None,
            bulk_prompt: None,
            page: Page::default(),
            status: ListStatus::Idle,
            notice: None,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn store(&self) -> &RemoteStore<T> {
        &self.store
    }

    pub fn controller(&self) -> &FilterController {
        &self.controller
    }

    pub fn dialogs(&self) -> &DialogOrchestrator {
        &self.dialogs
    }

    pub fn form(&self) -> Option<&FormState> {
        self.form.as_ref()
    }

    pub fn confirmation(&self) -> Option<&DeleteConfirmation> {
        self.confirmation.as_ref()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.page.records
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// The record the mounted dialog targets, rehydrated by id
    pub fn current_entity(&self) -> Option<&EntityRecord> {
        let target = self.dialogs.target()?;
        self.target
            .as_ref()
            .filter(|record| record.id() == target)
            .or_else(|| self.dialogs.current_entity(&self.page.records))
    }

    // ── list ────────────────────────────────────────────────────────────

    /// Load the page for the current filter state
    pub async fn refresh(&mut self) -> Result<()> {
        let query = self.controller.query();
        self.status = ListStatus::Loading;

        let result = self
            .scope
            .run(self.store.list(&self.resource, &query))
            .await;
        match result {
            Ok(page) => {
                self.apply_page(page);
                Ok(())
            }
            Err(CasebookError::Cancelled) => {
                debug!(resource = self.resource.name(), "list fetch cancelled");
                self.status = ListStatus::Idle;
                Err(CasebookError::Cancelled)
            }
            Err(e) => {
                let retryable = !matches!(
                    e,
                    CasebookError::Auth(_) | CasebookError::RequestValidation { .. }
                );
                let message = e.to_string();
                self.status = ListStatus::Failed {
                    message: message.clone(),
                    retryable,
                };
                let notice = Notice::error(format!(
                    "Could not load {}: {message}",
                    self.resource.name()
                ));
                self.notice = Some(if retryable { notice.with_retry() } else { notice });
                Err(e)
            }
        }
    }

    /// Manual retry after a failed load
    pub async fn retry(&mut self) -> Result<()> {
        self.refresh().await
    }

    fn apply_page(&mut self, page: Page) {
        let dropped = self.controller.reconcile_selection(&page.ids());
        if dropped > 0 {
            debug!(resource = self.resource.name(), dropped, "selection narrowed to visible rows");
            self.bulk_prompt = None;
        }
        self.page = page;
        self.status = ListStatus::Ready;
        if self.notice.as_ref().is_some_and(|n| n.retryable) {
            self.notice = None;
        }
    }

    async fn refresh_if(&mut self, changed: bool) -> Result<bool> {
        if changed {
            self.refresh().await?;
        }
        Ok(changed)
    }

    pub fn type_search(&mut self, text: &str) {
        self.controller.type_search(text);
    }

    /// Wait out the search quiet period, then refetch if the query changed
    pub async fn settle_search(&mut self) -> Result<bool> {
        let changed = self.controller.settle_search().await;
        self.refresh_if(changed).await
    }

    /// Apply an already settled search value without waiting
    pub async fn poll_search(&mut self) -> Result<bool> {
        let changed = self.controller.poll_search();
        self.refresh_if(changed).await
    }

    pub async fn set_filter(&mut self, name: &str, value: &str) -> Result<bool> {
        let changed = self.controller.set_filter(name, value);
        self.refresh_if(changed).await
    }

    pub async fn set_status(&mut self, value: &str) -> Result<bool> {
        let changed = self.controller.set_status(value);
        self.refresh_if(changed).await
    }

    pub async fn set_sort(&mut self, sort: Option<SortKey>) -> Result<bool> {
        let changed = self.controller.set_sort(sort);
        self.refresh_if(changed).await
    }

    pub async fn set_page(&mut self, page: u32) -> Result<bool> {
        let changed = self.controller.set_page(page);
        self.refresh_if(changed).await
    }

    pub async fn next_page(&mut self) -> Result<bool> {
        let changed = self.controller.next_page();
        self.refresh_if(changed).await
    }

    pub async fn prev_page(&mut self) -> Result<bool> {
        let changed = self.controller.prev_page();
        self.refresh_if(changed).await
    }

    pub async fn clear_filters(&mut self) -> Result<bool> {
        let changed = self.controller.clear_filters();
        self.refresh_if(changed).await
    }

    // ── selection ───────────────────────────────────────────────────────

    /// Changing the selection withdraws a pending bulk delete prompt
    pub fn toggle_selection(&mut self, id: &EntityId) -> bool {
        self.bulk_prompt = None;
        self.controller.toggle_selection(id)
    }

    pub fn select_all_visible(&mut self) {
        self.bulk_prompt = None;
        self.controller.select_all(&self.page.ids());
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
        self.bulk_prompt = None;
    }

    // ── dialogs ─────────────────────────────────────────────────────────

    pub fn open_add(&mut self) -> Result<()> {
        self.dialogs.open_add()?;
        self.form = Some(FormState::from_schema(self.resource.schema()));
        self.confirmation = None;
        self.target = None;
        Ok(())
    }

    pub async fn open_edit(&mut self, id: EntityId) -> Result<()> {
        self.open_with_record(DialogMode::Edit, id).await
    }

    pub async fn open_view(&mut self, id: EntityId) -> Result<()> {
        self.open_with_record(DialogMode::View, id).await
    }

    pub async fn open_delete(&mut self, id: EntityId) -> Result<()> {
        self.open_with_record(DialogMode::Delete, id).await
    }

    /// Load the target first so the dialog never mounts without its record
    async fn open_with_record(&mut self, mode: DialogMode, id: EntityId) -> Result<()> {
        if let Some(active) = self.dialogs.active() {
            return Err(CasebookError::DialogBusy(active.mode()));
        }

        let result = self.scope.run(self.store.get(&self.resource, &id)).await;
        let record = match result {
            Ok(record) => record,
            Err(e @ CasebookError::NotFound(_)) => {
                self.record_vanished(&id).await;
                return Err(e);
            }
            Err(e) => {
                if !matches!(e, CasebookError::Cancelled) {
                    self.notice = Some(Notice::error(e.to_string()));
                }
                return Err(e);
            }
        };

        self.dialogs.open(mode, Some(id))?;
        self.form = match mode {
            DialogMode::Edit => Some(FormState::new(record.attributes().clone())),
            _ => None,
        };
        self.confirmation = match mode {
            DialogMode::Delete => Some(DeleteConfirmation::new(
                self.resource.display_name(&record),
            )),
            _ => None,
        };
        self.target = Some(record);
        Ok(())
    }

    /// Dismiss the open dialog. The target stays readable until the close
    /// transition finishes.
    pub fn close_dialog(&mut self) {
        self.dialogs.close();
        if self.dialogs.is_closed() {
            self.release_dialog();
        }
    }

    /// The close transition finished
    pub fn dialog_close_finished(&mut self) {
        self.dialogs.close_finished();
        if self.dialogs.is_closed() {
            self.release_dialog();
        }
    }

    fn release_dialog(&mut self) {
        self.form = None;
        self.confirmation = None;
        self.target = None;
    }

    /// A record disappeared between render and action
    async fn record_vanished(&mut self, id: &EntityId) {
        self.notice = Some(Notice::warning(format!(
            "{} {id} no longer exists",
            self.resource.name()
        )));
        self.controller.deselect(id);
        // Failures are already reported through the list status
        let _ = self.refresh().await;
    }

    // ── forms ───────────────────────────────────────────────────────────

    fn active_form(&mut self) -> Result<&mut FormState> {
        match self.dialogs.mode() {
            Some(mode) if mode.has_form() => self.form.as_mut().ok_or(CasebookError::NoActiveForm),
            _ => Err(CasebookError::NoActiveForm),
        }
    }

    pub fn set_form_field(&mut self, field: &str, value: Value) -> Result<()> {
        self.active_form()?.set_field(field, value);
        Ok(())
    }

    /// Validate and send the open add/edit form.
    ///
    /// Client-side validation failures return [`CasebookError::Validation`]
    /// without touching the network. Server failures are recorded on the form,
    /// which stays open with the typed values.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let mode = match self.dialogs.mode() {
            Some(mode) if mode.has_form() => mode,
            _ => return Err(CasebookError::NoActiveForm),
        };
        let form = self.form.as_mut().ok_or(CasebookError::NoActiveForm)?;
        if form.is_pending() {
            return Err(CasebookError::SubmitPending);
        }
        if !form.validate(self.resource.schema()) {
            return Err(CasebookError::Validation(form.errors().clone()));
        }
        let values = form.values().clone();

        let payload = match mode {
            DialogMode::Edit => {
                let target = self.target.as_ref().ok_or(CasebookError::NoActiveForm)?;
                let changed = target.changed_fields(&values);
                if changed.is_empty() {
                    debug!(resource = self.resource.name(), id = %target.id(), "edit unchanged");
                    self.close_dialog();
                    return Ok(SubmitOutcome::Unchanged);
                }
                changed
            }
            _ => creation_payload(values),
        };

        self.active_form()?.begin_submit();
        let result = match (mode, self.target.as_ref()) {
            (DialogMode::Edit, Some(target)) => {
                let id = target.id().clone();
                self.store
                    .update(&self.resource, &id, &payload)
                    .await
                    .map(SubmitOutcome::Updated)
            }
            _ => self
                .store
                .create(&self.resource, &payload)
                .await
                .map(SubmitOutcome::Created),
        };

        match result {
            Ok(outcome) => {
                if let Some(form) = self.form.as_mut() {
                    form.finish_submit();
                }
                let (verb, record) = match &outcome {
                    SubmitOutcome::Created(record) => ("Created", Some(record)),
                    SubmitOutcome::Updated(record) => ("Updated", Some(record)),
                    SubmitOutcome::Unchanged => ("Saved", None),
                };
                let name = record.map(|r| self.resource.display_name(r)).unwrap_or_default();
                info!(resource = self.resource.name(), %mode, "form submitted");
                let message = format!("{verb} {name}").trim_end().to_string();
                self.notice = Some(Notice::success(message));
                self.close_dialog();
                let _ = self.refresh().await;
                Ok(outcome)
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.fail_submit(&e);
                }
                let vanished = match &e {
                    CasebookError::NotFound(_) => self.target.as_ref().map(|t| t.id().clone()),
                    _ => None,
                };
                if let Some(id) = vanished {
                    self.close_dialog();
                    self.record_vanished(&id).await;
                }
                Err(e)
            }
        }
    }

    // ── deletes ─────────────────────────────────────────────────────────

    /// Update the typed confirmation; returns whether delete is now enabled
    pub fn type_delete_confirmation(&mut self, text: &str) -> Result<bool> {
        if self.dialogs.mode() != Some(DialogMode::Delete) {
            return Err(CasebookError::InvalidDialog(
                "no delete dialog is open".to_string(),
            ));
        }
        let confirmation = self
            .confirmation
            .as_mut()
            .ok_or_else(|| CasebookError::InvalidDialog("no delete dialog is open".to_string()))?;
        confirmation.set_typed(text);
        Ok(confirmation.is_confirmed())
    }

    /// Delete the target of the open delete dialog
    pub async fn confirm_delete(&mut self) -> Result<()> {
        let id = match self.dialogs.active() {
            Some(active) if active.mode() == DialogMode::Delete => active
                .target()
                .cloned()
                .ok_or_else(|| CasebookError::InvalidDialog("delete without target".to_string()))?,
            _ => {
                return Err(CasebookError::InvalidDialog(
                    "no delete dialog is open".to_string(),
                ));
            }
        };
        let confirmation = self
            .confirmation
            .as_ref()
            .ok_or(CasebookError::ConfirmationMismatch)?;
        if !confirmation.is_confirmed() {
            return Err(CasebookError::ConfirmationMismatch);
        }
        let name = confirmation.expected().to_string();

        match self.store.delete(&self.resource, &id).await {
            Ok(()) => {
                self.controller.deselect(&id);
                self.notice = Some(Notice::success(format!("Deleted {name}")));
                self.close_dialog();
                let _ = self.refresh().await;
                Ok(())
            }
            Err(e @ CasebookError::NotFound(_)) => {
                self.close_dialog();
                self.record_vanished(&id).await;
                Err(e)
            }
            Err(e) => {
                self.notice = Some(Notice::error(format!("Could not delete {name}: {e}")));
                Err(e)
            }
        }
    }

    /// Ask for confirmation before deleting the selection.
    /// Returns the prompt to show.
    pub fn request_bulk_delete(&mut self) -> Result<String> {
        let count = self.controller.selection().len();
        if count == 0 {
            return Err(CasebookError::EmptySelection);
        }
        let prompt = format!("Delete {count} {}?", self.resource.name());
        self.bulk_prompt = Some(prompt.clone());
        Ok(prompt)
    }

    pub fn cancel_bulk_delete(&mut self) {
        self.bulk_prompt = None;
    }

    /// Delete every selected record once [`Self::request_bulk_delete`] has
    /// been accepted. Returns how many were deleted.
    pub async fn bulk_delete(&mut self) -> Result<usize> {
        let ids = self.controller.selection().to_vec();
        if ids.is_empty() {
            return Err(CasebookError::EmptySelection);
        }
        if self.bulk_prompt.is_none() {
            return Err(CasebookError::BulkDeleteUnconfirmed);
        }

        match self.store.bulk_delete(&self.resource, &ids).await {
            Ok(()) => {
                self.bulk_prompt = None;
                self.controller.clear_selection();
                if !self.dialogs.is_closed() {
                    self.dialogs.reset();
                    self.release_dialog();
                }
                self.notice = Some(Notice::success(format!(
                    "Deleted {} {}",
                    ids.len(),
                    self.resource.name()
                )));
                let _ = self.refresh().await;
                Ok(ids.len())
            }
            Err(e) => {
                self.bulk_prompt = None;
                self.notice = Some(Notice::error(format!("Bulk delete failed: {e}")));
                if matches!(e, CasebookError::NotFound(_)) {
                    let _ = self.refresh().await;
                }
                Err(e)
            }
        }
    }

    /// Cancel outstanding fetches; their results are discarded
    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}

impl<T> Drop for EntityWorkspace<T> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

/// Blank optional fields are left out of a create request
fn creation_payload(values: Map<String, Value>) -> Map<String, Value> {
    values
        .into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
        .collect()
}
