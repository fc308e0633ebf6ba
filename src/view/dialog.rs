//! Which single dialog is mounted, and which record it targets.
//!
//! ```text
//!            open_*()                close()
//! Closed ───────────────▶ Open ───────────────▶ Closing
//!   ▲                                              │
//!   └──────────────── close_finished() ◀───────────┘
//! ```
//!
//! A dismissed dialog stays mounted in `Closing` so its exit transition can
//! still render the target record; the target is released only when the
//! transition reports completion through [`DialogOrchestrator::close_finished`].
//! With close animation disabled, `close()` goes straight to `Closed`.

use crate::entity::{EntityId, EntityRecord};
use crate::error::{CasebookError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Add,
    Edit,
    View,
    Delete,
}

crate::macros::enum_display!(DialogMode, {
    Add => "add",
    Edit => "edit",
    View => "view",
    Delete => "delete",
});

impl DialogMode {
    /// Whether the mode operates on an existing record
    pub fn requires_target(self) -> bool {
        !matches!(self, DialogMode::Add)
    }

    /// Whether the mode shows an editable form
    pub fn has_form(self) -> bool {
        matches!(self, DialogMode::Add | DialogMode::Edit)
    }
}

/// The mounted dialog: its mode and, except for `Add`, its target record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDialog {
    mode: DialogMode,
    target: Option<EntityId>,
}

impl ActiveDialog {
    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn target(&self) -> Option<&EntityId> {
        self.target.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    Open(ActiveDialog),
    Closing(ActiveDialog),
}

/// State machine for the dialogs of one list view
#[derive(Debug, Clone)]
pub struct DialogOrchestrator {
    state: DialogState,
    animate_close: bool,
}

impl Default for DialogOrchestrator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DialogOrchestrator {
    pub fn new(animate_close: bool) -> Self {
        Self {
            state: DialogState::Closed,
            animate_close,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn open_add(&mut self) -> Result<()> {
        self.open(DialogMode::Add, None)
    }

    pub fn open_edit(&mut self, id: EntityId) -> Result<()> {
        self.open(DialogMode::Edit, Some(id))
    }

    pub fn open_view(&mut self, id: EntityId) -> Result<()> {
        self.open(DialogMode::View, Some(id))
    }

    pub fn open_delete(&mut self, id: EntityId) -> Result<()> {
        self.open(DialogMode::Delete, Some(id))
    }

    /// Mount a dialog. Allowed from `Closed`, and from `Closing`, where the
    /// pending close completes first.
    pub fn open(&mut self, mode: DialogMode, target: Option<EntityId>) -> Result<()> {
        if let DialogState::Open(active) = &self.state {
            return Err(CasebookError::DialogBusy(active.mode));
        }
        if mode.requires_target() != target.is_some() {
            return Err(CasebookError::InvalidDialog(if target.is_some() {
                format!("{mode} dialog takes no target record")
            } else {
                format!("{mode} dialog requires a target record")
            }));
        }
        self.state = DialogState::Open(ActiveDialog { mode, target });
        Ok(())
    }

    /// Dismiss the open dialog. A no-op unless a dialog is open.
    pub fn close(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            DialogState::Open(active) if self.animate_close => DialogState::Closing(active),
            DialogState::Open(_) => DialogState::Closed,
            other => other,
        };
    }

    /// The close transition finished; unmount and release the target
    pub fn close_finished(&mut self) {
        if matches!(self.state, DialogState::Closing(_)) {
            self.state = DialogState::Closed;
        }
    }

    /// Force `Closed` regardless of state
    pub fn reset(&mut self) {
        self.state = DialogState::Closed;
    }

    /// The dialog currently mounted (open or closing), if any
    pub fn mounted(&self) -> Option<&ActiveDialog> {
        match &self.state {
            DialogState::Closed => None,
            DialogState::Open(active) | DialogState::Closing(active) => Some(active),
        }
    }

    /// The dialog accepting input, if any
    pub fn active(&self) -> Option<&ActiveDialog> {
        match &self.state {
            DialogState::Open(active) => Some(active),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, DialogState::Closed)
    }

    pub fn mode(&self) -> Option<DialogMode> {
        self.active().map(ActiveDialog::mode)
    }

    pub fn target(&self) -> Option<&EntityId> {
        self.mounted().and_then(ActiveDialog::target)
    }

    /// Rehydrate the target record by id from `records`
    pub fn current_entity<'a>(&self, records: &'a [EntityRecord]) -> Option<&'a EntityRecord> {
        let target = self.target()?;
        records.iter().find(|r| r.id() == target)
    }
}
