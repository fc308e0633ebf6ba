//! Form state bound to an add or edit dialog.

use serde_json::{Map, Value};

use crate::error::{CasebookError, FieldErrors};
use crate::schema::Schema;

/// Values typed into a form plus the outcome of the last submission.
///
/// Values are never cleared by a failed submission, so the user can correct
/// and resubmit without retyping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Map<String, Value>,
    errors: FieldErrors,
    submit_error: Option<String>,
    pending: bool,
}

impl FormState {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Empty form seeded with the schema's defaults
    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(schema.default_values())
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a field and drop its now outdated error
    pub fn set_field(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
        self.errors.remove(field);
    }

    pub fn clear_field_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.for_field(field)
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Submit controls are disabled while a submission is in flight
    pub fn can_submit(&self) -> bool {
        !self.pending
    }

    /// Validate against `schema`, recording field errors on failure
    pub fn validate(&mut self, schema: &Schema) -> bool {
        match schema.validate(&self.values) {
            Ok(()) => {
                self.errors = FieldErrors::new();
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }

    /// Mark a submission as started, clearing the previous outcome
    pub fn begin_submit(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        self.submit_error = None;
        true
    }

    /// Record a failed submission. Field-scoped errors go next to their
    /// fields; anything else becomes the form-level submit error.
    pub fn fail_submit(&mut self, error: &CasebookError) {
        self.pending = false;
        match error.field_errors() {
            Some(errors) if !errors.is_empty() => {
                self.errors.merge(errors.clone());
                if let CasebookError::RequestValidation { message, .. } = error {
                    self.submit_error = Some(message.clone());
                }
            }
            _ => self.submit_error = Some(error.to_string()),
        }
    }

    pub fn finish_submit(&mut self) {
        self.pending = false;
    }
}
