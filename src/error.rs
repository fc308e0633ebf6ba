use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::view::dialog::DialogMode;

/// Field-scoped validation messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. Duplicate messages are ignored.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        let messages = self.fields.entry(field.into()).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    /// Merge another set of errors into this one.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.fields {
            for message in messages {
                self.add(field.clone(), message);
            }
        }
    }

    pub fn for_field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) {
        self.fields.remove(field);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CasebookError {
    // Validation errors
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("request rejected ({status}): {message}")]
    RequestValidation {
        status: u16,
        message: String,
        errors: FieldErrors,
    },

    // Remote errors
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("request cancelled")]
    Cancelled,

    // Orchestration errors
    #[error("a {0} dialog is already open")]
    DialogBusy(DialogMode),

    #[error("invalid dialog transition: {0}")]
    InvalidDialog(String),

    #[error("typed confirmation does not match the record name")]
    ConfirmationMismatch,

    #[error("no records selected")]
    EmptySelection,

    #[error("bulk delete was not confirmed")]
    BulkDeleteUnconfirmed,

    #[error("a submission is already in progress")]
    SubmitPending,

    #[error("no form is open")]
    NoActiveForm,

    // Plumbing
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value '{0}'")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CasebookError {
    /// Whether a read that failed with this error may be retried.
    ///
    /// Only transport failures and 5xx responses qualify. Rate limiting is
    /// surfaced to the caller instead of being retried here.
    pub fn is_transient(&self) -> bool {
        match self {
            CasebookError::Network(_) => true,
            CasebookError::Api { status, .. } => *status >= 500,
            CasebookError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Field errors carried by this error, if it is field-scoped.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CasebookError::Validation(errors) => Some(errors),
            CasebookError::RequestValidation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn invalid_value(s: String) -> Self {
        CasebookError::InvalidValue(s)
    }
}

pub type Result<T> = std::result::Result<T, CasebookError>;
