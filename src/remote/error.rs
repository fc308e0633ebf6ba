//! Mapping of REST failures onto [`CasebookError`].
//!
//! The backend reports failures as a status code plus an optional JSON body.
//! [`ApiError`] captures both so the HTTP transport can classify them in one
//! place: which failures are field-scoped, which are transient, and which
//! should be surfaced as-is.

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{CasebookError, FieldErrors};

/// Retry-After fallback when a 429 carries no usable header
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// A non-success response from the backend.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    pub message: String,
    pub errors: FieldErrors,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        self.retry_after = seconds;
        self
    }

    /// Build from a raw response body. Bodies that are not JSON keep the
    /// status reason as the message.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();

        let Ok(json) = serde_json::from_str::<Value>(body) else {
            let trimmed = body.trim();
            let message = if trimmed.is_empty() || trimmed.len() > 200 {
                fallback
            } else {
                trimmed.to_string()
            };
            return Self::new(status, message);
        };

        let message = ["message", "error"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or(fallback);

        let mut error = Self::new(status, message);
        if let Some(errors) = json.get("errors") {
            error.errors = parse_field_errors(errors);
        }
        error
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    pub fn is_transient(&self) -> bool {
        self.status.is_server_error()
    }

    /// Classify this failure. `target` names what was requested, used for
    /// not-found messages.
    pub fn into_error(self, target: &str) -> CasebookError {
        let status = self.status.as_u16();
        match self.status {
            StatusCode::NOT_FOUND => CasebookError::NotFound(target.to_string()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                CasebookError::RequestValidation {
                    status,
                    message: self.message,
                    errors: self.errors,
                }
            }
            StatusCode::CONFLICT => CasebookError::Conflict(self.message),
            StatusCode::TOO_MANY_REQUESTS => {
                CasebookError::RateLimited(self.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CasebookError::Auth(self.message),
            _ => CasebookError::Api {
                status,
                message: self.message,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status.as_u16(), self.message)
    }
}

/// Accepts `{"field": "msg" | ["msg", ...]}` and
/// `[{"field": "...", "message": "..."}]`.
fn parse_field_errors(value: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match value {
        Value::Object(map) => {
            for (field, messages) in map {
                match messages {
                    Value::String(message) => errors.add(field, message.as_str()),
                    Value::Array(items) => {
                        for message in items.iter().filter_map(Value::as_str) {
                            errors.add(field, message);
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                let field = item
                    .get("field")
                    .or_else(|| item.get("path"))
                    .and_then(Value::as_str);
                let message = item
                    .get("message")
                    .or_else(|| item.get("msg"))
                    .and_then(Value::as_str);
                if let (Some(field), Some(message)) = (field, message) {
                    errors.add(field, message);
                }
            }
        }
        _ => {}
    }
    errors
}

/// Classify a transport-level reqwest failure
pub fn from_transport(error: reqwest::Error) -> CasebookError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        CasebookError::Network(error.to_string())
    } else if error.is_decode() {
        CasebookError::Api {
            status: error.status().map(|s| s.as_u16()).unwrap_or(200),
            message: format!("malformed response: {error}"),
        }
    } else {
        CasebookError::Http(error)
    }
}
