use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Per-field validation messages returned by the backend, e.g.
/// `{"email": ["must be unique"]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message used when neither the body nor the status line says anything useful.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response, normalised to `{ message, status, errors }`.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        errors: Option<FieldErrors>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request worked but the session token could not be persisted.
    #[error("Failed to store session token: {0}")]
    TokenStorage(String),
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
            None => body.to_string(),
            Some((cut, _)) => format!(
                "{}... (truncated, {} total bytes)",
                &body[..cut],
                body.len()
            ),
        }
    }

    /// Build an error from a non-2xx status and its raw body.
    ///
    /// A JSON body contributes `message` (or `error`) and `errors`; any other
    /// body falls back to the status reason phrase.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let (message, errors) = match serde_json::from_str::<Value>(body) {
            Ok(json) => (message_from_json(&json), errors_from_json(&json)),
            Err(_) => (
                status
                    .canonical_reason()
                    .unwrap_or(DEFAULT_ERROR_MESSAGE)
                    .to_string(),
                None,
            ),
        };

        ApiError::Status {
            status: status.as_u16(),
            message,
            errors,
        }
    }

    /// User-facing message. Never empty.
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            DEFAULT_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Status { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// `message` may be a string or (NestJS validation pipes) a list of strings.
fn message_from_json(json: &Value) -> String {
    let message = match json.get("message") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    };

    message
        .or_else(|| match json.get("error") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

fn errors_from_json(json: &Value) -> Option<FieldErrors> {
    let Value::Object(map) = json.get("errors")? else {
        return None;
    };

    let errors: FieldErrors = map
        .iter()
        .map(|(field, value)| {
            let messages = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect();

    Some(errors)
}
