use reqwest::StatusCode;
use rmcp::ErrorData as McpError;
use serde_json::{Value, json};
use thiserror::Error;

pub type Result<T, E = GitLabError> = std::result::Result<T, E>;

/// Longest raw response body kept as error detail.
const MAX_DETAIL_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum GitLabError {
    /// A required argument is missing or out of range. Raised before any request is sent.
    #[error("{0}")]
    Validation(String),

    #[error("GitLab API error: {status}{}", detail_suffix(.detail))]
    Api {
        status: StatusCode,
        detail: Option<String>,
    },

    /// The response did not match the expected shape.
    #[error("Failed to parse GitLab response from {endpoint}: {source}")]
    Parse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode content of {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Failed to serialize request: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl GitLabError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Builds an API error from a non-success status and the raw response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        Self::Api {
            status,
            detail: detail_from_body(body),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// GitLab reports failures as `{"message": ...}` (a string or a map of field
/// errors) or as `{"error": ..., "error_description": ...}`.
fn detail_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Some(truncate(body));
    };

    match (value.get("message"), value.get("error")) {
        (Some(Value::String(message)), _) => Some(message.clone()),
        (Some(Value::Object(fields)), _) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(field, errors)| match errors {
                    Value::Array(items) => {
                        let items: Vec<String> = items.iter().map(value_text).collect();
                        format!("{field} {}", items.join(", "))
                    }
                    other => format!("{field} {}", value_text(other)),
                })
                .collect();
            Some(parts.join("; "))
        }
        (Some(other), _) => Some(value_text(other)),
        (None, Some(error)) => match value.get("error_description") {
            Some(description) => Some(format!(
                "{}: {}",
                value_text(error),
                value_text(description)
            )),
            None => Some(value_text(error)),
        },
        (None, None) => Some(truncate(body)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

impl From<GitLabError> for McpError {
    fn from(error: GitLabError) -> Self {
        match error {
            GitLabError::Validation(message) => McpError::invalid_params(message, None),
            GitLabError::Api { status, ref detail } => {
                let data = json!({ "status": status.as_u16(), "detail": detail });
                McpError::internal_error(error.to_string(), Some(data))
            }
            other => McpError::internal_error(other.to_string(), None),
        }
    }
}
