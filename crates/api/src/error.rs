//! Error type for orchestrator API calls.
//!
//! Non-success responses are turned into [`ApiError::Status`] carrying the
//! backend's own error message when the body provides one, so callers can
//! surface it directly to the user.

use orca_util::redact_sensitive;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

const BODY_PREVIEW_LIMIT: usize = 200;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, or timeout failure before a response arrived.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The body could not be decoded into the expected shape.
    #[error("failed to parse JSON response (status {status}): {source}. body preview: {body_preview}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
        body_preview: String,
    },
}

impl ApiError {
    /// Build a status error from a response status and its raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = extract_error_message(body).unwrap_or_else(|| truncate_response_preview(body, BODY_PREVIEW_LIMIT));
        let message = match status_hint(status.as_u16()) {
            Some(hint) => format!("{hint}: {detail}"),
            None => format!("HTTP {}: {detail}", status.as_u16()),
        };
        Self::Status {
            status: status.as_u16(),
            message,
        }
    }

    pub(crate) fn decode(status: StatusCode, source: serde_json::Error, body: &str) -> Self {
        Self::Decode {
            status: status.as_u16(),
            source,
            body_preview: truncate_response_preview(body, BODY_PREVIEW_LIMIT),
        }
    }

    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
        }
    }
}

fn status_hint(status_code: u16) -> Option<&'static str> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: set ORCA_API_TOKEN=..."),
        403 => Some("Forbidden (403)"),
        404 => Some("Not found (404)"),
        _ => None,
    }
}

/// Reads `error.message` or a top-level `message` from a JSON error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in redact_sensitive(text).chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}
