use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Structured error payload returned by the backend on failure.
///
/// Most endpoints answer `{"error": "..."}`. The file listing endpoint
/// additionally sets `"locked": true` when a folder needs a password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

/// Top-level error type for the `vandash-api` crate.
///
/// `vandash-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server ──────────────────────────────────────────────────────
    /// Non-2xx response (or an error envelope) from the backend.
    ///
    /// `message` is only set when the body carried an `error` field.
    #[error("Server error (HTTP {status}){}", detail(.message.as_deref()))]
    Server {
        status: u16,
        message: Option<String>,
        locked: bool,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Build a server error from a status code and the raw response body.
    ///
    /// A body that isn't the structured `{error, locked}` payload carries no
    /// message; it is only logged.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ServerErrorBody>(body) {
            Ok(payload) => Self::from_payload(status, payload),
            Err(_) => {
                debug!(status, body = %preview(body), "unstructured error body");
                Self::Server {
                    status,
                    message: None,
                    locked: false,
                }
            }
        }
    }

    pub(crate) fn from_payload(status: u16, payload: ServerErrorBody) -> Self {
        Self::Server {
            status,
            message: payload.error.filter(|m| !m.trim().is_empty()),
            locked: payload.locked,
        }
    }

    /// Returns `true` if the backend refused a listing because the folder is locked.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Server { locked: true, .. })
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Server { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The message the backend attached to its error payload, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

fn detail(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_payload_keeps_message_and_lock_flag() {
        let err = Error::from_response(403, r#"{"error":"Folder is locked","locked":true}"#);
        assert!(err.is_locked());
        assert_eq!(err.server_message(), Some("Folder is locked"));
    }

    #[test]
    fn html_body_carries_no_server_message() {
        let err = Error::from_response(500, "<html><body>Internal Server Error</body></html>");
        assert!(!err.is_locked());
        assert!(err.is_transient());
        assert_eq!(err.server_message(), None);
        assert_eq!(err.to_string(), "Server error (HTTP 500)");
    }

    #[test]
    fn empty_body_keeps_status_only() {
        let err = Error::from_response(404, "");
        assert!(err.is_not_found());
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn locked_payload_without_text_has_no_message() {
        let err = Error::from_response(403, r#"{"locked":true}"#);
        assert!(err.is_locked());
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), 200);
    }
}
