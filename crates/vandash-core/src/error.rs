// ── Core error types ──
//
// User-facing errors from vandash-core. Consumers never see reqwest or
// serde errors directly; the `From<vandash_api::Error>` impl translates
// transport-layer failures into domain variants. `CoreError` is `Clone`
// so query state can hand the same error to every subscriber.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot reach dashboard backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    // ── Server ───────────────────────────────────────────────────────
    /// Non-2xx response. `message` is the `error` field of the backend's
    /// `{error, locked}` payload, when it sent one.
    #[error("Server error (HTTP {status}){}", detail(.message.as_deref()))]
    Server {
        status: u16,
        message: Option<String>,
        locked: bool,
    },

    #[error("Unexpected response from backend: {message}")]
    InvalidResponse { message: String },

    #[error("Operation rejected by backend: {message}")]
    Rejected { message: String },

    // ── Client-side ──────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for the `{locked: true}` shape a protected folder answers with.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Server { locked: true, .. })
    }

    /// `true` when the backend could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Transport { .. }
        )
    }

    /// Short text suitable for a toast: the server's own message when there
    /// is one, the full error description otherwise.
    pub fn user_message(&self) -> String {
        self.server_text().unwrap_or_else(|| self.to_string())
    }

    /// The server's message if it sent one, else `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_text().unwrap_or_else(|| fallback.to_owned())
    }

    fn server_text(&self) -> Option<String> {
        match self {
            Self::Server {
                message: Some(message),
                ..
            }
            | Self::Rejected { message }
            | Self::ValidationFailed { message } => Some(message.clone()),
            _ => None,
        }
    }
}

fn detail(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vandash_api::Error> for CoreError {
    fn from(err: vandash_api::Error) -> Self {
        match err {
            vandash_api::Error::Transport(ref e) => {
                let url = e.url().map(ToString::to_string).unwrap_or_default();
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        message: e.to_string(),
                    }
                }
            }
            vandash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vandash_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vandash_api::Error::Server {
                status,
                message,
                locked,
            } => CoreError::Server {
                status,
                message,
                locked,
            },
            vandash_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}
