//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vandash_config::ConfigError;
use vandash_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const LOCKED: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the dashboard backend at {url}")]
    #[diagnostic(
        code(vandash::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Try: vandash status --url http://van.local:5000"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(vandash::timeout),
        help("Increase the timeout with --timeout or check the backend's responsiveness.")
    )]
    Timeout { url: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Folder '{path}' is locked")]
    #[diagnostic(
        code(vandash::folder_locked),
        help("Unlock it first: vandash files auth {path}")
    )]
    Locked { path: String },

    #[error("{message}")]
    #[diagnostic(code(vandash::not_found))]
    NotFound { message: String },

    #[error("Backend error (HTTP {status}): {message}")]
    #[diagnostic(code(vandash::server_error))]
    Server { status: u16, message: String },

    #[error("Backend rejected the request: {message}")]
    #[diagnostic(code(vandash::rejected))]
    Rejected { message: String },

    #[error("Unexpected response from backend: {message}")]
    #[diagnostic(
        code(vandash::invalid_response),
        help("The backend may be a different version than this CLI expects.")
    )]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vandash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vandash::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vandash config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(vandash::no_config),
        help(
            "Create a profile with: vandash config init\n\
             Or pass --url / set VANDASH_URL.\n\
             Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(vandash::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(vandash::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Other ────────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(vandash::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Locked { .. } => exit_code::LOCKED,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the folder path to a locked-folder error.
    pub fn for_path(err: CoreError, path: &str) -> Self {
        if err.is_locked() {
            Self::Locked { path: path.into() }
        } else {
            err.into()
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { url } => Self::Timeout { url },
            CoreError::Transport { message } => Self::ConnectionFailed {
                url: "(unknown)".into(),
                reason: message,
            },
            CoreError::Server {
                status: 404,
                message,
                ..
            } => Self::NotFound {
                message: message.unwrap_or_else(|| "Not found".into()),
            },
            CoreError::Server {
                status, message, ..
            } => Self::Server {
                status,
                message: message.unwrap_or_else(|| "no details".into()),
            },
            CoreError::InvalidResponse { message } => Self::InvalidResponse { message },
            CoreError::Rejected { message } => Self::Rejected { message },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
