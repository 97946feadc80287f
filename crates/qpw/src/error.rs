//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use qpw_config::ConfigError;
use qpw_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {url}")]
    #[diagnostic(
        code(qpw::connection_failed),
        help(
            "Check the region and your network connection.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(qpw::timeout),
        help("Increase the timeout with --timeout or in your profile.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in: {reason}")]
    #[diagnostic(code(qpw::not_logged_in), help("Run: qpw login"))]
    NotLoggedIn { reason: String },

    #[error("Session rejected by the platform (HTTP {status}): {message}")]
    #[diagnostic(
        code(qpw::session_expired),
        help("The token expired or was revoked; the session has been cleared.\nRun: qpw login")
    )]
    SessionExpired { status: u16, message: String },

    #[error("The pasted URL does not contain a login response")]
    #[diagnostic(
        code(qpw::login_incomplete),
        help(
            "Paste the full address the browser landed on after signing in.\n\
             It should contain '#access_token=...'."
        )
    )]
    LoginIncomplete,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error on {path} (HTTP {status}): {message}")]
    #[diagnostic(code(qpw::api_error))]
    Api {
        path: String,
        status: u16,
        message: String,
    },

    #[error("{failed} of 8 lookups failed; no lookups were loaded")]
    #[diagnostic(code(qpw::lookups_incomplete), help("{details}"))]
    LookupsIncomplete { failed: usize, details: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(qpw::decode))]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(qpw::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(qpw::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: qpw config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No profile configured")]
    #[diagnostic(
        code(qpw::no_config),
        help(
            "Create one with: qpw config init\n\
             Or pass --client-id and --region.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{message}")]
    #[diagnostic(code(qpw::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(qpw::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn { .. } | Self::SessionExpired { .. } | Self::LoginIncomplete => {
                exit_code::AUTH
            }
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated { reason } => CliError::NotLoggedIn { reason },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Api {
                status: status @ (401 | 403),
                message,
                ..
            } => CliError::SessionExpired { status, message },

            CoreError::Api {
                path,
                status,
                message,
            } => CliError::Api {
                path,
                status,
                message,
            },

            CoreError::Decode { message } => CliError::Decode { message },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
