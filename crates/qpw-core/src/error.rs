// ── Core error types ──
//
// User-facing errors from qpw-core. Consumers see the operation and
// resource that failed, not raw transport types. The
// `From<qpw_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Not logged in: {reason}")]
    NotAuthenticated { reason: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error on {path} (HTTP {status}): {message}")]
    Api {
        path: String,
        status: u16,
        message: String,
    },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Unexpected response: {message}")]
    Decode { message: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The session should be dropped and the user sent back to login.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::NotAuthenticated { .. } => true,
            Self::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<qpw_api::Error> for CoreError {
    fn from(err: qpw_api::Error) -> Self {
        match err {
            qpw_api::Error::AuthenticationRequired { missing } => CoreError::NotAuthenticated {
                reason: format!("no {missing} in session"),
            },
            qpw_api::Error::Network(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(
                            || "<unknown>".into(),
                            |u| u.origin().ascii_serialization(),
                        ),
                        reason: e.to_string(),
                    }
                }
            }
            qpw_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            qpw_api::Error::Transport(message) => CoreError::Config { message },
            qpw_api::Error::Api {
                path,
                status,
                status_text,
                body,
            } => {
                let message = api_message(&body).unwrap_or(status_text);
                CoreError::Api {
                    path,
                    status,
                    message,
                }
            }
            qpw_api::Error::Deserialization { message, .. } => CoreError::Decode { message },
        }
    }
}

/// Pull the platform's `message` field out of an error body, if present.
fn api_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}
