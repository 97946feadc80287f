use thiserror::Error;

/// Top-level error type for the `qpw-api` crate.
///
/// Covers every failure mode of the transport layer: missing session
/// state, transport failures, non-2xx responses, and malformed bodies.
/// `qpw-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session preconditions ───────────────────────────────────────
    /// A call was attempted without a token or region in the session.
    /// Not retryable: the caller must re-authenticate.
    #[error("Authentication required: no {missing} in session")]
    AuthenticationRequired { missing: &'static str },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client itself could not be constructed.
    #[error("Transport setup failed: {0}")]
    Transport(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response from the platform API.
    #[error("API error on {path} (HTTP {status} {status_text})")]
    Api {
        path: String,
        status: u16,
        status_text: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is unusable and the caller should
    /// re-authenticate (missing credentials, or HTTP 401/403).
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::AuthenticationRequired { .. } => true,
            Self::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 429 | 502..=504),
            _ => false,
        }
    }

    /// The HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The request path the error relates to, if known.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Api { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            path: "/api/v2/users".into(),
            status,
            status_text: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn unauthorized_and_forbidden_expire_the_session() {
        assert!(api(401).is_auth_expired());
        assert!(api(403).is_auth_expired());
        assert!(!api(404).is_auth_expired());
        assert!(Error::AuthenticationRequired { missing: "token" }.is_auth_expired());
    }

    #[test]
    fn gateway_errors_are_transient() {
        assert!(api(503).is_transient());
        assert!(api(429).is_transient());
        assert!(!api(400).is_transient());
        assert!(!Error::AuthenticationRequired { missing: "region" }.is_transient());
    }

    #[test]
    fn api_error_exposes_status_and_path() {
        let err = Error::Api {
            path: "/api/v2/users".into(),
            status: 500,
            status_text: "Internal Server Error".into(),
            body: "{}".into(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.path(), Some("/api/v2/users"));
        assert_eq!(
            err.to_string(),
            "API error on /api/v2/users (HTTP 500 Internal Server Error)"
        );
    }
}
