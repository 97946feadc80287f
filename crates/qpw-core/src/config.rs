// ── Runtime connection configuration ──
//
// These types describe how to reach the platform and which OAuth client
// to log in as. They never touch disk; the shell builds a
// `ConnectionConfig` and hands it in.

use std::time::Duration;

use url::Url;

/// Configuration for one platform connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// OAuth client id registered for the implicit grant.
    pub client_id: String,
    /// Where the provider redirects after login.
    pub redirect_uri: Url,
    /// Region used when building the authorize URL if none is given.
    pub default_region: Option<String>,
    /// Request timeout. `None` inherits the transport's behaviour.
    pub timeout: Option<Duration>,
    /// Page ceiling per lookup walk.
    pub max_pages: u32,
    /// Pin the API origin instead of `https://api.<region>`.
    pub api_base: Option<Url>,
    /// Pin the login origin instead of `https://login.<region>`.
    pub login_base: Option<Url>,
}

impl ConnectionConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            default_region: None,
            timeout: None,
            max_pages: qpw_api::paginate::DEFAULT_MAX_PAGES,
            api_base: None,
            login_base: None,
        }
    }
}
