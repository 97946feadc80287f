// ── Connection facade ──
//
// One logged-in (or not yet logged-in) platform connection. Owns the
// session store and the API client, and routes login, identity and
// lookup calls through them. Cheaply cloneable.

use std::sync::Arc;

use qpw_api::{
    ApiClient, ApiHost, AuthFlow, Identity, LoginOutcome, RedirectLocation, Session,
    SessionStorage, SessionStore, TransportConfig, build_authorize_url, regional_login_base,
};
use tracing::{debug, warn};
use url::Url;

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::lookup::{LookupAggregator, LookupKind, LookupLoad};
use crate::model::LookupOption;

#[derive(Debug, Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

#[derive(Debug)]
struct ConnectionInner {
    config: ConnectionConfig,
    client: Arc<ApiClient>,
    auth: AuthFlow,
    lookups: LookupAggregator,
}

impl Connection {
    /// Build a connection whose session is restored from `storage`.
    pub fn new(
        config: ConnectionConfig,
        storage: impl SessionStorage + 'static,
    ) -> Result<Self, CoreError> {
        let mut transport = TransportConfig::default();
        if let Some(timeout) = config.timeout {
            transport = transport.with_timeout(timeout);
        }
        let http = transport.build_client()?;
        Ok(Self::with_client(config, http, SessionStore::new(storage)))
    }

    /// Build a connection around an existing HTTP client and session.
    pub fn with_client(
        config: ConnectionConfig,
        http: reqwest::Client,
        session: SessionStore,
    ) -> Self {
        let host = config
            .api_base
            .clone()
            .map_or(ApiHost::Regional, ApiHost::Fixed);
        let client = Arc::new(ApiClient::with_client(http, Arc::new(session), host));
        let auth = AuthFlow::new(Arc::clone(&client));
        let lookups = LookupAggregator::new(Arc::clone(&client)).with_max_pages(config.max_pages);

        Self {
            inner: Arc::new(ConnectionInner {
                config,
                client,
                auth,
                lookups,
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.inner.client
    }

    /// Current session snapshot.
    pub fn session(&self) -> Arc<Session> {
        self.inner.client.session().get()
    }

    // ── Login ────────────────────────────────────────────────────────

    /// The URL to open in a browser to start a login.
    ///
    /// Region resolution: `region`, then the configured default, then the
    /// region of the current session.
    pub fn authorize_url(&self, region: Option<&str>) -> Result<Url, CoreError> {
        let config = &self.inner.config;
        let session = self.session();
        let region = region
            .or(config.default_region.as_deref())
            .or(session.region())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| CoreError::Config {
                message: "no region configured; pass one explicitly".into(),
            })?;

        let login_base = match &config.login_base {
            Some(base) => base.clone(),
            None => regional_login_base(region)?,
        };

        Ok(build_authorize_url(
            &login_base,
            &config.client_id,
            region,
            config.redirect_uri.as_str(),
        )?)
    }

    /// Consume the redirect the provider sent back. `None` means the
    /// location held no login response and nothing changed.
    pub async fn complete_login(
        &self,
        location: &mut impl RedirectLocation,
    ) -> Option<LoginOutcome> {
        self.inner.auth.complete(location).await
    }

    pub fn logout(&self) {
        self.inner.auth.logout();
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.auth.is_logged_in()
    }

    pub fn token_hint(&self) -> Option<String> {
        self.inner.auth.token_hint()
    }

    /// Fetch the logged-in user. A rejected token ends the session.
    pub async fn whoami(&self) -> Result<Identity, CoreError> {
        match self.inner.auth.identity().await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                let err = CoreError::from(e);
                self.invalidate_if_rejected(&err);
                Err(err)
            }
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Load all eight lookups. A 401/403 on any of them ends the session.
    pub async fn load_lookups(&self) -> LookupLoad {
        let load = self.inner.lookups.load_all().await;
        if load.requires_login() && self.is_logged_in() {
            warn!("lookup rejected by platform; clearing session");
            self.logout();
        }
        load
    }

    pub async fn load_lookup(&self, kind: LookupKind) -> Result<Vec<LookupOption>, CoreError> {
        debug!(%kind, "loading single lookup");
        let result = self.inner.lookups.load_one(kind).await;
        if let Err(err) = &result {
            self.invalidate_if_rejected(err);
        }
        result
    }

    fn invalidate_if_rejected(&self, err: &CoreError) {
        if err.requires_login() && self.is_logged_in() {
            warn!(error = %err, "token rejected; clearing session");
            self.logout();
        }
    }
}
