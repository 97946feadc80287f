// Authenticated HTTP request layer.
//
// Every call reads the session snapshot, composes the regional URL,
// attaches the bearer token, and maps non-2xx responses to `Error::Api`.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::query::{QueryParams, build_url, regional_api_base};
use crate::session::SessionStore;
use crate::transport::TransportConfig;

/// Where API calls are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiHost {
    /// `https://api.<region>`, derived from the session on every call.
    Regional,
    /// A fixed origin (tests, proxies). The session must still carry a region.
    Fixed(Url),
}

/// Per-call overrides: method, extra headers, JSON body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Async client for the platform's REST API.
///
/// Cheap to share behind an `Arc`; holds no per-call state. The session
/// store is read on every request, so a logout is observed immediately.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    session: Arc<SessionStore>,
    host: ApiHost,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client with its own `reqwest::Client` from `transport`.
    pub fn new(
        session: Arc<SessionStore>,
        host: ApiHost,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, session, host))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, session: Arc<SessionStore>, host: ApiHost) -> Self {
        Self {
            http,
            session,
            host,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn host(&self) -> &ApiHost {
        &self.host
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Perform one authenticated request.
    ///
    /// Returns `Ok(None)` for `204 No Content` (or an empty success body),
    /// otherwise the parsed JSON. Fails with
    /// [`Error::AuthenticationRequired`] before any network activity when
    /// the session lacks a token or region.
    pub async fn request(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        options: Option<RequestOptions>,
    ) -> Result<Option<Value>, Error> {
        let session = self.session.get();
        let (token, region) = session.credentials()?;

        let base = match &self.host {
            ApiHost::Regional => regional_api_base(region)?,
            ApiHost::Fixed(url) => url.clone(),
        };
        let empty = QueryParams::new();
        let url = build_url(&base, path, params.unwrap_or(&empty))?;

        let options = options.unwrap_or_default();
        let headers = Self::merge_headers(token.expose_secret(), options.headers)?;

        debug!(method = %options.method, %path, "api request");

        let mut builder = self.http.request(options.method, url).headers(headers);
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        Self::handle_response(path, resp).await
    }

    /// [`request`](Self::request) a single typed resource.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
    ) -> Result<T, Error> {
        let value = self
            .request(path, params, None)
            .await?
            .ok_or_else(|| Error::Deserialization {
                message: format!("expected a JSON body from {path}, got none"),
                body: String::new(),
            })?;

        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    // ── Headers ──────────────────────────────────────────────────────

    /// Defaults first, then caller headers over them. A caller may replace
    /// the `Authorization` value but can never leave the request without one.
    fn merge_headers(token: &str, extra: HeaderMap) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            Error::AuthenticationRequired {
                missing: "well-formed token",
            }
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for name in extra.keys() {
            headers.remove(name);
        }
        for (name, value) in &extra {
            headers.append(name.clone(), value.clone());
        }

        Ok(headers)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(path: &str, resp: reqwest::Response) -> Result<Option<Value>, Error> {
        let status = resp.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(%path, status = status.as_u16(), "api request failed");
            return Err(Error::Api {
                path: path.to_owned(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_owned(),
                body,
            });
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body).map(Some).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
