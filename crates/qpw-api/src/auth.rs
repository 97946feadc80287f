// OAuth2 implicit-grant login.
//
// The provider redirects back with the token in the URL fragment. The
// fragment is parsed once, moved into the session store, then scrubbed
// from the location it came from. It is never logged.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;

/// Prefix of the `state` value; the region follows after `|`.
pub const STATE_PREFIX: &str = "qpw";
const STATE_SEPARATOR: char = '|';

/// Endpoint probed after login to confirm the token works.
pub const IDENTITY_PATH: &str = "/api/v2/users/me";

// ── Authorize URL ────────────────────────────────────────────────────

/// `state` value that carries `region` through the redirect round trip.
pub fn encode_state(region: &str) -> String {
    format!("{STATE_PREFIX}{STATE_SEPARATOR}{region}")
}

/// Region embedded in a `state` value, if it has our prefix.
pub fn region_from_state(state: &str) -> Option<&str> {
    let (prefix, region) = state.split_once(STATE_SEPARATOR)?;
    (prefix == STATE_PREFIX && !region.is_empty()).then_some(region)
}

/// The login origin for a region, e.g. `https://login.mypurecloud.ie`.
pub fn regional_login_base(region: &str) -> Result<Url, Error> {
    Ok(Url::parse(&format!("https://login.{region}"))?)
}

/// Build the provider's authorize URL for the implicit grant.
///
/// Deterministic: the same inputs always yield the same URL.
pub fn build_authorize_url(
    login_base: &Url,
    client_id: &str,
    region: &str,
    redirect_uri: &str,
) -> Result<Url, Error> {
    let mut url = login_base.join("/oauth/authorize")?;
    url.query_pairs_mut()
        .append_pair("response_type", "token")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("state", &encode_state(region));
    Ok(url)
}

// ── Redirect fragment ────────────────────────────────────────────────

/// Credentials extracted from a redirect fragment.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub access_token: SecretString,
    pub token_type: String,
    pub expires_in_seconds: u64,
    pub state: String,
}

/// Parse `#access_token=…&token_type=…&expires_in=…&state=…`.
///
/// Returns `None` when the fragment is empty or has no access token; such
/// a fragment is simply not a login response.
pub fn parse_redirect_fragment(fragment: &str) -> Option<AuthResult> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    if fragment.is_empty() {
        return None;
    }

    let mut access_token = None;
    let mut token_type = String::new();
    let mut expires_in_seconds = 0;
    let mut state = String::new();

    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "token_type" => token_type = value.into_owned(),
            "expires_in" => expires_in_seconds = value.parse().unwrap_or(0),
            "state" => state = value.into_owned(),
            _ => {}
        }
    }

    let access_token = access_token.filter(|t| !t.is_empty())?;
    Some(AuthResult {
        access_token: SecretString::from(access_token),
        token_type,
        expires_in_seconds,
        state,
    })
}

/// Where a redirect lands: something with a fragment that can be erased.
pub trait RedirectLocation {
    fn fragment(&self) -> Option<String>;
    /// Remove the fragment so it cannot be re-read or copied.
    fn scrub_fragment(&mut self);
}

impl RedirectLocation for Url {
    fn fragment(&self) -> Option<String> {
        Url::fragment(self).map(str::to_owned)
    }

    fn scrub_fragment(&mut self) {
        self.set_fragment(None);
    }
}

// ── Flow ─────────────────────────────────────────────────────────────

/// Minimal view of `GET /api/v2/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// What a completed login produced.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Region taken from `state`, if it carried one.
    pub region: Option<String>,
    pub token_type: String,
    pub expires_in_seconds: u64,
    /// `None` when the identity probe failed; the session is kept anyway.
    pub identity: Option<Identity>,
}

/// Seeds and clears the session around the implicit-grant redirect.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    client: Arc<ApiClient>,
}

impl AuthFlow {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Consume a login response found at `location`.
    ///
    /// Does nothing (returns `None`) unless the location carries a
    /// fragment with an access token. Otherwise seeds the session, scrubs
    /// the fragment, and probes the identity endpoint. A probe failure is
    /// logged and reported as `identity: None`, never as an error.
    pub async fn complete(&self, location: &mut impl RedirectLocation) -> Option<LoginOutcome> {
        let result = parse_redirect_fragment(&location.fragment()?)?;

        let region = region_from_state(&result.state).map(str::to_owned);
        let session = self.client.session();
        if let Some(region) = &region {
            session.set_region(Some(region.clone()));
        }
        session.set_token(Some(result.access_token.clone()));
        location.scrub_fragment();

        info!(
            region = region.as_deref().unwrap_or("<unchanged>"),
            expires_in = result.expires_in_seconds,
            "session established from redirect"
        );

        let identity = match self.identity().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(error = %e, "identity confirmation failed; keeping session");
                None
            }
        };

        Some(LoginOutcome {
            region,
            token_type: result.token_type,
            expires_in_seconds: result.expires_in_seconds,
            identity,
        })
    }

    /// Confirm the current token by fetching the caller's own user.
    pub async fn identity(&self) -> Result<Identity, Error> {
        self.client.request_as(IDENTITY_PATH, None).await
    }

    /// Forget the session (user action, or a fatal 401).
    pub fn logout(&self) {
        self.client.session().clear();
        info!("session cleared");
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.session().get().is_authenticated()
    }

    /// The current token's non-secret fingerprint, for status display.
    pub fn token_hint(&self) -> Option<String> {
        let session = self.client.session().get();
        let token = session.token()?.expose_secret();
        let tail: String = token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Some(format!("…{tail}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn authorize_url_carries_region_in_state() {
        let base = regional_login_base("mypurecloud.ie").unwrap();
        let url = build_authorize_url(
            &base,
            "client-123",
            "mypurecloud.ie",
            "https://app.example.com/",
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("login.mypurecloud.ie"));
        assert_eq!(url.path(), "/oauth/authorize");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("response_type".into(), "token".into()),
                ("client_id".into(), "client-123".into()),
                ("redirect_uri".into(), "https://app.example.com/".into()),
                ("state".into(), "qpw|mypurecloud.ie".into()),
            ]
        );
    }

    #[test]
    fn authorize_url_is_deterministic() {
        let base = regional_login_base("mypurecloud.com").unwrap();
        let a = build_authorize_url(&base, "c", "mypurecloud.com", "http://localhost/").unwrap();
        let b = build_authorize_url(&base, "c", "mypurecloud.com", "http://localhost/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parses_full_fragment() {
        let result = parse_redirect_fragment(
            "#access_token=abc&token_type=bearer&expires_in=3600&state=qpw|mypurecloud.ie",
        )
        .unwrap();
        assert_eq!(result.access_token.expose_secret(), "abc");
        assert_eq!(result.token_type, "bearer");
        assert_eq!(result.expires_in_seconds, 3600);
        assert_eq!(result.state, "qpw|mypurecloud.ie");
    }

    #[test]
    fn fragment_without_token_is_ignored() {
        assert!(parse_redirect_fragment("").is_none());
        assert!(parse_redirect_fragment("#").is_none());
        assert!(parse_redirect_fragment("#foo=bar").is_none());
        assert!(parse_redirect_fragment("#error=access_denied&state=qpw|x").is_none());
        assert!(parse_redirect_fragment("#access_token=&state=qpw|x").is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let result = parse_redirect_fragment("access_token=tok").unwrap();
        assert_eq!(result.token_type, "");
        assert_eq!(result.expires_in_seconds, 0);
        assert_eq!(result.state, "");

        let result = parse_redirect_fragment("access_token=tok&expires_in=soon").unwrap();
        assert_eq!(result.expires_in_seconds, 0);
    }

    #[test]
    fn state_round_trips_region() {
        assert_eq!(region_from_state(&encode_state("usw2.pure.cloud")), Some("usw2.pure.cloud"));
        assert_eq!(region_from_state("other|mypurecloud.com"), None);
        assert_eq!(region_from_state("qpw|"), None);
        assert_eq!(region_from_state("qpw"), None);
    }

    #[test]
    fn url_location_scrubs_fragment() {
        let mut url = Url::parse("https://app.example.com/#access_token=abc").unwrap();
        assert_eq!(RedirectLocation::fragment(&url).as_deref(), Some("access_token=abc"));
        url.scrub_fragment();
        assert!(RedirectLocation::fragment(&url).is_none());
        assert_eq!(url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn auth_result_debug_hides_token() {
        let result = parse_redirect_fragment("access_token=very-secret").unwrap();
        assert!(!format!("{result:?}").contains("very-secret"));
    }
}
