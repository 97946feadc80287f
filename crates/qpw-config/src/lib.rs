//! Shared configuration for qpw.
//!
//! TOML profiles with env overrides, keyring-backed session storage, and
//! translation to `qpw_core::ConnectionConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use qpw_api::{SessionKey, SessionStorage, StorageError};
use qpw_core::ConnectionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Keyring service name shared by every profile.
pub const KEYRING_SERVICE: &str = "qpw";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named platform profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile name to use: explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }

    /// Comma-separated profile names, sorted, for help text.
    pub fn profile_names(&self) -> String {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named platform profile: one OAuth client in one region.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// OAuth client id registered for the implicit grant.
    pub client_id: String,

    /// Redirect target registered with the client.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Region domain, e.g. "mypurecloud.ie".
    pub region: Option<String>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,

    /// Page ceiling per lookup walk.
    pub max_pages: Option<u32>,

    /// Pin the API origin (proxies, test servers).
    pub api_base: Option<String>,

    /// Pin the login origin.
    pub login_base: Option<String>,
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.into()
}

impl Profile {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: default_redirect_uri(),
            region: None,
            timeout: None,
            max_pages: None,
            api_base: None,
            login_base: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "qpw", "qpw").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("qpw");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + `QPW_` environment. A missing file is not an error.
///
/// Nested keys use a double underscore: `QPW_PROFILES__WORK__REGION`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("QPW_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile → ConnectionConfig ──────────────────────────────────────

/// Build a `ConnectionConfig` from a profile, with no CLI overrides.
pub fn profile_to_connection_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ConnectionConfig, ConfigError> {
    if profile.client_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "client_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let redirect_uri = parse_url("redirect_uri", &profile.redirect_uri)?;
    let mut config = ConnectionConfig::new(profile.client_id.clone(), redirect_uri);

    config.default_region = profile.region.clone().filter(|r| !r.is_empty());
    config.timeout = Some(Duration::from_secs(
        profile.timeout.unwrap_or(defaults.timeout),
    ));
    if let Some(max_pages) = profile.max_pages {
        config.max_pages = max_pages;
    }
    config.api_base = profile
        .api_base
        .as_deref()
        .map(|s| parse_url("api_base", s))
        .transpose()?;
    config.login_base = profile
        .login_base
        .as_deref()
        .map(|s| parse_url("login_base", s))
        .transpose()?;

    Ok(config)
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    value.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{value}': {e}"),
    })
}

// ── Keyring session storage ─────────────────────────────────────────

/// Session storage in the OS keyring, one entry pair per profile.
///
/// Accounts are `<profile>/token` and `<profile>/region` under the
/// [`KEYRING_SERVICE`] service.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    profile: String,
}

impl KeyringStorage {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }

    pub fn account(&self, key: SessionKey) -> String {
        format!("{}/{}", self.profile, key.as_str())
    }

    fn entry(&self, key: SessionKey) -> keyring::Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &self.account(key))
    }
}

impl SessionStorage for KeyringStorage {
    fn load(&self, key: SessionKey) -> Option<String> {
        match self.entry(key).and_then(|e| e.get_password()) {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!(%key, error = %e, "keyring read failed");
                None
            }
        }
    }

    fn store(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
