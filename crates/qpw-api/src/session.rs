// Bearer-token session state.
//
// The session is the single source of truth for the credential every
// outbound call uses. Readers take lock-free snapshots; the only writers
// are the redirect flow (on login) and explicit logout/invalidation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::Error;

/// Error type returned by [`SessionStorage`] backends.
pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

// ── Keys ─────────────────────────────────────────────────────────────

/// The fixed set of persisted session entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token,
    Region,
}

impl SessionKey {
    /// Storage name of this entry.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Storage backends ─────────────────────────────────────────────────

/// Persistent key-value backend for the session.
///
/// Implementations are scoped to one logical client context (a browser
/// tab, a CLI profile). A missing entry means "logged out".
pub trait SessionStorage: Send + Sync {
    fn load(&self, key: SessionKey) -> Option<String>;
    fn store(&self, key: SessionKey, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: SessionKey) -> Result<(), StorageError>;
}

/// In-process storage. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<SessionKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed entries, as if restored from a previous run.
    pub fn with_entries<I, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (SessionKey, V)>,
        V: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k, v.into())).collect();
        Self {
            entries: RwLock::new(map),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: SessionKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn store(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn load(&self, key: SessionKey) -> Option<String> {
        (**self).load(key)
    }

    fn store(&self, key: SessionKey, value: &str) -> Result<(), StorageError> {
        (**self).store(key, value)
    }

    fn remove(&self, key: SessionKey) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

// ── Session snapshot ─────────────────────────────────────────────────

/// A point-in-time view of the session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<SecretString>,
    region: Option<String>,
}

impl Session {
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Both a token and a region are present.
    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_ok()
    }

    /// The token and region an authenticated call needs.
    ///
    /// Fails with [`Error::AuthenticationRequired`] naming the first
    /// missing field.
    pub fn credentials(&self) -> Result<(&SecretString, &str), Error> {
        let token = self
            .token
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or(Error::AuthenticationRequired { missing: "token" })?;
        let region = self
            .region
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(Error::AuthenticationRequired { missing: "region" })?;
        Ok((token, region))
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Holds the current session and mirrors every change into storage.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    current: ArcSwap<Session>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current.load_full())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store, restoring any session the backend already holds.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let token = storage
            .load(SessionKey::Token)
            .filter(|t| !t.is_empty())
            .map(SecretString::from);
        let region = storage.load(SessionKey::Region).filter(|r| !r.is_empty());
        debug!(
            restored_token = token.is_some(),
            restored_region = region.as_deref().unwrap_or("<none>"),
            "session store initialised"
        );

        Self {
            storage: Box::new(storage),
            current: ArcSwap::from_pointee(Session { token, region }),
        }
    }

    /// A store backed by [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Arc<Session> {
        self.current.load_full()
    }

    pub fn set_token(&self, token: Option<SecretString>) {
        let token = token.filter(|t| !t.expose_secret().is_empty());
        self.current.rcu(|cur| Session {
            token: token.clone(),
            region: cur.region.clone(),
        });
        self.sync(SessionKey::Token, token.as_ref().map(|t| t.expose_secret()));
    }

    pub fn set_region(&self, region: Option<String>) {
        let region = region.filter(|r| !r.is_empty());
        self.current.rcu(|cur| Session {
            token: cur.token.clone(),
            region: region.clone(),
        });
        self.sync(SessionKey::Region, region.as_deref());
    }

    /// Drop both fields (logout, or a fatal 401).
    pub fn clear(&self) {
        self.set_token(None);
        self.set_region(None);
    }

    fn sync(&self, key: SessionKey, value: Option<&str>) {
        let result = match value {
            Some(v) => self.storage.store(key, v),
            None => self.storage.remove(key),
        };
        if let Err(e) = result {
            warn!(key = %key, error = %e, "failed to persist session entry");
        }
    }
}
