//! Session storage contract.
//!
//! The identity provider persists its session state through a small
//! key/value contract: raw string entries named by the provider, written
//! and read per request. The canonical backing store is the request's
//! cookie jar, but the contract is kept independent of any web framework
//! so tests and other hosts can supply their own implementation.

use async_trait::async_trait;
use std::collections::HashMap;

/// The session entries written during login and deleted on logout.
///
/// `destroy` removes exactly these names, unconditionally. If a provider
/// writes additional entries they are not cleaned up here.
pub const SESSION_KEYS: [&str; 4] = ["id_token", "access_token", "user", "refresh_token"];

/// A value to store in the session.
///
/// Strings are stored verbatim; anything else is serialized to JSON text.
/// The provider's own deserialization is responsible for decoding
/// structured values on the way back out.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    /// A plain string, stored as-is.
    Text(String),
    /// A structured value, stored as JSON text.
    Json(serde_json::Value),
}

impl SessionValue {
    /// Returns the string form that gets persisted.
    #[must_use]
    pub fn into_storable(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Json(v) => v.to_string(),
        }
    }
}

impl From<String> for SessionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for SessionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<serde_json::Value> for SessionValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

/// Per-request session storage used by the identity provider.
///
/// Implementations are scoped to a single request/response cycle; there is
/// no server-side session store, and no caching of entries across requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the raw stored value for `key`, or `None` if not set.
    ///
    /// No parsing is performed; JSON-encoded values come back as raw text.
    async fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, overwriting any existing entry.
    async fn set_item(&mut self, key: &str, value: SessionValue);

    /// Deletes the entry named `key`.
    async fn remove_item(&mut self, key: &str);

    /// Deletes the fixed session entries ([`SESSION_KEYS`]).
    async fn destroy(&mut self) {
        for key in SESSION_KEYS {
            self.remove_item(key).await;
        }
    }
}

/// In-memory session store backed by a `HashMap`.
///
/// Useful for tests and non-HTTP hosts.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    async fn set_item(&mut self, key: &str, value: SessionValue) {
        self.entries.insert(key.to_string(), value.into_storable());
    }

    async fn remove_item(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
