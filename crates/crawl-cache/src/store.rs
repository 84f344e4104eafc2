//! TTL key/value store
//!
//! Presence of a dedup marker means "already processed"; expiry makes the
//! item eligible again. Entries are dropped lazily on access, so a marker
//! that is never touched again simply sits until the process exits.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory TTL cache behind a single async lock. Every operation is one
/// critical section, which is what makes [`set_if_absent`] usable as the
/// sole dedup gate under concurrent callers.
///
/// [`set_if_absent`]: MemoryCache::set_if_absent
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a live value. Expired entries are removed and read as absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        if inner.get(key).is_some_and(|e| e.is_expired(now)) {
            inner.remove(key);
            return None;
        }
        inner.get(key).map(|e| e.value.clone())
    }

    /// Store a value. `None` for `ttl` means the entry never expires.
    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let mut inner = self.inner.lock().await;
        inner.insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
    }

    /// Store a value only when the key is vacant or expired. Returns true
    /// when the write happened, which is the "first time seen" signal for
    /// dedup.
    pub async fn set_if_absent(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        let key = key.into();
        let now = Instant::now();
        if inner.get(&key).is_some_and(|e| !e.is_expired(now)) {
            return false;
        }
        inner.insert(
            key,
            Entry {
                value: value.into(),
                expires_at: ttl.map(|t| now + t),
            },
        );
        true
    }

    /// Whether a live entry exists for `key`.
    pub async fn exists(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        if inner.get(key).is_some_and(|e| e.is_expired(now)) {
            inner.remove(key);
            return false;
        }
        inner.contains_key(key)
    }
}
