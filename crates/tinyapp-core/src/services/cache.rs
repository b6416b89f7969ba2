//! Key-value cache capability.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

/// A shared key-value cache with optional expiry.
pub trait Cache: Send + Sync {
    /// Returns a live entry.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores an entry. `ttl` of `None` never expires.
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>);

    /// Removes an entry. Returns true if a live entry was removed.
    fn delete(&self, key: &str) -> bool;

    /// True if a live entry exists.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes every entry.
    fn clear(&self);
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An in-process [`Cache`]. Expired entries are dropped lazily on access.
///
/// # Example
///
/// ```
/// use tinyapp_core::services::{Cache, MemoryCache};
/// use serde_json::json;
///
/// let cache = MemoryCache::new();
/// cache.set("greeting", json!("hello"), None);
/// assert_eq!(cache.get("greeting"), Some(json!("hello")));
/// ```
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet dropped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    fn delete(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now))
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
