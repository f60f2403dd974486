//! In-memory memoization of API responses.
//!
//! One `QueryCache` is shared by every widget in the process, but it is always
//! handed out explicitly (`Arc<QueryCache>`), never reached through a global.
//! Entries are stored as JSON values so one cache can hold any response type.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long a cached entry stays fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Fresh for the given duration after it was stored
    For(Duration),
    /// Never goes stale within the session (genres, details)
    Forever,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
    freshness: Freshness,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.freshness {
            Freshness::Forever => true,
            Freshness::For(ttl) => now.duration_since(self.stored_at) < ttl,
        }
    }
}

/// Cache manager for API responses
#[derive(Debug)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Whether caching is enabled
    enabled: bool,
    /// Freshness applied by `set`
    default_freshness: Freshness,
    /// Upper bound on stored entries
    max_entries: usize,
}

impl QueryCache {
    /// Create a new query cache
    pub fn new(enabled: bool, stale_time: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            enabled,
            default_freshness: Freshness::For(stale_time),
            max_entries: max_entries.max(1),
        }
    }

    /// Build a cache from the `[cache]` config section
    pub fn from_config(config: &shared::config::CacheConfig) -> Self {
        Self::new(config.enabled, config.stale_time(), config.max_entries)
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO, 1)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a fresh cached item if it exists
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let mut entries = self.lock();

        let value = match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => entry.value.clone(),
            Some(_) => {
                debug!(key = key, "Cache entry stale");
                entries.remove(key);
                return None;
            }
            None => {
                debug!(key = key, "Cache miss");
                return None;
            }
        };
        drop(entries);

        match serde_json::from_value(value) {
            Ok(data) => {
                debug!(key = key, "Cache hit");
                Some(data)
            }
            Err(e) => {
                warn!(key = key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    /// Store an item with the default freshness
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        self.set_with(key, data, self.default_freshness);
    }

    /// Store an item with an explicit freshness
    pub fn set_with<T: Serialize>(&self, key: &str, data: &T, freshness: Freshness) {
        if !self.enabled {
            return;
        }

        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to serialize cache data");
                return;
            }
        };

        let mut entries = self.lock();

        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!(key = %oldest, "Evicting oldest cache entry");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                freshness,
            },
        );
        debug!(key = key, "Cache stored");
    }

    /// Check if a fresh cache entry exists
    pub fn exists(&self, key: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let now = Instant::now();
        self.lock().get(key).is_some_and(|entry| entry.is_fresh(now))
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        let mut entries = self.lock();
        if !entries.is_empty() {
            entries.clear();
            info!("Cache cleared");
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.lock();
        CacheStats {
            total_entries: entries.len(),
            fresh_entries: entries.values().filter(|e| e.is_fresh(now)).count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
}
