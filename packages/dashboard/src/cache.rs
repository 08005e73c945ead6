//! Short-lived cache of computed views.
//!
//! Entries expire after a fixed TTL and the whole cache can be dropped on
//! an explicit refresh. Expiry is measured with [`tokio::time::Instant`] so
//! a paused test clock controls it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

/// Default TTL in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays fresh.
    pub ttl: Duration,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Enable caching.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            capacity: DEFAULT_CACHE_CAPACITY,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Loads from `CACHE_TTL_SECS`, `CACHE_CAPACITY`, and `CACHE_ENABLED`,
    /// falling back to defaults for unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let ttl_secs = std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECS);

        let capacity = std::env::var("CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY);

        let enabled = std::env::var("CACHE_ENABLED").map_or(true, |v| v != "false" && v != "0");

        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity,
            enabled,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Generic TTL cache.
///
/// A poisoned lock only means another thread panicked mid-update of a
/// plain map, so the guard is recovered rather than propagated.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    config: CacheConfig,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns a fresh entry, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.config.enabled {
            return None;
        }

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Inserts an entry, evicting expired entries and then the entry
    /// closest to expiry when full.
    pub fn insert(&self, key: K, value: V) {
        if !self.config.enabled || self.config.capacity == 0 {
            return;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if entries.len() >= self.config.capacity && !entries.contains_key(&key) {
            entries.retain(|_, e| !e.is_expired());

            if entries.len() >= self.config.capacity
                && let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(key, CacheEntry::new(value, self.config.ttl));
    }

    /// Drops every entry, returning how many were held.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let count = entries.len();
        entries.clear();
        count
    }

    /// Removes expired entries.
    pub fn cleanup(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired());
        let evicted = before - entries.len();
        if evicted > 0 {
            log::debug!("Cache cleanup evicted {evicted} entries");
        }
    }

    /// Number of entries held, fresh or not.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether caching is enabled.
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64, capacity: usize) -> TtlCache<&'static str, u32> {
        TtlCache::new(CacheConfig {
            ttl: Duration::from_secs(ttl_secs),
            capacity,
            enabled: true,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_the_ttl() {
        let cache = cache(60, 8);
        cache.insert("monthly", 1);
        assert_eq!(cache.get(&"monthly"), Some(1));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&"monthly"), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"monthly"), None);

        cache.cleanup();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_the_oldest_entry_when_full() {
        let cache = cache(60, 2);
        cache.insert("a", 1);
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("b", 2);
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_key_does_not_evict() {
        let cache = cache(60, 2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("b", 3);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_reports_dropped_entries() {
        let cache = cache(60, 8);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_cache_stores_nothing() {
        let cache: TtlCache<&str, u32> = TtlCache::new(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), None);
        assert!(!cache.is_enabled());
    }
}
