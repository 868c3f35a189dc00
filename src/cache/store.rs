//! TTL key/value store.

use crate::sweep::{spawn_sweeper, SweepHandle};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TtlCacheConfig {
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl TtlCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL applied when `set` is called without one
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set how often the background sweep runs
    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory key/value store with purely time-based eviction.
///
/// An entry is visible while `now < expires_at` and logically absent after,
/// whether or not it has been physically removed yet. `set` overwrites any
/// prior entry wholesale, value and TTL both. No LRU, no capacity bound:
/// entries that expire unread are reclaimed by the background sweep.
pub struct TtlCache<V> {
    cfg: TtlCacheConfig,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(cfg: TtlCacheConfig) -> Self {
        Self {
            cfg,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TtlCacheConfig {
        &self.cfg
    }

    /// Look up a live entry, dropping it on the spot if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.write().ok()?;
        if let Some(entry) = entries.get(key) {
            if entry.is_expired(now) {
                entries.remove(key);
                debug!(key, "expired entry dropped on read");
                return None;
            }
            return Some(entry.value.clone());
        }
        None
    }

    /// Store under the config's default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let ttl = self.cfg.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Store with an explicit TTL, replacing any prior entry for the key.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key.into(), value, ttl, Instant::now());
    }

    pub(crate) fn set_at(&self, key: String, value: V, ttl: Duration, now: Instant) {
        if let Ok(mut entries) = self.entries.write() {
            debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "entry stored");
            entries.insert(
                key,
                CacheEntry {
                    value,
                    expires_at: now + ttl,
                },
            );
        }
    }

    /// Remove an entry outright. Returns whether one was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Purge expired entries. Returns how many were removed.
    ///
    /// Redundant with the lazy drop inside [`get`](Self::get); this bounds
    /// memory for keys that are never read again.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        if let Ok(mut entries) = self.entries.write() {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            let purged = before - entries.len();
            if purged > 0 {
                debug!(purged, live = entries.len(), "expired entries swept");
            }
            purged
        } else {
            0
        }
    }

    /// Spawn the periodic background sweep for this cache.
    pub fn start_sweeper(self: &Arc<Self>) -> SweepHandle
    where
        V: Send + Sync + 'static,
    {
        let cache = Arc::clone(self);
        spawn_sweeper("cache_sweep", self.cfg.sweep_interval, move || {
            cache.sweep();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn cache_with_ttl(ttl: Duration) -> TtlCache<String> {
        TtlCache::new(TtlCacheConfig::new().with_default_ttl(ttl))
    }

    #[test]
    fn test_config_defaults() {
        let config = TtlCacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(1800));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        cache.set("k1", "hello".to_string());
        assert_eq!(cache.get("k1").as_deref(), Some("hello"));
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        cache.set_with_ttl("k1", "v".to_string(), Duration::from_millis(100));
        assert!(cache.get("k1").is_some());

        thread::sleep(Duration::from_millis(150));
        assert!(cache.get("k1").is_none());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let now = Instant::now();
        cache.set_at("k1".to_string(), "v".to_string(), Duration::from_millis(100), now);

        assert!(cache.get_at("k1", now + Duration::from_millis(99)).is_some());
        assert!(cache.get_at("k1", now + Duration::from_millis(100)).is_none());
    }

    #[test]
    fn test_set_overwrites_value_and_ttl() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let now = Instant::now();
        cache.set_at("k1".to_string(), "old".to_string(), Duration::from_millis(50), now);
        cache.set_at("k1".to_string(), "new".to_string(), Duration::from_secs(60), now);

        // Past the first TTL the replacement entry is still live.
        let later = now + Duration::from_millis(200);
        assert_eq!(cache.get_at("k1", later).as_deref(), Some("new"));
    }

    #[test]
    fn test_get_on_expired_physically_deletes() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let now = Instant::now();
        cache.set_at("k1".to_string(), "v".to_string(), Duration::from_millis(50), now);

        let later = now + Duration::from_millis(60);
        assert!(cache.get_at("k1", later).is_none());
        // Nothing left for the sweep to purge.
        assert_eq!(cache.sweep_at(later), 0);
    }

    #[test]
    fn test_len_counts_live_entries_only() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        cache.set_with_ttl("short", "v".to_string(), Duration::from_millis(30));
        cache.set("long", "v".to_string());
        assert_eq!(cache.len(), 2);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_sweep_purges_only_expired() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let now = Instant::now();
        cache.set_at("a".to_string(), "v".to_string(), Duration::from_millis(50), now);
        cache.set_at("b".to_string(), "v".to_string(), Duration::from_millis(50), now);
        cache.set_at("c".to_string(), "v".to_string(), Duration::from_secs(60), now);

        let purged = cache.sweep_at(now + Duration::from_millis(100));
        assert_eq!(purged, 2);
        assert_eq!(cache.get_at("c", now + Duration::from_millis(100)).as_deref(), Some("v"));
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        cache.set("k1", "v".to_string());
        cache.set("k2", "v".to_string());

        assert!(cache.remove("k1"));
        assert!(!cache.remove("k1"));
        assert!(cache.get("k1").is_none());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_callers_receive_copies() {
        let cache: TtlCache<Vec<u32>> = TtlCache::new(TtlCacheConfig::default());
        cache.set("k1", vec![1, 2]);

        let mut copy = cache.get("k1").unwrap();
        copy.push(3);
        assert_eq!(cache.get("k1").unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_background_sweeper_purges_expired() {
        let cache = Arc::new(TtlCache::new(
            TtlCacheConfig::new()
                .with_default_ttl(Duration::from_millis(20))
                .with_sweep_interval(Duration::from_millis(25)),
        ));
        cache.set("k1", "v".to_string());

        let sweeper = cache.start_sweeper();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Swept in the background, so a later sweep finds nothing.
        assert_eq!(cache.sweep(), 0);
        assert!(cache.get("k1").is_none());
        sweeper.shutdown().await;
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(cache_with_ttl(Duration::from_secs(60)));
        let mut handles = vec![];
        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for n in 0..50 {
                    let key = format!("{}-{}", t, n);
                    cache.set(key.clone(), "v".to_string());
                    assert!(cache.get(&key).is_some());
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 200);
    }
}
