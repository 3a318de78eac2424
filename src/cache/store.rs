// src/cache/store.rs
// =============================================================================
// Process-wide response cache.
//
// An LRU map bounded two ways: by entry count and by the total size of the
// serialized values. Each entry also expires once it has gone unread for
// longer than its TTL (reads push the deadline back).
//
// Recency is kept by `lru::LruCache`: `get_mut` promotes, `peek` doesn't,
// and `pop_lru` hands back the oldest entry when a bound is exceeded. The
// map itself is unbounded; the two limits are enforced here so the byte
// total stays in step with every eviction.
//
// Values are stored as serialized JSON. That makes the size accounting
// exact and lets one cache hold repository metadata, file lists and file
// contents side by side.
// =============================================================================

use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_MAX_ENTRIES: usize = 500;
pub const DEFAULT_MAX_BYTES: usize = 100 * 1024 * 1024;
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub max_bytes: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_bytes: DEFAULT_MAX_BYTES,
            ttl: DEFAULT_TTL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: usize,
    pub max_entries: usize,
    pub max_bytes: usize,
}

#[derive(Debug)]
struct Entry {
    payload: String,
    size: usize,
    ttl: Duration,
    inserted_at: Instant,
    last_access: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_access) > self.ttl
    }
}

struct Inner {
    entries: LruCache<String, Entry>,
    total_bytes: usize,
}

impl Default for Inner {
    fn default() -> Self {
        Inner {
            entries: LruCache::unbounded(),
            total_bytes: 0,
        }
    }
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.pop(key)?;
        self.total_bytes -= entry.size;
        Some(entry)
    }

    // Drops least recently used entries until both limits hold
    fn enforce_capacity(&mut self, config: &CacheConfig) {
        while self.entries.len() > config.max_entries || self.total_bytes > config.max_bytes {
            let Some((key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.total_bytes -= entry.size;
            debug!(key = %key, size = entry.size, "evicted cache entry");
        }
    }
}

pub struct ResponseCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        ResponseCache {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fresh value for `key`, or None when missing, expired or of another type
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at<T: DeserializeOwned>(&self, key: &str, now: Instant) -> Option<T> {
        let payload = {
            let mut inner = self.inner.lock();
            let expired = inner.entries.peek(key)?.is_expired(now);
            if expired {
                inner.remove(key);
                debug!(key, "cache entry expired");
                return None;
            }
            let entry = inner.entries.get_mut(key)?;
            entry.last_access = now;
            entry.payload.clone()
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached value has an unexpected shape");
                None
            }
        }
    }

    /// Stores `value` under the default TTL
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_at(key, value, self.config.ttl, Instant::now());
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub(crate) fn set_at<T: Serialize>(&self, key: &str, value: &T, ttl: Duration, now: Instant) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "value could not be serialized, not caching");
                return;
            }
        };
        let size = payload.len();

        let mut inner = self.inner.lock();
        inner.remove(key);

        // Would evict everything else and still not fit
        if size > self.config.max_bytes {
            warn!(key, size, "value larger than the whole cache, not caching");
            return;
        }

        inner.total_bytes += size;
        inner.entries.put(
            key.to_string(),
            Entry {
                payload,
                size,
                ttl,
                inserted_at: now,
                last_access: now,
            },
        );

        inner.enforce_capacity(&self.config);
    }

    /// Presence check that doesn't count as a use
    pub fn has(&self, key: &str) -> bool {
        self.has_at(key, Instant::now())
    }

    pub(crate) fn has_at(&self, key: &str, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.peek(key).map(|e| e.is_expired(now)) {
            Some(false) => true,
            Some(true) => {
                inner.remove(key);
                false
            }
            None => false,
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_bytes = 0;
    }

    /// Drops every entry belonging to `owner/repo`.
    ///
    /// This is a scan over all keys; it is meant for manual invalidation.
    pub fn invalidate_repository(&self, owner: &str, repo: &str) -> usize {
        let needle = format!("{owner}/{repo}");
        let mut inner = self.inner.lock();

        let doomed: Vec<String> = inner
            .entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.contains(&needle))
            .cloned()
            .collect();
        for key in &doomed {
            inner.remove(key);
        }

        debug!(repository = %needle, removed = doomed.len(), "invalidated repository");
        doomed.len()
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// How long ago `key` was first stored (None if absent)
    pub fn age(&self, key: &str) -> Option<Duration> {
        self.inner
            .lock()
            .entries
            .peek(key)
            .map(|e| e.inserted_at.elapsed())
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            total_bytes: inner.total_bytes,
            max_entries: self.config.max_entries,
            max_bytes: self.config.max_bytes,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        ResponseCache::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn small_cache(max_entries: usize) -> ResponseCache {
        ResponseCache::new(CacheConfig {
            max_entries,
            max_bytes: DEFAULT_MAX_BYTES,
            ttl: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_round_trip() {
        let cache = ResponseCache::default();
        let value = json!({"path": "README.md", "sha": "abc", "size": 3, "tags": ["a", "b"]});

        cache.set("content:o/r:default:README.md", &value);
        let back: serde_json::Value = cache.get("content:o/r:default:README.md").unwrap();
        assert_eq!(back, value);
        assert!(cache.has("content:o/r:default:README.md"));
    }

    #[test]
    fn test_expiry_after_ttl() {
        let cache = small_cache(10);
        let start = Instant::now();
        cache.set_at("k", &"v", Duration::from_secs(60), start);

        assert_eq!(
            cache.get_at::<String>("k", start + Duration::from_secs(30)),
            Some("v".to_string())
        );
        assert_eq!(cache.get_at::<String>("k", start + Duration::from_secs(200)), None);
        // expired entries are purged, not just hidden
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_reads_extend_freshness() {
        let cache = small_cache(10);
        let start = Instant::now();
        cache.set_at("k", &1u32, Duration::from_secs(60), start);

        // read every 45s: never idle for a full minute
        for step in 1..=4 {
            let now = start + Duration::from_secs(45 * step);
            assert_eq!(cache.get_at::<u32>("k", now), Some(1), "step {step}");
        }
        assert_eq!(cache.get_at::<u32>("k", start + Duration::from_secs(500)), None);
    }

    #[test]
    fn test_has_does_not_refresh() {
        let cache = small_cache(10);
        let start = Instant::now();
        cache.set_at("k", &1u32, Duration::from_secs(60), start);

        assert!(cache.has_at("k", start + Duration::from_secs(50)));
        assert!(!cache.has_at("k", start + Duration::from_secs(70)));
    }

    #[test]
    fn test_count_eviction_uses_last_access() {
        let cache = small_cache(3);
        cache.set("a", &1);
        cache.set("b", &2);
        cache.set("c", &3);

        // a becomes the most recently used, b is now the oldest
        assert_eq!(cache.get::<i32>("a"), Some(1));
        cache.set("d", &4);

        assert_eq!(cache.get::<i32>("b"), None);
        assert_eq!(cache.get::<i32>("a"), Some(1));
        assert_eq!(cache.get::<i32>("c"), Some(3));
        assert_eq!(cache.get::<i32>("d"), Some(4));
        assert_eq!(cache.stats().entries, 3);
    }

    #[test]
    fn test_presence_check_does_not_promote() {
        let cache = small_cache(3);
        cache.set("a", &1);
        cache.set("b", &2);
        cache.set("c", &3);

        assert!(cache.has("a"));
        assert!(cache.age("a").is_some());
        cache.set("d", &4);

        assert!(!cache.has("a"));
        assert_eq!(cache.keys(), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_size_eviction() {
        let cache = ResponseCache::new(CacheConfig {
            max_entries: 100,
            max_bytes: 30,
            ttl: DEFAULT_TTL,
        });

        // each payload is a 12 byte JSON string ("0123456789" plus quotes)
        cache.set("one", &"0123456789");
        cache.set("two", &"0123456789");
        assert_eq!(cache.stats().total_bytes, 24);

        cache.set("three", &"0123456789");
        assert_eq!(cache.stats().total_bytes, 24);
        assert!(!cache.has("one"));
        assert!(cache.has("two"));
        assert!(cache.has("three"));
    }

    #[test]
    fn test_oversized_value_is_skipped() {
        let cache = ResponseCache::new(CacheConfig {
            max_entries: 10,
            max_bytes: 8,
            ttl: DEFAULT_TTL,
        });
        cache.set("small", &1);
        cache.set("huge", &"this will never fit");

        assert!(!cache.has("huge"));
        assert!(cache.has("small"));
    }

    #[test]
    fn test_overwrite_updates_size() {
        let cache = ResponseCache::default();
        cache.set("k", &"aaaaaaaa");
        cache.set("k", &"b");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.total_bytes, 3);
    }

    #[test]
    fn test_invalidate_repository() {
        let cache = ResponseCache::default();
        cache.set("repo:octo/docs", &1);
        cache.set("tree:octo/docs:default", &2);
        cache.set("content:octo/docs:main:README.md", &3);
        cache.set("repo:octo/other", &4);
        cache.set("ratelimit", &5);

        assert_eq!(cache.invalidate_repository("octo", "docs"), 3);
        assert_eq!(cache.keys(), vec!["ratelimit".to_string(), "repo:octo/other".to_string()]);
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = ResponseCache::default();
        cache.set("a", &1);
        cache.set("b", &2);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));

        cache.clear();
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 0,
                total_bytes: 0,
                max_entries: DEFAULT_MAX_ENTRIES,
                max_bytes: DEFAULT_MAX_BYTES,
            }
        );
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let cache = ResponseCache::default();
        cache.set("k", &"text");
        assert_eq!(cache.get::<Vec<u32>>("k"), None);
        assert!(cache.age("k").is_some());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(small_cache(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(&format!("k{}", i % 20), &(t * 1000 + i));
                        let _ = cache.get::<i32>(&format!("k{}", (i + 7) % 20));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.entries, 20);
        assert_eq!(cache.keys().len(), 20);
    }
}
