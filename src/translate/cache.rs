//! Bounded translation cache
//!
//! In-memory LRU memo of provider results for the lifetime of the process.
//! Key: (source language, target language, case-folded text).
//! Capacity defaults to 200 entries. There is no TTL; entries leave only
//! through capacity eviction.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

/// Default number of distinct keys held before eviction starts
pub const DEFAULT_CAPACITY: usize = 200;

/// Normalized cache key
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    source: String,
    target: String,
    text: String,
}

impl CacheKey {
    /// Build the key, case-folding the text. Whitespace is left as the caller passed it.
    pub fn new(source: &str, target: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            text: text.to_lowercase(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// A cached value and whether it is a kept original after a provider failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    pub text: String,
    pub fallback: bool,
}

/// Thread-safe fixed-capacity translation cache
///
/// Every operation takes the inner lock once, so a single `lookup` or
/// `record` is atomic. Callers that need the whole read-miss-compute-write
/// sequence serialized per key do that one level up (see `Translator`).
pub struct TranslationCache {
    inner: Mutex<LruCache<CacheKey, CachedTranslation>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TranslationCache {
    /// Create a cache holding at most `capacity` keys (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a translation, promoting the entry to most-recently-used on a hit.
    pub fn lookup(&self, source: &str, target: &str, text: &str) -> Option<String> {
        self.lookup_entry(source, target, text).map(|entry| entry.text)
    }

    /// Like [`lookup`](Self::lookup), keeping the fallback marker
    pub fn lookup_entry(&self, source: &str, target: &str, text: &str) -> Option<CachedTranslation> {
        let key = CacheKey::new(source, target, text);
        let found = self.inner.lock().get(&key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert or overwrite a translation and mark it most-recently-used.
    ///
    /// Inserting a new key into a full cache evicts exactly one entry, the
    /// least recently touched by `lookup` or `record`.
    pub fn record(&self, source: &str, target: &str, text: &str, translated: impl Into<String>) {
        self.insert(
            CacheKey::new(source, target, text),
            CachedTranslation {
                text: translated.into(),
                fallback: false,
            },
        );
    }

    /// Record that translating `text` failed; the value is the text itself
    pub fn record_fallback(&self, source: &str, target: &str, text: &str) {
        self.insert(
            CacheKey::new(source, target, text),
            CachedTranslation {
                text: text.to_string(),
                fallback: true,
            },
        );
    }

    fn insert(&self, key: CacheKey, value: CachedTranslation) {
        let evicted = self.inner.lock().push(key.clone(), value);

        if let Some((old_key, _)) = evicted {
            if old_key != key {
                tracing::trace!(
                    source = %old_key.source,
                    target = %old_key.target,
                    "Evicted least recently used translation"
                );
            }
        }
    }

    /// Number of distinct keys currently held
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_recorded() {
        let cache = TranslationCache::new(2);
        cache.record("auto", "vi", "A", "a-vi");
        cache.record("auto", "vi", "B", "b-vi");
        cache.record("auto", "vi", "C", "c-vi");

        assert_eq!(cache.lookup("auto", "vi", "A"), None);
        assert_eq!(cache.lookup("auto", "vi", "B").as_deref(), Some("b-vi"));
        assert_eq!(cache.lookup("auto", "vi", "C").as_deref(), Some("c-vi"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lookup_promotes_entry() {
        let cache = TranslationCache::new(2);
        cache.record("auto", "vi", "A", "a-vi");
        cache.record("auto", "vi", "B", "b-vi");

        // Touch A so B becomes the eviction candidate
        assert!(cache.lookup("auto", "vi", "A").is_some());
        cache.record("auto", "vi", "C", "c-vi");

        assert_eq!(cache.lookup("auto", "vi", "B"), None);
        assert!(cache.lookup("auto", "vi", "A").is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = TranslationCache::new(2);
        cache.record("auto", "vi", "A", "first");
        cache.record("auto", "vi", "B", "b-vi");
        cache.record("auto", "vi", "A", "second");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup("auto", "vi", "A").as_deref(), Some("second"));
        assert!(cache.lookup("auto", "vi", "B").is_some());
    }

    #[test]
    fn test_key_is_case_folded() {
        let cache = TranslationCache::new(4);
        cache.record("auto", "vi", "Hello World", "Xin chào");

        assert_eq!(cache.lookup("auto", "vi", "hello world").as_deref(), Some("Xin chào"));
        assert_eq!(cache.lookup("auto", "vi", "HELLO WORLD").as_deref(), Some("Xin chào"));
        // No trimming is applied
        assert_eq!(cache.lookup("auto", "vi", " hello world"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_language_pair_is_part_of_key() {
        let cache = TranslationCache::new(4);
        cache.record("auto", "vi", "hello", "xin chào");
        cache.record("auto", "fr", "hello", "bonjour");

        assert_eq!(cache.lookup("auto", "vi", "hello").as_deref(), Some("xin chào"));
        assert_eq!(cache.lookup("auto", "fr", "hello").as_deref(), Some("bonjour"));
        assert_eq!(cache.lookup("en", "vi", "hello"), None);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let cache = TranslationCache::new(DEFAULT_CAPACITY);
        for i in 0..1000 {
            cache.record("auto", "vi", &format!("text {}", i), format!("t {}", i));
            if i % 3 == 0 {
                cache.lookup("auto", "vi", &format!("text {}", i / 2));
            }
            assert!(cache.len() <= DEFAULT_CAPACITY);
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        assert!(cache.lookup("auto", "vi", "text 999").is_some());
    }

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let cache = TranslationCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.record("auto", "vi", "a", "1");
        cache.record("auto", "vi", "b", "2");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("auto", "vi", "b").as_deref(), Some("2"));
    }

    #[test]
    fn test_fallback_marker_survives_lookup() {
        let cache = TranslationCache::new(4);
        cache.record_fallback("auto", "vi", "Hello");
        cache.record("auto", "vi", "Bye", "Tạm biệt");

        let failed = cache.lookup_entry("auto", "vi", "hello").unwrap();
        assert!(failed.fallback);
        assert_eq!(failed.text, "Hello");
        assert!(!cache.lookup_entry("auto", "vi", "Bye").unwrap().fallback);

        // A later success overwrites the marker
        cache.record("auto", "vi", "Hello", "Xin chào");
        assert_eq!(
            cache.lookup_entry("auto", "vi", "Hello"),
            Some(CachedTranslation { text: "Xin chào".to_string(), fallback: false })
        );
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = TranslationCache::new(4);
        cache.record("auto", "vi", "a", "1");
        cache.lookup("auto", "vi", "a");
        cache.lookup("auto", "vi", "missing");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
