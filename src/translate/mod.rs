//! Translation Module
//!
//! Wraps a translation provider with the bounded cache and the batch path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexis_server::translate::{Translator, TranslationCache, BatchOptions};
//!
//! let translator = Translator::new(provider, TranslationCache::new(200), BatchOptions::default());
//!
//! // Single text, cached
//! let outcome = translator.translate_one("Hello", "auto", "vi").await;
//!
//! // Many fragments, one provider round-trip when possible
//! let outcomes = translator.translate_batch(&fragments, "vi").await;
//! ```

mod batch;
mod cache;
mod provider;

pub use batch::{chunk_ranges, split_batch, BatchOptions, DEFAULT_MAX_BATCH_CHARS, DEFAULT_SEPARATOR};
pub use cache::{CacheKey, CacheStats, CachedTranslation, TranslationCache, DEFAULT_CAPACITY};
pub use provider::{
    parse_gtx_response, GoogleTranslateProvider, TranslateError, TranslationProvider,
    GOOGLE_TRANSLATE_ENDPOINT,
};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Source language code meaning "let the provider detect it"
pub const AUTO_DETECT: &str = "auto";

/// Reason reported when a recorded failure is served from the cache
pub const CACHED_FALLBACK_REASON: &str = "cached fallback";

/// Result of translating one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// Provider produced a translation (or a cached one was reused)
    Translated(String),
    /// Provider failed; the original text is kept
    Fallback { original: String, reason: String },
}

impl FragmentOutcome {
    /// Text to write back in place of the source
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Translated(text) => text,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

impl From<CachedTranslation> for FragmentOutcome {
    fn from(entry: CachedTranslation) -> Self {
        if entry.fallback {
            Self::Fallback {
                original: entry.text,
                reason: CACHED_FALLBACK_REASON.to_string(),
            }
        } else {
            Self::Translated(entry.text)
        }
    }
}

/// Call the provider once, turning any failure into a fallback
pub(crate) async fn translate_direct(
    provider: &dyn TranslationProvider,
    text: &str,
    source: &str,
    target: &str,
) -> FragmentOutcome {
    if text.trim().is_empty() {
        return FragmentOutcome::Translated(text.to_string());
    }

    match provider.translate(text, source, target).await {
        Ok(translated) => FragmentOutcome::Translated(translated),
        Err(e) => {
            tracing::warn!(
                provider = provider.name(),
                target = %target,
                chars = text.chars().count(),
                error = %e,
                "Translation failed, keeping original text"
            );
            FragmentOutcome::Fallback {
                original: text.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Shared translation service
#[derive(Clone)]
pub struct Translator {
    inner: Arc<TranslatorInner>,
}

struct TranslatorInner {
    provider: Arc<dyn TranslationProvider>,
    cache: TranslationCache,
    batch: BatchOptions,
    /// One gate per key currently being translated
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl Translator {
    pub fn new(provider: Arc<dyn TranslationProvider>, cache: TranslationCache, batch: BatchOptions) -> Self {
        Self {
            inner: Arc::new(TranslatorInner {
                provider,
                cache,
                batch,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.inner.cache
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.provider.name()
    }

    /// Translate a single text through the cache.
    ///
    /// The lookup, provider call and record for one key run under that key's
    /// gate, so concurrent requests for the same text wait for the first one
    /// instead of calling the provider again. Failures are recorded too and
    /// come back from the cache as fallbacks.
    pub async fn translate_one(&self, text: &str, source: &str, target: &str) -> FragmentOutcome {
        if text.trim().is_empty() {
            return FragmentOutcome::Translated(text.to_string());
        }

        let cache = &self.inner.cache;
        if let Some(hit) = cache.lookup_entry(source, target, text) {
            return hit.into();
        }

        let gate = self.acquire_gate(CacheKey::new(source, target, text));
        let _guard = gate.lock.lock().await;

        // Another request may have finished while we waited
        if let Some(hit) = cache.lookup_entry(source, target, text) {
            return hit.into();
        }

        let outcome = translate_direct(self.inner.provider.as_ref(), text, source, target).await;
        match &outcome {
            FragmentOutcome::Translated(translated) => cache.record(source, target, text, translated.as_str()),
            FragmentOutcome::Fallback { .. } => cache.record_fallback(source, target, text),
        }
        outcome
    }

    /// Translate many fragments with auto-detected source, in order.
    ///
    /// Always returns one outcome per input. The cache is not consulted.
    pub async fn translate_batch(&self, texts: &[String], target: &str) -> Vec<FragmentOutcome> {
        batch::translate_batch(self.inner.provider.as_ref(), &self.inner.batch, texts, AUTO_DETECT, target).await
    }

    fn acquire_gate(&self, key: CacheKey) -> InFlightGate<'_> {
        let lock = self
            .inner
            .in_flight
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        InFlightGate {
            in_flight: &self.inner.in_flight,
            key,
            lock,
        }
    }
}

/// Handle on one key's gate; leaves the map clean when dropped, including
/// when the request future is cancelled mid-translation
struct InFlightGate<'a> {
    in_flight: &'a Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    key: CacheKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlightGate<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        // The map and this handle are the only owners: nobody else is waiting
        if Arc::strong_count(&self.lock) <= 2 {
            in_flight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TranslationProvider for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(TranslateError::Status { status: 503, body: "down".to_string() });
            }
            Ok(format!("[{}] {}", target, text))
        }
    }

    fn translator(fail: bool) -> (Arc<Counting>, Translator) {
        let provider = Arc::new(Counting { calls: AtomicUsize::new(0), fail });
        let translator = Translator::new(provider.clone(), TranslationCache::new(8), BatchOptions::default());
        (provider, translator)
    }

    #[tokio::test]
    async fn test_translate_one_uses_cache() {
        let (provider, translator) = translator(false);

        let first = translator.translate_one("Hello", AUTO_DETECT, "vi").await;
        let second = translator.translate_one("hello", AUTO_DETECT, "vi").await;

        assert_eq!(first, FragmentOutcome::Translated("[vi] Hello".to_string()));
        assert_eq!(second.text(), "[vi] Hello");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let (provider, translator) = translator(true);

        let outcome = translator.translate_one("Hello", AUTO_DETECT, "vi").await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.text(), "Hello");

        // The failure is cached for the key and still reported as one
        assert_eq!(translator.cache().lookup(AUTO_DETECT, "vi", "Hello").as_deref(), Some("Hello"));
        let again = translator.translate_one("Hello", AUTO_DETECT, "vi").await;
        assert_eq!(
            again,
            FragmentOutcome::Fallback {
                original: "Hello".to_string(),
                reason: CACHED_FALLBACK_REASON.to_string(),
            }
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_text_is_not_sent() {
        let (provider, translator) = translator(false);
        let outcome = translator.translate_one("  \n", AUTO_DETECT, "vi").await;

        assert_eq!(outcome.text(), "  \n");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(translator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_same_key_calls_provider_once() {
        let (provider, translator) = translator(false);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let translator = translator.clone();
                tokio::spawn(async move { translator.translate_one("Same text", AUTO_DETECT, "vi").await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().text(), "[vi] Same text");
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(translator.inner.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_request_releases_gate() {
        let (provider, translator) = translator(false);

        // The provider sleeps longer than this, so the future is dropped mid-call
        let cancelled = tokio::time::timeout(
            Duration::from_millis(5),
            translator.translate_one("Abandoned", AUTO_DETECT, "vi"),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(translator.inner.in_flight.lock().is_empty());
        assert!(translator.cache().is_empty());

        // The key is usable again afterwards
        let outcome = translator.translate_one("Abandoned", AUTO_DETECT, "vi").await;
        assert_eq!(outcome.text(), "[vi] Abandoned");
        assert!(translator.inner.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_batch_bypasses_cache() {
        let (_provider, translator) = translator(false);
        let texts = vec!["a".to_string(), "b".to_string()];

        let outcomes = translator.translate_batch(&texts, "vi").await;
        assert_eq!(outcomes.len(), 2);
        assert!(translator.cache().is_empty());
    }
}
