//! Batch translation
//!
//! Fragments are joined with a separator token and sent as one provider call.
//! The reply is split on the same token; when the piece count does not match
//! what was submitted, the batch result is discarded and every fragment is
//! translated on its own. The per-fragment path is the correctness baseline,
//! the batch path only saves round-trips.

use std::ops::Range;

use super::provider::TranslationProvider;
use super::{translate_direct, FragmentOutcome};

/// Separator placed between fragments of a batch
pub const DEFAULT_SEPARATOR: &str = " ||| ";

/// Upper bound on the joined length of one batch request
pub const DEFAULT_MAX_BATCH_CHARS: usize = 4500;

/// Batch options
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub separator: String,
    pub max_chars: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            max_chars: DEFAULT_MAX_BATCH_CHARS,
        }
    }
}

impl BatchOptions {
    /// The separator without surrounding whitespace, used for splitting
    pub fn token(&self) -> &str {
        let token = self.separator.trim();
        if token.is_empty() {
            &self.separator
        } else {
            token
        }
    }
}

/// Split consecutive texts into chunks whose joined length fits `max_chars`.
/// A text longer than the limit forms its own chunk.
pub fn chunk_ranges(texts: &[String], separator_len: usize, max_chars: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut current = 0;

    for (i, text) in texts.iter().enumerate() {
        let len = text.chars().count();
        let added = if i == start { len } else { len + separator_len };

        if i > start && current + added > max_chars {
            ranges.push(start..i);
            start = i;
            current = len;
        } else {
            current += added;
        }
    }

    if start < texts.len() {
        ranges.push(start..texts.len());
    }

    ranges
}

/// Split a translated batch back into pieces.
///
/// Returns `None` unless exactly `expected` pieces come back.
pub fn split_batch(translated: &str, token: &str, expected: usize) -> Option<Vec<String>> {
    let pieces: Vec<String> = translated
        .split(token)
        .map(|piece| piece.trim().to_string())
        .collect();

    (pieces.len() == expected).then_some(pieces)
}

/// Translate `texts` in order, returning exactly one outcome per input
pub(crate) async fn translate_batch(
    provider: &dyn TranslationProvider,
    options: &BatchOptions,
    texts: &[String],
    source: &str,
    target: &str,
) -> Vec<FragmentOutcome> {
    let mut outcomes = Vec::with_capacity(texts.len());

    for range in chunk_ranges(texts, options.separator.chars().count(), options.max_chars) {
        let chunk = &texts[range];
        outcomes.extend(translate_chunk(provider, options, chunk, source, target).await);
    }

    outcomes
}

async fn translate_chunk(
    provider: &dyn TranslationProvider,
    options: &BatchOptions,
    chunk: &[String],
    source: &str,
    target: &str,
) -> Vec<FragmentOutcome> {
    if chunk.len() == 1 {
        return vec![translate_direct(provider, &chunk[0], source, target).await];
    }

    let token = options.token();
    if chunk.iter().any(|text| text.contains(token)) {
        tracing::debug!(fragments = chunk.len(), "Separator occurs in source text, skipping batch");
        return translate_each(provider, chunk, source, target).await;
    }

    let joined = chunk.join(&options.separator);
    match provider.translate(&joined, source, target).await {
        Ok(translated) => match split_batch(&translated, token, chunk.len()) {
            Some(pieces) => pieces.into_iter().map(FragmentOutcome::Translated).collect(),
            None => {
                tracing::warn!(
                    provider = provider.name(),
                    fragments = chunk.len(),
                    "Batch reply did not split into the submitted fragment count, translating individually"
                );
                translate_each(provider, chunk, source, target).await
            }
        },
        Err(e) => {
            tracing::warn!(
                provider = provider.name(),
                fragments = chunk.len(),
                error = %e,
                "Batch translation failed, translating individually"
            );
            translate_each(provider, chunk, source, target).await
        }
    }
}

async fn translate_each(
    provider: &dyn TranslationProvider,
    chunk: &[String],
    source: &str,
    target: &str,
) -> Vec<FragmentOutcome> {
    let mut outcomes = Vec::with_capacity(chunk.len());
    for text in chunk {
        outcomes.push(translate_direct(provider, text, source, target).await);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::provider::TranslateError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Uppercases text; can be told to mangle separators or fail
    struct Upper {
        calls: AtomicUsize,
        mangle_separator: bool,
        fail_batches: bool,
        fail_all: bool,
    }

    impl Upper {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                mangle_separator: false,
                fail_batches: false,
                fail_all: false,
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let is_batch = text.contains("|||");
            if self.fail_all || (self.fail_batches && is_batch) {
                return Err(TranslateError::EmptyTranslation);
            }
            if self.mangle_separator && is_batch {
                return Ok(text.replace("|||", "| | |").to_uppercase());
            }
            Ok(text.to_uppercase())
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_batch_requires_exact_count() {
        assert_eq!(
            split_batch("A ||| B |||C", "|||", 3),
            Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
        assert_eq!(split_batch("A ||| B", "|||", 3), None);
        assert_eq!(split_batch("A ||| B ||| C ||| D", "|||", 3), None);
    }

    #[test]
    fn test_chunk_ranges_respects_limit() {
        let items = texts(&["aaaa", "bbbb", "cccc", "dddddddddddd", "e"]);
        // separator length 2, limit 10: "aaaa..bbbb" = 10
        let ranges = chunk_ranges(&items, 2, 10);
        assert_eq!(ranges, vec![0..2, 2..3, 3..4, 4..5]);

        let covered: usize = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(covered, items.len());
        assert!(chunk_ranges(&[], 2, 10).is_empty());
    }

    #[tokio::test]
    async fn test_batch_uses_single_call() {
        let provider = Upper::new();
        let out = translate_batch(&provider, &BatchOptions::default(), &texts(&["one", "two", "three"]), "auto", "vi").await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let values: Vec<&str> = out.iter().map(|o| o.text()).collect();
        assert_eq!(values, vec!["ONE", "TWO", "THREE"]);
        assert!(out.iter().all(|o| !o.is_fallback()));
    }

    #[tokio::test]
    async fn test_mangled_separator_falls_back_per_fragment() {
        let provider = Upper { mangle_separator: true, ..Upper::new() };
        let out = translate_batch(&provider, &BatchOptions::default(), &texts(&["one", "two", "three"]), "auto", "vi").await;

        // one batch attempt + three individual calls
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].text(), "THREE");
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_per_fragment() {
        let provider = Upper { fail_batches: true, ..Upper::new() };
        let out = translate_batch(&provider, &BatchOptions::default(), &texts(&["one", "two"]), "auto", "vi").await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text(), "ONE");
        assert!(!out[1].is_fallback());
    }

    #[tokio::test]
    async fn test_total_failure_keeps_originals() {
        let provider = Upper { fail_all: true, ..Upper::new() };
        let out = translate_batch(&provider, &BatchOptions::default(), &texts(&["one", "two"]), "auto", "vi").await;

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| o.is_fallback()));
        assert_eq!(out[0].text(), "one");
        assert_eq!(out[1].text(), "two");
    }

    #[tokio::test]
    async fn test_separator_in_source_skips_batch() {
        let provider = Upper::new();
        let out = translate_batch(&provider, &BatchOptions::default(), &texts(&["a ||| b", "c"]), "auto", "vi").await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(out[0].text(), "A ||| B");
        assert_eq!(out[1].text(), "C");
    }
}
