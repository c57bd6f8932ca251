//! OCR Module
//!
//! Text detection for uploaded images.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lexis_server::ocr::{build_provider, filter_detections, OcrBackend};
//!
//! let ocr = build_provider(OcrBackend::Tesseract, "eng+vie");
//! let detections = filter_detections(ocr.detect(&bytes).await?, 0.25);
//! ```

mod provider;
mod types;

pub use provider::{parse_tsv, DisabledOcr, OcrProvider, TesseractProvider};
pub use types::{Detection, OcrBackend, OcrError, Point, Region};

#[cfg(test)]
pub(crate) use provider::MockOcr;

use std::sync::Arc;

/// Detections at or below this confidence are discarded
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;

/// Instantiate the configured backend
pub fn build_provider(backend: OcrBackend, languages: &str) -> Arc<dyn OcrProvider> {
    match backend {
        OcrBackend::Tesseract => Arc::new(TesseractProvider::new(languages)),
        OcrBackend::None => Arc::new(DisabledOcr),
    }
}

/// Keep detections with confidence strictly above `threshold` and some text,
/// preserving order
pub fn filter_detections(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    let total = detections.len();
    let kept: Vec<Detection> = detections
        .into_iter()
        .filter(|d| d.confidence > threshold && !d.text.trim().is_empty())
        .collect();

    if kept.len() < total {
        tracing::debug!(
            total,
            kept = kept.len(),
            threshold,
            "Discarded low-confidence detections"
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(text: &str, confidence: f32) -> Detection {
        Detection {
            region: Region::from_rect(0.0, 0.0, 10.0, 10.0),
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let kept = filter_detections(
            vec![
                detection("low", 0.1),
                detection("edge", 0.25),
                detection("just above", 0.2501),
                detection("high", 0.9),
                detection("   ", 0.9),
            ],
            DEFAULT_MIN_CONFIDENCE,
        );

        let texts: Vec<&str> = kept.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["just above", "high"]);
    }

    #[test]
    fn test_build_provider_names() {
        assert_eq!(build_provider(OcrBackend::Tesseract, "eng").name(), "tesseract");
        assert_eq!(build_provider(OcrBackend::None, "eng").name(), "none");
    }
}
