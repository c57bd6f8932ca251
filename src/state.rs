//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{build_provider, OcrProvider};
use crate::overlay::{OverlayFont, OverlayOptions};
use crate::translate::{
    BatchOptions, GoogleTranslateProvider, TranslateError, TranslationCache, TranslationProvider, Translator,
};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize translation provider: {0}")]
    TranslationProvider(#[from] TranslateError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    translator: Translator,
    ocr: Arc<dyn OcrProvider>,
    font: Arc<OverlayFont>,
}

impl AppState {
    /// Create the state with the providers named in `config`.
    ///
    /// Overlay fonts are resolved here, once per process.
    pub fn new(config: Config) -> Result<Self, StateError> {
        let provider = GoogleTranslateProvider::new(&config.translation.endpoint, config.translation.timeout())?;
        let ocr = build_provider(config.ocr.provider, &config.ocr.languages);
        let font = OverlayFont::resolve(&config.overlay.fonts);
        Ok(Self::with_providers(config, Arc::new(provider), ocr, font))
    }

    /// Create the state around explicit providers
    pub fn with_providers(
        config: Config,
        provider: Arc<dyn TranslationProvider>,
        ocr: Arc<dyn OcrProvider>,
        font: OverlayFont,
    ) -> Self {
        let batch = BatchOptions {
            separator: config.translation.batch_separator.clone(),
            max_chars: config.translation.batch_max_chars,
        };
        let translator = Translator::new(provider, TranslationCache::new(config.translation.cache_capacity), batch);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                translator,
                ocr,
                font: Arc::new(font),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the cached translation service
    pub fn translator(&self) -> &Translator {
        &self.inner.translator
    }

    /// Get the OCR provider
    pub fn ocr(&self) -> &dyn OcrProvider {
        self.inner.ocr.as_ref()
    }

    /// Get the overlay font resolved at start-up
    pub fn font(&self) -> Arc<OverlayFont> {
        Arc::clone(&self.inner.font)
    }

    /// Target language when a request names none
    pub fn default_target(&self) -> &str {
        &self.inner.config.translation.default_target
    }

    /// Overlay options, with an optional per-request font size
    pub fn overlay_options(&self, font_size: Option<f32>) -> OverlayOptions {
        let overlay = &self.inner.config.overlay;
        OverlayOptions {
            font_size: font_size.filter(|size| *size > 0.0).unwrap_or(overlay.font_size),
            blur_sigma: overlay.blur_sigma,
            min_confidence: self.inner.config.ocr.min_confidence,
        }
    }
}
