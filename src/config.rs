//! Configuration management for Lexis Server

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::ocr::{OcrBackend, DEFAULT_MIN_CONFIDENCE};
use crate::translate::{DEFAULT_CAPACITY, DEFAULT_MAX_BATCH_CHARS, DEFAULT_SEPARATOR, GOOGLE_TRANSLATE_ENDPOINT};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub translation: TranslationConfig,
    pub ocr: OcrConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Ceiling on the decompressed size of an uploaded DOCX/PPTX
    pub max_expanded_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub default_target: String,
    pub cache_capacity: usize,
    pub batch_separator: String,
    pub batch_max_chars: usize,
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub provider: OcrBackend,
    pub languages: String,
    pub min_confidence: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    pub font_size: f32,
    /// Candidate font files, most preferred first
    pub fonts: Vec<PathBuf>,
    pub blur_sigma: f32,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
/// Default expansion allowed for compressed office packages, relative to the upload limit
const EXPANSION_FACTOR: u64 = 10;

const DEFAULT_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 10000,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                max_expanded_bytes: DEFAULT_MAX_UPLOAD_BYTES as u64 * EXPANSION_FACTOR,
            },
            translation: TranslationConfig {
                endpoint: GOOGLE_TRANSLATE_ENDPOINT.to_string(),
                timeout_secs: 15,
                default_target: "vi".to_string(),
                cache_capacity: DEFAULT_CAPACITY,
                batch_separator: DEFAULT_SEPARATOR.to_string(),
                batch_max_chars: DEFAULT_MAX_BATCH_CHARS,
            },
            ocr: OcrConfig {
                provider: OcrBackend::Tesseract,
                languages: "eng+vie".to_string(),
                min_confidence: DEFAULT_MIN_CONFIDENCE,
            },
            overlay: OverlayConfig {
                font_size: 20.0,
                fonts: DEFAULT_FONTS.iter().map(PathBuf::from).collect(),
                blur_sigma: 12.0,
            },
        }
    }
}

/// Parse an environment variable, keeping `default` when unset or invalid
fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Invalid {}={:?} ({}), using default", key, raw, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn string_var(key: &str, default: String) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let fonts = env::var("OVERLAY_FONTS")
            .ok()
            .map(|raw| {
                raw.split(':')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect::<Vec<_>>()
            })
            .filter(|fonts| !fonts.is_empty())
            .unwrap_or(defaults.overlay.fonts);

        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes);

        let mut config = Config {
            server: ServerConfig {
                host: string_var("SERVER_HOST", defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port),
                max_upload_bytes,
                max_expanded_bytes: parse_var(
                    "MAX_EXPANDED_BYTES",
                    (max_upload_bytes as u64).saturating_mul(EXPANSION_FACTOR),
                ),
            },
            translation: TranslationConfig {
                endpoint: string_var("TRANSLATE_ENDPOINT", defaults.translation.endpoint),
                timeout_secs: parse_var("TRANSLATE_TIMEOUT_SECS", defaults.translation.timeout_secs),
                default_target: string_var("DEFAULT_TARGET_LANG", defaults.translation.default_target),
                cache_capacity: parse_var("TRANSLATION_CACHE_CAPACITY", defaults.translation.cache_capacity),
                // Whitespace is significant here, so no trimming
                batch_separator: env::var("BATCH_SEPARATOR")
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(defaults.translation.batch_separator),
                batch_max_chars: parse_var("BATCH_MAX_CHARS", defaults.translation.batch_max_chars),
            },
            ocr: OcrConfig {
                provider: parse_var("OCR_PROVIDER", defaults.ocr.provider),
                languages: string_var("OCR_LANGUAGES", defaults.ocr.languages),
                min_confidence: parse_var("OCR_MIN_CONFIDENCE", defaults.ocr.min_confidence),
            },
            overlay: OverlayConfig {
                font_size: parse_var("OVERLAY_FONT_SIZE", defaults.overlay.font_size),
                fonts,
                blur_sigma: parse_var("OVERLAY_BLUR_SIGMA", defaults.overlay.blur_sigma),
            },
        };

        config.sanitize();
        config
    }

    /// Replace out-of-range values with defaults
    fn sanitize(&mut self) {
        let defaults = Config::default();

        if self.server.max_expanded_bytes == 0 {
            tracing::warn!("MAX_EXPANDED_BYTES must be positive, using default");
            self.server.max_expanded_bytes = defaults.server.max_expanded_bytes;
        }
        if self.translation.cache_capacity == 0 {
            tracing::warn!("TRANSLATION_CACHE_CAPACITY must be positive, using default");
            self.translation.cache_capacity = defaults.translation.cache_capacity;
        }
        if !(0.0..=1.0).contains(&self.ocr.min_confidence) {
            tracing::warn!("OCR_MIN_CONFIDENCE must be within [0, 1], using default");
            self.ocr.min_confidence = defaults.ocr.min_confidence;
        }
        if !(self.overlay.font_size > 0.0) {
            tracing::warn!("OVERLAY_FONT_SIZE must be positive, using default");
            self.overlay.font_size = defaults.overlay.font_size;
        }
        if !(self.overlay.blur_sigma > 0.0) {
            tracing::warn!("OVERLAY_BLUR_SIGMA must be positive, using default");
            self.overlay.blur_sigma = defaults.overlay.blur_sigma;
        }
    }
}
