//! OCR Types
//!
//! Detections are the unit the image pipeline works on: a four-point region,
//! the recognized text and a confidence in `[0, 1]`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OCR backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Tesseract CLI (local)
    #[default]
    Tesseract,
    /// OCR disabled; image endpoints answer 503
    None,
}

impl FromStr for OcrBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "none" | "off" | "disabled" => Ok(Self::None),
            other => Err(format!("unknown OCR provider '{}'", other)),
        }
    }
}

/// Pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Quadrilateral region, clockwise from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub [Point; 4]);

impl Region {
    /// Axis-aligned rectangle
    pub fn from_rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        let (right, bottom) = (left + width, top + height);
        Self([
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    /// Anchor for redrawn text
    pub fn top_left(&self) -> Point {
        let (min_x, min_y, _, _) = self.bounds();
        Point::new(min_x, min_y)
    }

    /// `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.0.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }

    pub fn height(&self) -> f32 {
        let (_, min_y, _, max_y) = self.bounds();
        max_y - min_y
    }
}

/// One OCR result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub region: Region,
    pub text: String,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("Invalid image: {0}")]
    ImageDecode(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::ProviderNotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ImageDecode(_) => StatusCode::BAD_REQUEST,
            Self::ProcessingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
