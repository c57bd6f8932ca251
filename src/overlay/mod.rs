//! Image text overlay
//!
//! OCR → per-detection translation → region blur → redraw.
//!
//! Each detection is translated on its own through the cached single-text
//! path; regions are independent, so there is no batching here. Rendering
//! is CPU-bound and runs on the blocking pool.

mod blur;
mod builtin_font;
mod font;

pub use blur::{blur_regions, region_mask};
pub use font::OverlayFont;

use std::io::Cursor;
use std::sync::Arc;

use futures::future::join_all;
use image::{ColorType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ocr::{filter_detections, Detection, OcrError, OcrProvider, Region};
use crate::translate::{Translator, AUTO_DETECT};

/// Overlay error types
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Per-request overlay settings
#[derive(Debug, Clone, Copy)]
pub struct OverlayOptions {
    pub font_size: f32,
    pub blur_sigma: f32,
    pub min_confidence: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            blur_sigma: 12.0,
            min_confidence: crate::ocr::DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// One translated detection, in discovery order
#[derive(Debug, Clone, Serialize)]
pub struct DetectionRecord {
    pub original: String,
    pub translated: String,
    pub confidence: f32,
    pub region: Region,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// Rendered overlay
#[derive(Debug, Clone)]
pub struct OverlayOutput {
    /// Encoded image bytes
    pub image: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<DetectionRecord>,
}

impl OverlayOutput {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Check the bytes look like an image we can decode
pub fn sniff_format(data: &[u8]) -> Result<ImageFormat, OverlayError> {
    image::guess_format(data).map_err(|e| OverlayError::Decode(e.to_string()))
}

/// Detect, translate and redraw the text of an image
pub async fn translate_image(
    data: Vec<u8>,
    ocr: &dyn OcrProvider,
    translator: &Translator,
    font: Arc<OverlayFont>,
    options: OverlayOptions,
    target: &str,
) -> Result<OverlayOutput, OverlayError> {
    sniff_format(&data)?;

    let detections = filter_detections(ocr.detect(&data).await?, options.min_confidence);
    debug!(detections = detections.len(), target = %target, "Translating image detections");

    let outcomes = join_all(
        detections
            .iter()
            .map(|d| translator.translate_one(&d.text, AUTO_DETECT, target)),
    )
    .await;

    let records: Vec<DetectionRecord> = detections
        .into_iter()
        .zip(outcomes)
        .map(|(detection, outcome)| DetectionRecord {
            fallback: outcome.is_fallback(),
            translated: outcome.into_text(),
            original: detection.text,
            confidence: detection.confidence,
            region: detection.region,
        })
        .collect();

    tokio::task::spawn_blocking(move || render_overlay(&data, records, &font, &options))
        .await
        .map_err(|e| OverlayError::Encode(format!("render task failed: {}", e)))?
}

/// Blur every record's region and draw its translation at the region's
/// top-left corner. Output keeps the input's dimensions and colour type.
pub fn render_overlay(
    data: &[u8],
    records: Vec<DetectionRecord>,
    font: &OverlayFont,
    options: &OverlayOptions,
) -> Result<OverlayOutput, OverlayError> {
    let format = sniff_format(data)?;
    let decoded = image::load_from_memory_with_format(data, format)
        .map_err(|e| OverlayError::Decode(e.to_string()))?;
    let color = decoded.color();
    let (width, height) = (decoded.width(), decoded.height());

    let mut canvas = decoded.to_rgba8();
    let regions: Vec<Region> = records.iter().map(|r| r.region).collect();
    // Pick ink colours before the text underneath is blurred away
    let inks: Vec<Rgba<u8>> = regions.iter().map(|region| ink_for(&canvas, region)).collect();

    blur_regions(&mut canvas, &regions, options.blur_sigma);

    for (record, ink) in records.iter().zip(inks) {
        let anchor = record.region.top_left();
        font.draw(
            &mut canvas,
            ink,
            anchor.x.round() as i32,
            anchor.y.round() as i32,
            options.font_size,
            &record.translated,
        );
    }

    let output = restore_color(canvas, color);
    let (image, format) = encode(&output, format)?;

    Ok(OverlayOutput {
        image,
        format,
        width,
        height,
        detections: records,
    })
}

/// Black on light backgrounds, white on dark ones
fn ink_for(canvas: &RgbaImage, region: &Region) -> Rgba<u8> {
    let (min_x, min_y, max_x, max_y) = region.bounds();
    let clamp = |v: f32, max: u32| (v.max(0.0) as u32).min(max.saturating_sub(1));
    let (x0, x1) = (clamp(min_x, canvas.width()), clamp(max_x, canvas.width()));
    let (y0, y1) = (clamp(min_y, canvas.height()), clamp(max_y, canvas.height()));

    let mut total = 0u64;
    let mut count = 0u64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let [r, g, b, _] = canvas.get_pixel(x, y).0;
            total += (299 * r as u64 + 587 * g as u64 + 114 * b as u64) / 1000;
            count += 1;
        }
    }

    if count == 0 || total / count > 128 {
        Rgba([0, 0, 0, 255])
    } else {
        Rgba([255, 255, 255, 255])
    }
}

fn restore_color(canvas: RgbaImage, color: ColorType) -> DynamicImage {
    let image = DynamicImage::ImageRgba8(canvas);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        _ => image,
    }
}

/// Encode in `format`, or PNG when that format cannot be written
fn encode(image: &DynamicImage, format: ImageFormat) -> Result<(Vec<u8>, ImageFormat), OverlayError> {
    let mut output = Vec::new();
    match image.write_to(&mut Cursor::new(&mut output), format) {
        Ok(()) => Ok((output, format)),
        Err(e) => {
            warn!(format = ?format, error = %e, "Cannot re-encode in input format, using PNG");
            let mut output = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
                .map_err(|e| OverlayError::Encode(e.to_string()))?;
            Ok((output, ImageFormat::Png))
        }
    }
}
