//! Image Translation Routes
//!
//! Endpoints:
//! - POST /translate-image - OCR text and its translation
//! - POST /translate-image/overlay - Translated text drawn over the image
//! - POST /translate-image/capture - Overlay for a base64/data-URL capture

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::ocr::filter_detections;
use crate::overlay::{self, DetectionRecord, OverlayOutput};
use crate::routes::upload::UploadForm;
use crate::state::AppState;
use crate::translate::AUTO_DETECT;

/// Create the image translation router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/translate-image", post(translate_image_text))
        .route("/translate-image/overlay", post(translate_image_overlay))
        .route("/translate-image/capture", post(translate_capture))
}

#[derive(Debug, Serialize)]
pub struct ImageTextResponse {
    pub original: String,
    pub translated: String,
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct OverlayResponse {
    /// Base64-encoded image
    pub image: String,
    pub format: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<DetectionRecord>,
}

impl From<OverlayOutput> for OverlayResponse {
    fn from(output: OverlayOutput) -> Self {
        OverlayResponse {
            image: base64::engine::general_purpose::STANDARD.encode(&output.image),
            format: output
                .format
                .extensions_str()
                .first()
                .copied()
                .unwrap_or("png")
                .to_string(),
            mime_type: output.mime_type().to_string(),
            width: output.width,
            height: output.height,
            detections: output.detections,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    /// `data:image/...;base64,...` URL or bare base64
    pub image: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub font_size: Option<f32>,
}

/// Decode a data URL or bare base64 payload
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::BadRequest("Malformed data URL".to_string()))?,
        None => payload,
    };

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }

    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 image: {}", e)))
}

/// POST /translate-image
async fn translate_image_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImageTextResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;
    let target = form.lang(state.default_target());

    overlay::sniff_format(&file.data)?;
    let detections = filter_detections(
        state.ocr().detect(&file.data).await?,
        state.config().ocr.min_confidence,
    );

    let original = detections
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if original.is_empty() {
        return Ok(Json(ImageTextResponse {
            original,
            translated: String::new(),
            fallback: false,
        }));
    }

    let outcome = state.translator().translate_one(&original, AUTO_DETECT, &target).await;
    Ok(Json(ImageTextResponse {
        original,
        fallback: outcome.is_fallback(),
        translated: outcome.into_text(),
    }))
}

/// POST /translate-image/overlay
async fn translate_image_overlay(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OverlayResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;
    let target = form.lang(state.default_target());
    let options = state.overlay_options(form.number("font_size")?);

    let output = overlay::translate_image(
        file.data.to_vec(),
        state.ocr(),
        state.translator(),
        state.font(),
        options,
        &target,
    )
    .await?;

    tracing::info!(
        detections = output.detections.len(),
        width = output.width,
        height = output.height,
        target = %target,
        "Rendered image overlay"
    );

    Ok(Json(output.into()))
}

/// POST /translate-image/capture
async fn translate_capture(
    State(state): State<AppState>,
    Json(request): Json<CaptureRequest>,
) -> Result<Json<OverlayResponse>> {
    let data = decode_image_payload(&request.image)?;
    let target = request
        .lang
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| state.default_target().to_string());
    let options = state.overlay_options(request.font_size);

    let output = overlay::translate_image(data, state.ocr(), state.translator(), state.font(), options, &target).await?;

    Ok(Json(output.into()))
}
