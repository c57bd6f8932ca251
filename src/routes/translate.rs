//! Text Translation Routes
//!
//! Endpoints:
//! - POST /translate-text - Translate one text through the cache
//! - POST /translate-batch - Translate many texts in one provider round-trip

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::translate::AUTO_DETECT;

/// Create the text translation router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/translate-text", post(translate_text))
        .route("/translate-batch", post(translate_batch))
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub original: String,
    pub translated: String,
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub translations: Vec<String>,
    pub fallbacks: usize,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /translate-text
async fn translate_text(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<TextResponse>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Text is empty".to_string()));
    }

    let target = non_empty(request.lang).unwrap_or_else(|| state.default_target().to_string());
    let source = non_empty(request.source).unwrap_or_else(|| AUTO_DETECT.to_string());

    let outcome = state.translator().translate_one(text, &source, &target).await;

    Ok(Json(TextResponse {
        original: text.to_string(),
        fallback: outcome.is_fallback(),
        translated: outcome.into_text(),
    }))
}

/// POST /translate-batch
async fn translate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    if request.texts.iter().all(|text| text.trim().is_empty()) {
        return Err(AppError::BadRequest("No texts to translate".to_string()));
    }

    let target = non_empty(request.lang).unwrap_or_else(|| state.default_target().to_string());
    let outcomes = state.translator().translate_batch(&request.texts, &target).await;

    let fallbacks = outcomes.iter().filter(|o| o.is_fallback()).count();
    Ok(Json(BatchResponse {
        translations: outcomes.into_iter().map(|o| o.into_text()).collect(),
        fallbacks,
    }))
}
