//! Index and health endpoints

use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::translate::CacheStats;

/// Create the index/health router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    translator: &'static str,
    ocr: &'static str,
    font: String,
    cache: CacheStats,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        translator: state.translator().provider_name(),
        ocr: state.ocr().name(),
        font: state.font().name(),
        cache: state.translator().cache().stats(),
    })
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Service status and cache statistics"),
    ("POST", "/translate-text", "JSON {text, lang?, source?}"),
    ("POST", "/translate-batch", "JSON {texts, lang?}"),
    ("POST", "/translate-image", "multipart file, lang"),
    ("POST", "/translate-image/overlay", "multipart file, lang, font_size?"),
    ("POST", "/translate-image/capture", "JSON {image, lang?, font_size?}"),
    ("POST", "/translate-docx", "multipart file, lang, output=file|json"),
    ("POST", "/translate-pptx", "multipart file, lang, output=file|json"),
    ("POST", "/translate-txt", "multipart file, lang, output=file|json"),
    ("POST", "/translate-document", "multipart file, lang, output=file|json"),
    ("POST", "/translate-pdf", "multipart file, lang"),
    ("POST", "/export-pdf", "JSON {text}"),
];

async fn index() -> Html<String> {
    let rows: String = ENDPOINTS
        .iter()
        .map(|(method, path, body)| {
            format!("<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>", method, path, body)
        })
        .collect();

    Html(format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Lexis</title></head>\
         <body><h1>Lexis v{}</h1><table>{}</table></body></html>",
        env!("CARGO_PKG_VERSION"),
        rows
    ))
}
