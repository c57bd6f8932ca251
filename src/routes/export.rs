//! Export Routes
//!
//! Endpoints:
//! - POST /export-pdf - Render translated text as a downloadable PDF

use axum::{extract::State, response::Response, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::export::render_text_pdf;
use crate::routes::documents::attachment;
use crate::state::AppState;

/// Create the export router
pub fn router() -> Router<AppState> {
    Router::new().route("/export-pdf", post(export_pdf))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub text: String,
}

/// POST /export-pdf
async fn export_pdf(State(_state): State<AppState>, Json(request): Json<ExportRequest>) -> Result<Response> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is empty".to_string()));
    }

    let pdf = render_text_pdf(&request.text)?;
    tracing::debug!("Exported {} bytes of PDF", pdf.len());

    attachment(pdf, "application/pdf", "translated.pdf")
}
