//! Document Translation Routes
//!
//! Endpoints:
//! - POST /translate-docx - Word documents
//! - POST /translate-pptx - Slide decks
//! - POST /translate-txt - Plain text
//! - POST /translate-document - Any of the above, detected from the upload
//! - POST /translate-pdf - PDF text, JSON only
//!
//! The container endpoints answer with the translated file as an attachment
//! (`output=file`, the default) or with the extracted and translated texts
//! (`output=json`).

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::document::{self, DocumentFormat, PipelineReport};
use crate::error::{AppError, Result};
use crate::routes::upload::{UploadForm, UploadedFile};
use crate::state::AppState;

/// Create the document translation router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/translate-docx", post(translate_docx))
        .route("/translate-pptx", post(translate_pptx))
        .route("/translate-txt", post(translate_txt))
        .route("/translate-document", post(translate_any))
        .route("/translate-pdf", post(translate_pdf))
}

#[derive(Debug, Serialize)]
pub struct DocumentJsonResponse {
    pub format: DocumentFormat,
    pub original: Vec<String>,
    pub translated: Vec<String>,
    pub fragments: usize,
    pub fallbacks: usize,
}

#[derive(Debug, Serialize)]
pub struct PdfResponse {
    pub original: String,
    pub translated: String,
    pub fallbacks: usize,
}

/// Requested response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    File,
    Json,
}

impl OutputMode {
    fn from_form(form: &UploadForm) -> Result<Self> {
        match form.field("output").map(str::to_ascii_lowercase).as_deref() {
            None | Some("file") => Ok(Self::File),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(AppError::BadRequest(format!(
                "Unknown output '{}', expected 'file' or 'json'",
                other
            ))),
        }
    }
}

fn detect(file: &UploadedFile) -> Option<DocumentFormat> {
    DocumentFormat::detect(file.file_name.as_deref(), file.content_type.as_deref())
}

/// Reject uploads whose detected format differs from the endpoint's
fn ensure_format(file: &UploadedFile, expected: DocumentFormat) -> Result<()> {
    match detect(file) {
        Some(format) if format == expected => Ok(()),
        Some(other) => Err(AppError::UnsupportedFormat(format!(
            "Expected a .{} file, got .{}",
            expected.extension(),
            other.extension()
        ))),
        None => Err(AppError::UnsupportedFormat(format!(
            "Expected a .{} file",
            expected.extension()
        ))),
    }
}

/// POST /translate-docx
async fn translate_docx(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    translate_container(state, multipart, Some(DocumentFormat::Docx)).await
}

/// POST /translate-pptx
async fn translate_pptx(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    translate_container(state, multipart, Some(DocumentFormat::Pptx)).await
}

/// POST /translate-txt
async fn translate_txt(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    translate_container(state, multipart, Some(DocumentFormat::Text)).await
}

/// POST /translate-document
async fn translate_any(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    translate_container(state, multipart, None).await
}

async fn translate_container(
    state: AppState,
    multipart: Multipart,
    expected: Option<DocumentFormat>,
) -> Result<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;
    let output = OutputMode::from_form(&form)?;
    let target = form.lang(state.default_target());

    let format = match expected {
        Some(format) => {
            ensure_format(&file, format)?;
            format
        }
        None => detect(&file)
            .ok_or_else(|| AppError::UnsupportedFormat("Unrecognized document type".to_string()))?,
    };

    let mut doc = document::open_document(format, &file.data, state.config().server.max_expanded_bytes)?;
    let report = document::translate_document(doc.as_mut(), state.translator(), &target).await?;

    tracing::info!(
        format = ?format,
        fragments = report.fragments,
        fallbacks = report.fallbacks,
        target = %target,
        "Translated document"
    );

    match output {
        OutputMode::Json => Ok(Json(json_response(format, report)).into_response()),
        OutputMode::File => {
            let bytes = doc.to_bytes()?;
            let name = file.display_name(&format!("document.{}", format.extension()));
            attachment(bytes, format.mime_type(), &format!("translated_{}", name))
        }
    }
}

fn json_response(format: DocumentFormat, report: PipelineReport) -> DocumentJsonResponse {
    DocumentJsonResponse {
        format,
        fragments: report.fragments,
        fallbacks: report.fallbacks,
        original: report.original,
        translated: report.translated,
    }
}

/// Binary download response
pub(crate) fn attachment(bytes: Vec<u8>, content_type: &str, file_name: &str) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// POST /translate-pdf
async fn translate_pdf(State(state): State<AppState>, multipart: Multipart) -> Result<Json<PdfResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;
    ensure_format(&file, DocumentFormat::Pdf)?;
    let target = form.lang(state.default_target());

    let data = file.data.clone();
    let original = tokio::task::spawn_blocking(move || document::pdf::extract_text(&data))
        .await
        .map_err(|e| AppError::Internal(format!("PDF extraction task failed: {}", e)))??;

    // Translate line by line so the layout of the extracted text survives;
    // blank lines stay where they are and never reach the provider
    let mut lines: Vec<String> = original.lines().map(|line| line.trim().to_string()).collect();
    let filled: Vec<usize> = (0..lines.len()).filter(|&i| !lines[i].is_empty()).collect();
    let texts: Vec<String> = filled.iter().map(|&i| lines[i].clone()).collect();

    let outcomes = state.translator().translate_batch(&texts, &target).await;
    let fallbacks = outcomes.iter().filter(|o| o.is_fallback()).count();
    for (index, outcome) in filled.into_iter().zip(outcomes) {
        lines[index] = outcome.into_text();
    }
    let translated = lines.join("\n");

    Ok(Json(PdfResponse {
        original,
        translated,
        fallbacks,
    }))
}
