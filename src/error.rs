//! Error types for the Lexis server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::export::ExportError;
use crate::ocr::OcrError;
use crate::overlay::OverlayError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Document error: {0}")]
    DocumentParse(String),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            DocumentError::InvalidContent(msg) => AppError::BadRequest(msg),
            other => AppError::DocumentParse(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<OverlayError> for AppError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::Decode(msg) => AppError::BadRequest(format!("Invalid image: {}", msg)),
            OverlayError::Encode(msg) => AppError::Internal(msg),
            OverlayError::Ocr(e) => AppError::Ocr(e),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_format",
                msg.clone(),
            ),
            AppError::DocumentParse(msg) => {
                tracing::warn!("Document parse error: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "document_error",
                    "The document could not be read".to_string(),
                )
            }
            AppError::Ocr(e) => {
                let status = e.status_code();
                if status.is_server_error() {
                    tracing::error!("OCR error: {}", e);
                }
                (status, "ocr_error", e.to_string())
            }
            AppError::Multipart(e) => (e.status(), "bad_request", e.body_text()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::UnsupportedFormat("x".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (AppError::DocumentParse("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::Ocr(OcrError::ProviderNotAvailable("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Ocr(OcrError::ProcessingError("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_document_errors_map_to_taxonomy() {
        assert!(matches!(
            AppError::from(DocumentError::MissingPart("word/document.xml".into())),
            AppError::DocumentParse(_)
        ));
        assert!(matches!(
            AppError::from(DocumentError::UnsupportedFormat("pdf".into())),
            AppError::UnsupportedFormat(_)
        ));
        assert!(matches!(
            AppError::from(DocumentError::InvalidContent("not utf-8".into())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(OverlayError::Decode("bad".into())),
            AppError::BadRequest(_)
        ));
    }
}
