//! Document error types
//!
//! Unified error handling for all document formats (DOCX, PPTX, PDF, text).

use thiserror::Error;

/// Unified document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to parse document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required container part is missing
    #[error("Missing document part: {0}")]
    MissingPart(String),

    /// Malformed XML inside a container part
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Corrupt or unreadable ZIP container
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error (std::io::Error)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// MuPDF error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Invalid content (encoding, node handle)
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Pdf(err.to_string())
    }
}
