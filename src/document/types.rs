//! Document types
//!
//! Format detection plus the fragment/handle types shared by every codec.

use serde::{Deserialize, Serialize};

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Pptx,
    Pdf,
    Text,
}

impl DocumentFormat {
    const DOCX_MIME: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    const PPTX_MIME: &'static str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";

    /// Detect from an upload's file name, then its declared content type.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        file_name
            .and_then(|name| mime_guess::from_path(name).first_raw())
            .and_then(Self::from_mime)
            .or_else(|| content_type.and_then(Self::from_mime))
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence {
            Self::DOCX_MIME => Some(Self::Docx),
            Self::PPTX_MIME => Some(Self::Pptx),
            "application/pdf" => Some(Self::Pdf),
            "text/plain" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Docx => Self::DOCX_MIME,
            Self::Pptx => Self::PPTX_MIME,
            Self::Pdf => "application/pdf",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
            Self::Text => "txt",
        }
    }
}

/// Direct back-reference to a text-bearing node.
///
/// Handles are assigned when the document is parsed and stay valid until it
/// is dropped; they are never recomputed from a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeHandle {
    /// Word-processor body paragraph
    Paragraph(usize),
    /// Word-processor table cell
    TableCell(usize),
    /// Paragraph of a slide shape
    SlideParagraph { slide: usize, paragraph: usize },
    /// Line of a plain-text document
    Line(usize),
}

/// One extracted unit of translatable text bound to its node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    pub handle: NodeHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_file_name() {
        assert_eq!(DocumentFormat::detect(Some("report.docx"), None), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::detect(Some("deck.PPTX"), None), Some(DocumentFormat::Pptx));
        assert_eq!(DocumentFormat::detect(Some("paper.pdf"), None), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::detect(Some("notes.txt"), None), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::detect(Some("photo.png"), None), None);
    }

    #[test]
    fn test_detect_falls_back_to_content_type() {
        assert_eq!(
            DocumentFormat::detect(Some("upload"), Some("text/plain; charset=utf-8")),
            Some(DocumentFormat::Text)
        );
        assert_eq!(
            DocumentFormat::detect(None, Some(DocumentFormat::Docx.mime_type())),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::detect(None, Some("application/zip")), None);
    }
}
