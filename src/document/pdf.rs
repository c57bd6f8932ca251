//! PDF text extraction
//!
//! PDFs are translated as plain text: there is no re-injection into the
//! original layout. MuPDF is synchronous, so callers on the async runtime
//! should run [`extract_text`] inside `spawn_blocking`.

use mupdf::Document;
use tracing::debug;

use super::error::{DocumentError, Result};
use super::types::DocumentFormat;

/// Extract the text of every page that has any, joined by line breaks
pub fn extract_text(data: &[u8]) -> Result<String> {
    let doc = Document::from_bytes(data, DocumentFormat::Pdf.mime_type())?;
    let page_count = doc.page_count()?;

    let mut pages = Vec::with_capacity(page_count.max(0) as usize);
    for index in 0..page_count {
        let page = doc.load_page(index)?;
        let text = page.to_text()?;
        let text = text.trim();
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }

    debug!("Extracted text from {} of {} PDF pages", pages.len(), page_count);

    if pages.is_empty() && page_count > 0 {
        // Scanned PDFs have no text layer; report that instead of returning nothing
        return Err(DocumentError::InvalidContent(
            "PDF has no extractable text layer".to_string(),
        ));
    }

    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_a_pdf_error() {
        assert!(matches!(
            extract_text(b"not a pdf at all"),
            Err(DocumentError::Pdf(_))
        ));
    }
}
