//! Translatable documents
//!
//! Format codecs that expose text-bearing nodes behind one trait, plus the
//! pipeline that translates them in place.
//!
//! # Architecture
//!
//! ```text
//!   upload bytes ──► DocumentFormat::detect
//!                          │
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!  ┌────────────┐   ┌────────────┐   ┌───────────────────┐
//!  │DocxDocument│   │PptxDocument│   │ PlainTextDocument │
//!  └────────────┘   └────────────┘   └───────────────────┘
//!        │                 │                  │
//!        └─────── TranslatableDocument ───────┘
//!                          │
//!                          ▼
//!      extract_fragments ─► Translator::translate_batch ─► reinject
//! ```
//!
//! PDFs only go one way: [`pdf::extract_text`] returns plain text.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lexis_server::document::{open_document, translate_document, DocumentFormat, DEFAULT_MAX_EXPANDED_BYTES};
//!
//! let mut doc = open_document(DocumentFormat::Docx, &bytes, DEFAULT_MAX_EXPANDED_BYTES)?;
//! let report = translate_document(doc.as_mut(), &translator, "vi").await?;
//! let translated = doc.to_bytes()?;
//! ```

mod docx;
mod error;
mod package;
pub mod pdf;
mod pipeline;
mod pptx;
mod text;
mod traits;
mod types;
mod xml_part;

#[cfg(test)]
pub(crate) mod test_support;

pub use docx::{DocxDocument, DOCUMENT_PART};
pub use error::{DocumentError, Result};
pub use package::{OfficePackage, DEFAULT_MAX_EXPANDED_BYTES};
pub use pipeline::{extract_fragments, reinject, translate_document, PipelineReport};
pub use pptx::PptxDocument;
pub use text::PlainTextDocument;
pub use traits::TranslatableDocument;
pub use types::{DocumentFormat, NodeHandle, TextFragment};

/// Parse bytes with the codec for `format`.
///
/// Office packages may decompress to at most `max_expanded` bytes. PDFs have
/// no writable codec and are rejected here.
pub fn open_document(
    format: DocumentFormat,
    data: &[u8],
    max_expanded: u64,
) -> Result<Box<dyn TranslatableDocument>> {
    Ok(match format {
        DocumentFormat::Docx => Box::new(DocxDocument::from_package(OfficePackage::from_bytes_limited(
            data,
            max_expanded,
        )?)?),
        DocumentFormat::Pptx => Box::new(PptxDocument::from_package(OfficePackage::from_bytes_limited(
            data,
            max_expanded,
        )?)?),
        DocumentFormat::Text => Box::new(PlainTextDocument::from_bytes(data)?),
        DocumentFormat::Pdf => {
            return Err(DocumentError::UnsupportedFormat(
                "PDF documents can only be extracted, not rewritten".to_string(),
            ))
        }
    })
}
