//! Word-processor documents (DOCX)
//!
//! Text nodes come from `word/document.xml`: body paragraphs first, then
//! table cells, each in document order.

use super::error::{DocumentError, Result};
use super::package::OfficePackage;
use super::traits::TranslatableDocument;
use super::types::{DocumentFormat, NodeHandle};
use super::xml_part::{XmlPart, WORDPROCESSING};

/// Main document part inside the package
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Parsed DOCX package
pub struct DocxDocument {
    package: OfficePackage,
    body: XmlPart,
}

impl DocxDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(OfficePackage::from_bytes(data)?)
    }

    pub fn from_package(package: OfficePackage) -> Result<Self> {
        let body = XmlPart::parse(package.require_part(DOCUMENT_PART)?, WORDPROCESSING)?;
        Ok(Self { package, body })
    }
}

impl TranslatableDocument for DocxDocument {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn text_nodes(&self) -> Vec<NodeHandle> {
        self.body
            .body_paragraphs()
            .map(NodeHandle::Paragraph)
            .chain((0..self.body.cell_count()).map(NodeHandle::TableCell))
            .collect()
    }

    fn node_text(&self, node: NodeHandle) -> Option<String> {
        match node {
            NodeHandle::Paragraph(index) => self.body.paragraph_text(index),
            NodeHandle::TableCell(index) => self.body.cell_text(index),
            _ => None,
        }
    }

    fn replace_node_text(&mut self, node: NodeHandle, text: &str) -> Result<()> {
        match node {
            NodeHandle::Paragraph(index) => self.body.set_paragraph_text(index, text),
            NodeHandle::TableCell(index) => self.body.set_cell_text(index, text),
            other => Err(DocumentError::InvalidContent(format!(
                "{:?} is not a word-processor node",
                other
            ))),
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package
            .to_bytes_with(&[(DOCUMENT_PART, self.body.to_bytes()?)])
    }
}
