//! Plain-text documents
//!
//! Every line is a text node. Line terminators are kept aside so the
//! re-serialized file has the same line structure as the upload.

use super::error::{DocumentError, Result};
use super::traits::TranslatableDocument;
use super::types::{DocumentFormat, NodeHandle};

#[derive(Debug, Clone)]
struct Line {
    text: String,
    /// `"\n"`, `"\r\n"` or empty for a final unterminated line
    terminator: &'static str,
}

/// UTF-8 text file split into lines
#[derive(Debug, Clone)]
pub struct PlainTextDocument {
    lines: Vec<Line>,
}

impl PlainTextDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| DocumentError::InvalidContent(format!("text is not UTF-8: {}", e)))?;
        // Strip a byte-order mark so it never reaches the translator
        Ok(Self::from_text(text.strip_prefix('\u{feff}').unwrap_or(text)))
    }

    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|raw| {
                if let Some(body) = raw.strip_suffix("\r\n") {
                    Line { text: body.to_string(), terminator: "\r\n" }
                } else if let Some(body) = raw.strip_suffix('\n') {
                    Line { text: body.to_string(), terminator: "\n" }
                } else {
                    Line { text: raw.to_string(), terminator: "" }
                }
            })
            .collect();
        Self { lines }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn to_text(&self) -> String {
        self.lines
            .iter()
            .flat_map(|line| [line.text.as_str(), line.terminator])
            .collect()
    }
}

impl TranslatableDocument for PlainTextDocument {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn text_nodes(&self) -> Vec<NodeHandle> {
        (0..self.lines.len()).map(NodeHandle::Line).collect()
    }

    fn node_text(&self, node: NodeHandle) -> Option<String> {
        match node {
            NodeHandle::Line(index) => self.lines.get(index).map(|line| line.text.clone()),
            _ => None,
        }
    }

    fn replace_node_text(&mut self, node: NodeHandle, text: &str) -> Result<()> {
        let index = match node {
            NodeHandle::Line(index) => index,
            other => {
                return Err(DocumentError::InvalidContent(format!(
                    "{:?} is not a text line",
                    other
                )))
            }
        };
        let line = self
            .lines
            .get_mut(index)
            .ok_or_else(|| DocumentError::InvalidContent(format!("no line {}", index)))?;
        // A translated line must not introduce new line breaks
        line.text = text.replace(['\r', '\n'], " ");
        Ok(())
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_text().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_terminators_round_trip() {
        let source = "first\r\nsecond\n\nlast";
        let doc = PlainTextDocument::from_text(source);

        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.node_text(NodeHandle::Line(0)).as_deref(), Some("first"));
        assert_eq!(doc.node_text(NodeHandle::Line(2)).as_deref(), Some(""));
        assert_eq!(doc.to_text(), source);
    }

    #[test]
    fn test_replace_line_keeps_structure() {
        let mut doc = PlainTextDocument::from_text("hello\nworld\n");
        doc.replace_node_text(NodeHandle::Line(1), "thế giới\nmới").unwrap();

        assert_eq!(doc.to_text(), "hello\nthế giới mới\n");
        assert!(doc.replace_node_text(NodeHandle::Line(9), "x").is_err());
        assert!(doc.replace_node_text(NodeHandle::Paragraph(0), "x").is_err());
    }

    #[test]
    fn test_rejects_invalid_utf8_and_strips_bom() {
        assert!(matches!(
            PlainTextDocument::from_bytes(&[0xff, 0xfe, 0x00]),
            Err(DocumentError::InvalidContent(_))
        ));

        let doc = PlainTextDocument::from_bytes("\u{feff}hi".as_bytes()).unwrap();
        assert_eq!(doc.node_text(NodeHandle::Line(0)).as_deref(), Some("hi"));
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        let doc = PlainTextDocument::from_text("");
        assert!(doc.text_nodes().is_empty());
        assert_eq!(doc.to_bytes().unwrap(), Vec::<u8>::new());
    }
}
