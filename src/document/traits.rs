//! Document traits
//!
//! Format-agnostic interface over text-bearing nodes.

use super::error::Result;
use super::types::{DocumentFormat, NodeHandle};

/// A parsed document whose visible text can be read and rewritten in place
///
/// Implementations expose their node kinds (paragraphs, table cells, slide
/// paragraphs, lines) through one traversal and serialize back to the native
/// container format.
pub trait TranslatableDocument: Send {
    /// Document format
    fn format(&self) -> DocumentFormat;

    /// Every text-bearing node in the fixed traversal order of the format
    fn text_nodes(&self) -> Vec<NodeHandle>;

    /// Current text of a node
    fn node_text(&self, node: NodeHandle) -> Option<String>;

    /// Replace the text of a node
    fn replace_node_text(&mut self, node: NodeHandle, text: &str) -> Result<()>;

    /// Serialize to the native byte format
    fn to_bytes(&self) -> Result<Vec<u8>>;
}
