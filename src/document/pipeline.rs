//! Extract → batch-translate → re-inject
//!
//! Works on any [`TranslatableDocument`]. Fragments are extracted once, in
//! the document's fixed node order, and each keeps the handle of the node it
//! came from; translations are written back through those handles only.

use serde::Serialize;
use tracing::{debug, warn};

use super::error::Result;
use super::traits::TranslatableDocument;
use super::types::TextFragment;
use crate::translate::{FragmentOutcome, Translator};

/// Summary of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Number of fragments extracted
    pub fragments: usize,
    /// Number of nodes written back
    pub replaced: usize,
    /// Fragments that kept their original text
    pub fallbacks: usize,
    /// Extracted texts, in extraction order
    pub original: Vec<String>,
    /// Texts written back, in the same order
    pub translated: Vec<String>,
}

/// Collect every node whose trimmed text is non-empty
pub fn extract_fragments(doc: &dyn TranslatableDocument) -> Vec<TextFragment> {
    doc.text_nodes()
        .into_iter()
        .filter_map(|handle| {
            let text = doc.node_text(handle)?;
            let text = text.trim();
            (!text.is_empty()).then(|| TextFragment {
                text: text.to_string(),
                handle,
            })
        })
        .collect()
}

/// Write translations back in fragment order.
///
/// Stops at the shorter of the two lists, leaving remaining nodes untouched.
/// Returns the number of nodes written.
pub fn reinject(
    doc: &mut dyn TranslatableDocument,
    fragments: &[TextFragment],
    translations: &[String],
) -> Result<usize> {
    if translations.len() < fragments.len() {
        warn!(
            fragments = fragments.len(),
            translations = translations.len(),
            "Fewer translations than fragments, stopping re-injection early"
        );
    }

    let mut replaced = 0;
    for (fragment, translation) in fragments.iter().zip(translations) {
        doc.replace_node_text(fragment.handle, translation)?;
        replaced += 1;
    }
    Ok(replaced)
}

/// Translate every fragment of a document in place
pub async fn translate_document(
    doc: &mut dyn TranslatableDocument,
    translator: &Translator,
    target: &str,
) -> Result<PipelineReport> {
    let fragments = extract_fragments(doc);
    if fragments.is_empty() {
        debug!(format = ?doc.format(), "Document has no translatable text");
        return Ok(PipelineReport::default());
    }

    let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
    let outcomes = translator.translate_batch(&texts, target).await;
    let fallbacks = outcomes.iter().filter(|o| o.is_fallback()).count();
    let translated: Vec<String> = outcomes.into_iter().map(FragmentOutcome::into_text).collect();

    let replaced = reinject(doc, &fragments, &translated)?;

    debug!(
        format = ?doc.format(),
        fragments = fragments.len(),
        replaced,
        fallbacks,
        target = %target,
        "Document translated"
    );

    Ok(PipelineReport {
        fragments: fragments.len(),
        replaced,
        fallbacks,
        original: texts,
        translated,
    })
}
