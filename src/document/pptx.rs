//! Slide decks (PPTX)
//!
//! Slides follow the deck's `p:sldIdLst` in `ppt/presentation.xml`, resolved
//! through `ppt/_rels/presentation.xml.rels`. Slide parts the list does not
//! name (or every slide, when the list is missing) follow in `slideN.xml`
//! numeric order. Within a slide every DrawingML paragraph is a text node, in
//! shape order.

use std::collections::{HashMap, HashSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::{DocumentError, Result};
use super::package::OfficePackage;
use super::traits::TranslatableDocument;
use super::types::{DocumentFormat, NodeHandle};
use super::xml_part::{XmlPart, DRAWING};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";
const SLIDE_SUFFIX: &str = ".xml";

struct Slide {
    part_name: String,
    part: XmlPart,
}

/// Parsed PPTX package
pub struct PptxDocument {
    package: OfficePackage,
    slides: Vec<Slide>,
}

/// Slide number encoded in a part name, e.g. `ppt/slides/slide12.xml` -> 12
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(SLIDE_SUFFIX)?
        .parse()
        .ok()
}

/// Value of the attribute with local name `local`; `prefixed` tells `r:id` from a bare `id`
fn attribute(start: &BytesStart<'_>, local: &[u8], prefixed: bool) -> Result<Option<String>> {
    for attr in start.attributes().with_checks(false).flatten() {
        if attr.key.local_name().as_ref() == local && attr.key.prefix().is_some() == prefixed {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Call `visit` for every start or empty tag named `element`
fn scan_elements(
    xml: &[u8],
    element: &[u8],
    mut visit: impl FnMut(&BytesStart<'_>) -> Result<()>,
) -> Result<()> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == element => visit(&e)?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Package name of a relationship target relative to `ppt/`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Slide part names in the order the deck presents them
fn presentation_order(package: &OfficePackage) -> Result<Vec<String>> {
    let (Some(presentation), Some(rels)) = (package.part(PRESENTATION_PART), package.part(PRESENTATION_RELS))
    else {
        return Ok(Vec::new());
    };

    let mut targets = HashMap::new();
    scan_elements(rels, b"Relationship", |e| {
        if let (Some(id), Some(target)) = (attribute(e, b"Id", false)?, attribute(e, b"Target", false)?) {
            targets.insert(id, resolve_target(&target));
        }
        Ok(())
    })?;

    let mut order = Vec::new();
    scan_elements(presentation, b"sldId", |e| {
        if let Some(part) = attribute(e, b"id", true)?.and_then(|id| targets.get(&id)) {
            order.push(part.clone());
        }
        Ok(())
    })?;
    Ok(order)
}

impl PptxDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(OfficePackage::from_bytes(data)?)
    }

    pub fn from_package(package: OfficePackage) -> Result<Self> {

        if package.part(PRESENTATION_PART).is_none() {
            return Err(DocumentError::MissingPart(PRESENTATION_PART.to_string()));
        }

        let mut numbered: Vec<(u32, String)> = package
            .names()
            .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
            .collect();
        numbered.sort_by_key(|(number, _)| *number);

        let mut seen = HashSet::new();
        let ordered: Vec<String> = presentation_order(&package)?
            .into_iter()
            .filter(|name| slide_number(name).is_some() && package.part(name).is_some())
            .chain(numbered.into_iter().map(|(_, name)| name))
            .filter(|name| seen.insert(name.clone()))
            .collect();

        let slides = ordered
            .into_iter()
            .map(|part_name| {
                let part = XmlPart::parse(package.require_part(&part_name)?, DRAWING)?;
                Ok(Slide { part_name, part })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { package, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide(&self, index: usize) -> Option<&XmlPart> {
        self.slides.get(index).map(|slide| &slide.part)
    }
}

impl TranslatableDocument for PptxDocument {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn text_nodes(&self) -> Vec<NodeHandle> {
        self.slides
            .iter()
            .enumerate()
            .flat_map(|(slide, s)| {
                (0..s.part.paragraph_count())
                    .map(move |paragraph| NodeHandle::SlideParagraph { slide, paragraph })
            })
            .collect()
    }

    fn node_text(&self, node: NodeHandle) -> Option<String> {
        match node {
            NodeHandle::SlideParagraph { slide, paragraph } => {
                self.slide(slide)?.paragraph_text(paragraph)
            }
            _ => None,
        }
    }

    fn replace_node_text(&mut self, node: NodeHandle, text: &str) -> Result<()> {
        match node {
            NodeHandle::SlideParagraph { slide, paragraph } => self
                .slides
                .get_mut(slide)
                .ok_or_else(|| DocumentError::InvalidContent(format!("no slide {}", slide)))?
                .part
                .set_paragraph_text(paragraph, text),
            other => Err(DocumentError::InvalidContent(format!(
                "{:?} is not a slide node",
                other
            ))),
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let replacements = self
            .slides
            .iter()
            .map(|slide| Ok((slide.part_name.as_str(), slide.part.to_bytes()?)))
            .collect::<Result<Vec<_>>>()?;
        self.package.to_bytes_with(&replacements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_support::{build_pptx, build_pptx_ordered};

    #[test]
    fn test_slide_number_parsing() {
        assert_eq!(slide_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(slide_number("ppt/slides/slide12.xml"), Some(12));
        assert_eq!(slide_number("ppt/slides/_rels/slide1.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }

    #[test]
    fn test_slides_in_numeric_order() {
        // slide10 is written before slide2 inside the archive
        let bytes = build_pptx(&[(10, vec!["Ten"]), (2, vec!["Two a", "Two b"]), (1, vec!["One"])]);
        let deck = PptxDocument::from_bytes(&bytes).unwrap();

        assert_eq!(deck.slide_count(), 3);
        let texts: Vec<String> = deck
            .text_nodes()
            .into_iter()
            .filter_map(|node| deck.node_text(node))
            .collect();
        assert_eq!(texts, vec!["One", "Two a", "Two b", "Ten"]);
    }

    #[test]
    fn test_slides_follow_presentation_list() {
        // Deck order 3, 1 while slide2 is left out of the list
        let bytes = build_pptx_ordered(
            &[(1, vec!["One"]), (2, vec!["Two"]), (3, vec!["Three"])],
            &[3, 1],
        );
        let deck = PptxDocument::from_bytes(&bytes).unwrap();

        let texts: Vec<String> = deck
            .text_nodes()
            .into_iter()
            .filter_map(|node| deck.node_text(node))
            .collect();
        assert_eq!(texts, vec!["Three", "One", "Two"]);

        // Re-injection still lands in the right part
        let mut deck = deck;
        let first = deck.text_nodes()[0];
        deck.replace_node_text(first, "Ba").unwrap();
        let reread = PptxDocument::from_bytes(&deck.to_bytes().unwrap()).unwrap();
        assert_eq!(reread.node_text(reread.text_nodes()[0]).as_deref(), Some("Ba"));
        assert_eq!(reread.node_text(reread.text_nodes()[1]).as_deref(), Some("One"));
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide4.xml"), "ppt/slides/slide4.xml");
        assert_eq!(resolve_target("/ppt/slides/slide4.xml"), "ppt/slides/slide4.xml");
    }

    #[test]
    fn test_replace_and_serialize() {
        let bytes = build_pptx(&[(1, vec!["Title", "Body"])]);
        let mut deck = PptxDocument::from_bytes(&bytes).unwrap();

        let nodes = deck.text_nodes();
        deck.replace_node_text(nodes[1], "Nội dung").unwrap();

        let reread = PptxDocument::from_bytes(&deck.to_bytes().unwrap()).unwrap();
        let nodes = reread.text_nodes();
        assert_eq!(reread.node_text(nodes[0]).as_deref(), Some("Title"));
        assert_eq!(reread.node_text(nodes[1]).as_deref(), Some("Nội dung"));
    }

    #[test]
    fn test_requires_presentation_part() {
        let bytes = crate::document::test_support::build_zip(&[("ppt/slides/slide1.xml", "<p:sld/>")]);
        assert!(matches!(
            PptxDocument::from_bytes(&bytes),
            Err(DocumentError::MissingPart(_))
        ));
    }
}
