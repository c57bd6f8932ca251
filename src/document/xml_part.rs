//! Office XML part model
//!
//! Keeps a container part (`word/document.xml`, `ppt/slides/slideN.xml`) as
//! an owned event list so text runs can be rewritten in place and everything
//! else is written back exactly as it was read.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::error::{DocumentError, Result};

/// Element names that carry text in a given markup dialect
#[derive(Debug, Clone, Copy)]
pub struct PartTags {
    /// Paragraph element
    pub paragraph: &'static [u8],
    /// Text run element
    pub text: &'static [u8],
    /// Table cell element, if the dialect's cells are text nodes of their own
    pub cell: Option<&'static [u8]>,
    /// Add `xml:space="preserve"` to rewritten runs
    pub preserve_space: bool,
}

/// WordprocessingML (DOCX)
pub const WORDPROCESSING: PartTags = PartTags {
    paragraph: b"w:p",
    text: b"w:t",
    cell: Some(b"w:tc"),
    preserve_space: true,
};

/// DrawingML text bodies (PPTX shapes)
pub const DRAWING: PartTags = PartTags {
    paragraph: b"a:p",
    text: b"a:t",
    cell: None,
    preserve_space: false,
};

#[derive(Debug)]
enum Piece {
    Raw(Event<'static>),
    Run(TextRun),
}

/// One text run element with its decoded text
#[derive(Debug)]
struct TextRun {
    /// Events as read, from the opening tag to the closing tag
    original: Vec<Event<'static>>,
    text: String,
    dirty: bool,
}

impl TextRun {
    fn start_tag(&self) -> Option<&BytesStart<'static>> {
        match self.original.first() {
            Some(Event::Start(start)) | Some(Event::Empty(start)) => Some(start),
            _ => None,
        }
    }

    fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
            self.dirty = true;
        }
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>, preserve_space: bool) -> Result<()> {
        if !self.dirty {
            for event in &self.original {
                writer.write_event(event.clone())?;
            }
            return Ok(());
        }

        let start = self
            .start_tag()
            .ok_or_else(|| DocumentError::InvalidContent("text run without start tag".to_string()))?;
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut start = start.clone();
        if preserve_space && !has_attribute(&start, b"xml:space") {
            start.push_attribute(("xml:space", "preserve"));
        }

        if self.text.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&self.text)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Ok(())
    }
}

fn has_attribute(start: &BytesStart<'_>, key: &[u8]) -> bool {
    start
        .attributes()
        .with_checks(false)
        .flatten()
        .any(|attr| attr.key.as_ref() == key)
}

#[derive(Debug, Default)]
struct Paragraph {
    /// Indices into `pieces` of the runs owned by this paragraph
    runs: Vec<usize>,
    /// Innermost enclosing cell
    cell: Option<usize>,
}

#[derive(Debug, Default)]
struct Cell {
    /// Paragraphs directly owned by the cell
    paragraphs: Vec<usize>,
}

/// Markup classification used while reading
enum Tag {
    ParagraphStart,
    ParagraphEmpty,
    ParagraphEnd,
    CellStart,
    CellEnd,
    TextStart,
    TextEmpty,
    Eof,
    Other,
}

fn classify(event: &Event<'_>, tags: &PartTags) -> Tag {
    let is_cell = |name: &[u8]| tags.cell.map_or(false, |cell| cell == name);
    match event {
        Event::Start(e) if e.name().as_ref() == tags.paragraph => Tag::ParagraphStart,
        Event::Empty(e) if e.name().as_ref() == tags.paragraph => Tag::ParagraphEmpty,
        Event::End(e) if e.name().as_ref() == tags.paragraph => Tag::ParagraphEnd,
        Event::Start(e) if is_cell(e.name().as_ref()) => Tag::CellStart,
        Event::End(e) if is_cell(e.name().as_ref()) => Tag::CellEnd,
        Event::Start(e) if e.name().as_ref() == tags.text => Tag::TextStart,
        Event::Empty(e) if e.name().as_ref() == tags.text => Tag::TextEmpty,
        Event::Eof => Tag::Eof,
        _ => Tag::Other,
    }
}

/// Parsed XML part with addressable paragraphs and cells
#[derive(Debug)]
pub struct XmlPart {
    tags: PartTags,
    pieces: Vec<Piece>,
    paragraphs: Vec<Paragraph>,
    cells: Vec<Cell>,
}

impl XmlPart {
    /// Parse a part, indexing paragraphs and cells in document order
    pub fn parse(xml: &[u8], tags: PartTags) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut part = Self {
            tags,
            pieces: Vec::new(),
            paragraphs: Vec::new(),
            cells: Vec::new(),
        };
        let mut open_paragraphs: Vec<usize> = Vec::new();
        let mut open_cells: Vec<usize> = Vec::new();
        let mut current_run: Option<TextRun> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf)?.into_owned();
            buf.clear();

            if let Some(run) = current_run.as_mut() {
                let closes = matches!(&event, Event::End(e) if e.name().as_ref() == tags.text);
                match &event {
                    Event::Text(text) => run.text.push_str(&text.unescape()?),
                    Event::CData(data) => run.text.push_str(&String::from_utf8_lossy(data)),
                    Event::Eof => {
                        return Err(DocumentError::ParseError("unterminated text run".to_string()));
                    }
                    _ => {}
                }
                run.original.push(event);

                if closes {
                    if let Some(run) = current_run.take() {
                        part.push_run(run, &open_paragraphs);
                    }
                }
                continue;
            }

            match classify(&event, &tags) {
                Tag::Eof => break,
                Tag::ParagraphStart | Tag::ParagraphEmpty => {
                    let index = part.paragraphs.len();
                    let cell = open_cells.last().copied();
                    part.paragraphs.push(Paragraph { runs: Vec::new(), cell });
                    if let Some(cell) = cell {
                        part.cells[cell].paragraphs.push(index);
                    }
                    if matches!(event, Event::Start(_)) {
                        open_paragraphs.push(index);
                    }
                    part.pieces.push(Piece::Raw(event));
                }
                Tag::ParagraphEnd => {
                    open_paragraphs.pop();
                    part.pieces.push(Piece::Raw(event));
                }
                Tag::CellStart => {
                    open_cells.push(part.cells.len());
                    part.cells.push(Cell::default());
                    part.pieces.push(Piece::Raw(event));
                }
                Tag::CellEnd => {
                    open_cells.pop();
                    part.pieces.push(Piece::Raw(event));
                }
                Tag::TextStart if !open_paragraphs.is_empty() => {
                    current_run = Some(TextRun {
                        original: vec![event],
                        text: String::new(),
                        dirty: false,
                    });
                }
                Tag::TextEmpty if !open_paragraphs.is_empty() => {
                    let run = TextRun {
                        original: vec![event],
                        text: String::new(),
                        dirty: false,
                    };
                    part.push_run(run, &open_paragraphs);
                }
                _ => part.pieces.push(Piece::Raw(event)),
            }
        }

        Ok(part)
    }

    fn push_run(&mut self, run: TextRun, open_paragraphs: &[usize]) {
        let index = self.pieces.len();
        self.pieces.push(Piece::Run(run));
        if let Some(&paragraph) = open_paragraphs.last() {
            self.paragraphs[paragraph].runs.push(index);
        }
    }

    fn run(&self, piece: usize) -> Option<&TextRun> {
        match self.pieces.get(piece) {
            Some(Piece::Run(run)) => Some(run),
            _ => None,
        }
    }

    fn run_mut(&mut self, piece: usize) -> Option<&mut TextRun> {
        match self.pieces.get_mut(piece) {
            Some(Piece::Run(run)) => Some(run),
            _ => None,
        }
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Paragraphs that are not inside any table cell, in document order
    pub fn body_paragraphs(&self) -> impl Iterator<Item = usize> + '_ {
        self.paragraphs
            .iter()
            .enumerate()
            .filter(|(_, paragraph)| paragraph.cell.is_none())
            .map(|(index, _)| index)
    }

    /// Concatenated text of a paragraph's runs
    pub fn paragraph_text(&self, index: usize) -> Option<String> {
        let paragraph = self.paragraphs.get(index)?;
        Some(
            paragraph
                .runs
                .iter()
                .filter_map(|&piece| self.run(piece))
                .map(|run| run.text.as_str())
                .collect(),
        )
    }

    /// Replace a paragraph's text.
    ///
    /// The first run receives the whole text so it keeps its formatting;
    /// the remaining runs are emptied.
    pub fn set_paragraph_text(&mut self, index: usize, text: &str) -> Result<()> {
        let runs = self
            .paragraphs
            .get(index)
            .ok_or_else(|| DocumentError::InvalidContent(format!("no paragraph {}", index)))?
            .runs
            .clone();

        let (&first, rest) = runs
            .split_first()
            .ok_or_else(|| DocumentError::InvalidContent(format!("paragraph {} has no text runs", index)))?;

        if let Some(run) = self.run_mut(first) {
            run.set_text(text);
        }
        for &piece in rest {
            if let Some(run) = self.run_mut(piece) {
                run.set_text("");
            }
        }
        Ok(())
    }

    /// Text of a cell: its paragraphs joined by line breaks
    pub fn cell_text(&self, index: usize) -> Option<String> {
        let cell = self.cells.get(index)?;
        let lines: Vec<String> = cell
            .paragraphs
            .iter()
            .filter_map(|&paragraph| self.paragraph_text(paragraph))
            .collect();
        Some(lines.join("\n"))
    }

    /// Replace a cell's text.
    ///
    /// Lines go one per paragraph when the counts line up; otherwise the
    /// text is collapsed into the first paragraph that has runs.
    pub fn set_cell_text(&mut self, index: usize, text: &str) -> Result<()> {
        let paragraphs = self
            .cells
            .get(index)
            .ok_or_else(|| DocumentError::InvalidContent(format!("no cell {}", index)))?
            .paragraphs
            .clone();

        let has_runs = |part: &Self, paragraph: usize| !part.paragraphs[paragraph].runs.is_empty();
        let lines: Vec<&str> = text.split('\n').collect();

        let distributable = lines.len() == paragraphs.len()
            && paragraphs
                .iter()
                .zip(&lines)
                .all(|(&paragraph, line)| line.is_empty() || has_runs(self, paragraph));

        if distributable {
            for (&paragraph, line) in paragraphs.iter().zip(&lines) {
                if has_runs(self, paragraph) {
                    self.set_paragraph_text(paragraph, line)?;
                }
            }
            return Ok(());
        }

        let writable: Vec<usize> = paragraphs
            .iter()
            .copied()
            .filter(|&paragraph| has_runs(self, paragraph))
            .collect();
        let (&first, rest) = writable
            .split_first()
            .ok_or_else(|| DocumentError::InvalidContent(format!("cell {} has no text runs", index)))?;

        let collapsed = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.set_paragraph_text(first, &collapsed)?;
        for &paragraph in rest {
            self.set_paragraph_text(paragraph, "")?;
        }
        Ok(())
    }

    /// Serialize the part
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for piece in &self.pieces {
            match piece {
                Piece::Raw(event) => writer.write_event(event.clone())?,
                Piece::Run(run) => run.write(&mut writer, self.tags.preserve_space)?,
            }
        }
        Ok(writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hello </w:t></w:r><w:r><w:t>world &amp; friends</w:t></w:r></w:p>"#,
        r#"<w:p/>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell one</w:t></w:r></w:p><w:p><w:r><w:t>second line</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>Cell two</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:p><w:r><w:t xml:space="preserve"> Tail </w:t></w:r></w:p>"#,
        r#"</w:body></w:document>"#
    );

    #[test]
    fn test_indexes_paragraphs_and_cells() {
        let part = XmlPart::parse(DOC.as_bytes(), WORDPROCESSING).unwrap();

        assert_eq!(part.paragraph_count(), 6);
        assert_eq!(part.cell_count(), 2);
        let body: Vec<usize> = part.body_paragraphs().collect();
        assert_eq!(body, vec![0, 1, 5]);
        assert_eq!(part.paragraph_text(0).as_deref(), Some("Hello world & friends"));
        assert_eq!(part.paragraph_text(1).as_deref(), Some(""));
        assert_eq!(part.cell_text(0).as_deref(), Some("Cell one\nsecond line"));
        assert_eq!(part.cell_text(1).as_deref(), Some("Cell two"));
    }

    #[test]
    fn test_untouched_part_round_trips_byte_for_byte() {
        let part = XmlPart::parse(DOC.as_bytes(), WORDPROCESSING).unwrap();
        assert_eq!(String::from_utf8(part.to_bytes().unwrap()).unwrap(), DOC);
    }

    #[test]
    fn test_set_paragraph_text_keeps_first_run_formatting() {
        let mut part = XmlPart::parse(DOC.as_bytes(), WORDPROCESSING).unwrap();
        part.set_paragraph_text(0, "Xin chào <bạn>").unwrap();

        let xml = String::from_utf8(part.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Xin chào &lt;bạn&gt;</w:t></w:r><w:r><w:t xml:space="preserve"/></w:r>"#
        ));

        let reparsed = XmlPart::parse(xml.as_bytes(), WORDPROCESSING).unwrap();
        assert_eq!(reparsed.paragraph_text(0).as_deref(), Some("Xin chào <bạn>"));
        assert_eq!(reparsed.paragraph_text(5).as_deref(), Some(" Tail "));
    }

    #[test]
    fn test_set_cell_text_distributes_lines() {
        let mut part = XmlPart::parse(DOC.as_bytes(), WORDPROCESSING).unwrap();
        part.set_cell_text(0, "Ô một\ndòng hai").unwrap();
        assert_eq!(part.paragraph_text(2).as_deref(), Some("Ô một"));
        assert_eq!(part.paragraph_text(3).as_deref(), Some("dòng hai"));

        part.set_cell_text(0, "collapsed").unwrap();
        assert_eq!(part.cell_text(0).as_deref(), Some("collapsed\n"));
    }

    #[test]
    fn test_paragraph_without_runs_rejects_text() {
        let mut part = XmlPart::parse(DOC.as_bytes(), WORDPROCESSING).unwrap();
        assert!(matches!(
            part.set_paragraph_text(1, "x"),
            Err(DocumentError::InvalidContent(_))
        ));
        assert!(part.set_paragraph_text(99, "x").is_err());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = XmlPart::parse(b"<w:document><w:p><w:t>open</w:p>", WORDPROCESSING);
        assert!(result.is_err());
    }
}
