//! Plain text → PDF
//!
//! A4 pages set in the built-in Helvetica font, one text line per output
//! line. The standard fonts only cover WinAnsi, so characters outside
//! Latin-1 are written as `?`.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, Pt};
use thiserror::Error;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 12.0;
const LEADING: f32 = 14.0;
/// Helvetica at 12pt fits roughly this many average characters per line
const WRAP_COLUMNS: usize = 85;

/// Lines that fit between the top and bottom margins
pub const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize;

/// PDF export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF write error: {0}")]
    Write(String),
}

/// Split text into output lines, wrapping long ones at word boundaries
fn layout_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let raw = raw.trim_end();
        if raw.chars().count() <= WRAP_COLUMNS {
            lines.push(raw.to_string());
            continue;
        }

        let mut current = String::new();
        for word in raw.split(' ') {
            let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
            if needed > WRAP_COLUMNS && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // Words longer than a whole line are hard-split
            let mut word = word;
            while word.chars().count() > WRAP_COLUMNS {
                let split = word
                    .char_indices()
                    .nth(WRAP_COLUMNS)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// Restrict a line to what the WinAnsi-encoded standard fonts can show
fn winansi_text(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\t' => ' ',
            ' '..='~' | '\u{a0}'..='\u{ff}' => c,
            _ => '?',
        })
        .collect()
}

fn write_page(
    doc: &PdfDocumentReference,
    page: printpdf::PdfPageIndex,
    layer: printpdf::PdfLayerIndex,
    font: &IndirectFontRef,
    lines: &[String],
) {
    let layer = doc.get_page(page).get_layer(layer);
    let x = Mm::from(Pt(MARGIN));
    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = PAGE_HEIGHT - MARGIN - FONT_SIZE - LEADING * index as f32;
        layer.use_text(winansi_text(line), FONT_SIZE, x, Mm::from(Pt(baseline)), font);
    }
}

/// Render text as a PDF document
pub fn render_text_pdf(text: &str) -> Result<Vec<u8>, ExportError> {
    let lines = layout_lines(text);
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![lines.as_slice()]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let (width, height) = (Mm::from(Pt(PAGE_WIDTH)), Mm::from(Pt(PAGE_HEIGHT)));
    let (doc, first_page, first_layer) = PdfDocument::new("translated", width, height, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Font(e.to_string()))?;

    for (index, page_lines) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, format!("Layer {}", index + 1))
        };
        write_page(&doc, page, layer, &font, page_lines);
    }

    let mut buffer = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buffer);
        doc.save(&mut writer)
            .map_err(|e| ExportError::Write(e.to_string()))?;
    }

    tracing::debug!(lines = lines.len(), pages = pages.len(), "Rendered text PDF");
    Ok(buffer)
}
