//! In-memory DOCX/PPTX fixtures for unit tests

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn w_paragraph(text: &str) -> String {
    if text.is_empty() {
        "<w:p/>".to_string()
    } else {
        format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
    }
}

/// `word/document.xml` with body paragraphs followed by one table
pub fn docx_body(paragraphs: &[&str], rows: &[Vec<&str>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for paragraph in paragraphs {
        xml.push_str(&w_paragraph(paragraph));
    }
    if !rows.is_empty() {
        xml.push_str("<w:tbl>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in row {
                xml.push_str(&format!("<w:tc>{}</w:tc>", w_paragraph(cell)));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
    }
    xml.push_str("<w:sectPr/></w:body></w:document>");
    xml
}

pub fn build_docx(document_xml: &str) -> Vec<u8> {
    build_zip(&[
        ("[Content_Types].xml", "<Types/>"),
        ("word/document.xml", document_xml),
    ])
}

/// Deck with one text shape per slide, slides written in the given order
pub fn build_pptx(slides: &[(u32, Vec<&str>)]) -> Vec<u8> {
    build_deck(slides, None)
}

/// Like [`build_pptx`], with a `p:sldIdLst` presenting slides as `order`
pub fn build_pptx_ordered(slides: &[(u32, Vec<&str>)], order: &[u32]) -> Vec<u8> {
    build_deck(slides, Some(order))
}

fn build_deck(slides: &[(u32, Vec<&str>)], order: Option<&[u32]>) -> Vec<u8> {
    let mut files: Vec<(String, String)> = vec![("[Content_Types].xml".to_string(), "<Types/>".to_string())];

    match order {
        None => files.push(("ppt/presentation.xml".to_string(), "<p:presentation/>".to_string())),
        Some(order) => {
            let ids: String = order
                .iter()
                .enumerate()
                .map(|(i, number)| format!(r#"<p:sldId id="{}" r:id="rIdS{}"/>"#, 256 + i, number))
                .collect();
            let relationships: String = order
                .iter()
                .map(|number| {
                    format!(
                        r#"<Relationship Id="rIdS{0}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{0}.xml"/>"#,
                        number
                    )
                })
                .collect();
            files.push((
                "ppt/presentation.xml".to_string(),
                format!(
                    concat!(
                        r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
                        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                        r#"<p:sldIdLst>{}</p:sldIdLst></p:presentation>"#
                    ),
                    ids
                ),
            ));
            files.push((
                "ppt/_rels/presentation.xml.rels".to_string(),
                format!(
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                    relationships
                ),
            ));
        }
    }

    for (number, paragraphs) in slides {
        let body: String = paragraphs
            .iter()
            .map(|text| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", text))
            .collect();
        let xml = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#,
                r#"<p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
            ),
            body
        );
        files.push((format!("ppt/slides/slide{}.xml", number), xml));
    }

    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_str()))
        .collect();
    build_zip(&borrowed)
}
