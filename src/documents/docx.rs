//! Plain-text extraction from `.docx` bytes
//!
//! A docx file is a zip archive whose `word/document.xml` holds the body.
//! Text lives in `<w:t>` runs grouped into `<w:p>` paragraphs; paragraphs
//! are joined with newlines, empty ones included.

use super::{DocumentError, DocumentResult};
use quick_xml::events::Event;
use std::io::{BufReader, Cursor};

pub fn extract_docx_text(bytes: &[u8]) -> DocumentResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::Docx(format!("zip: {}", e)))?;

    let doc = archive
        .by_name("word/document.xml")
        .map_err(|e| DocumentError::Docx(format!("missing document.xml: {}", e)))?;

    let mut reader = quick_xml::Reader::from_reader(BufReader::new(doc));
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text_tag = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => current = Some(String::new()),
                b"t" => in_text_tag = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(String::new());
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.extend(current.take()),
                b"t" => in_text_tag = false,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_text_tag {
                    if let (Some(paragraph), Ok(s)) = (current.as_mut(), e.unescape()) {
                        paragraph.push_str(&s);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocumentError::Docx(format!("xml: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n"))
}
