//! Document text extraction boundary
//!
//! Uploaded documents are turned into plain text before the engine sees
//! them. Plain text is decoded leniently; `.docx` files yield the raw text of
//! their main document part, one paragraph per block. Other extractors can be
//! plugged in through [`TextExtractor`].

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::{Error, Result};

/// Zip entry holding the body of a `.docx` document
const DOCX_BODY_PART: &str = "word/document.xml";

/// MIME type of Word `.docx` documents
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Declared type of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Docx,
}

impl ContentType {
    /// Recognise a MIME type
    pub fn from_mime(mime: &str) -> Result<Self> {
        // parameters such as `; charset=utf-8` do not change the type
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "text/plain" => Ok(ContentType::PlainText),
            DOCX_MIME => Ok(ContentType::Docx),
            _ => Err(Error::UnsupportedInput(format!(
                "unsupported file type: {essence}; expected .txt or .docx"
            ))),
        }
    }

    /// Infer the type from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("txt") | Some("text") => Ok(ContentType::PlainText),
            Some("docx") => Ok(ContentType::Docx),
            _ => Err(Error::UnsupportedInput(format!(
                "cannot infer file type of '{}'; expected .txt or .docx",
                path.display()
            ))),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain",
            ContentType::Docx => DOCX_MIME,
        }
    }
}

/// Turns document bytes into the text the engine scans
pub trait TextExtractor {
    fn extract(&self, content_type: ContentType, bytes: &[u8]) -> Result<String>;
}

/// Extractor for plain text
///
/// Bytes that are not valid UTF-8 become U+FFFD instead of failing the
/// request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, content_type: ContentType, bytes: &[u8]) -> Result<String> {
        match content_type {
            ContentType::PlainText => Ok(String::from_utf8_lossy(bytes).into_owned()),
            other => Err(no_extractor(other)),
        }
    }
}

/// Extractor for Word `.docx` documents
///
/// Reads `word/document.xml` from the archive and keeps the text runs. Every
/// paragraph is followed by a blank line; tabs and line breaks are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, content_type: ContentType, bytes: &[u8]) -> Result<String> {
        match content_type {
            ContentType::Docx => {
                let body = read_docx_body(bytes)?;
                let text = docx_body_text(&body)?;
                debug!(target: "recast", chars = text.chars().count(), "extracted docx text");
                Ok(text)
            }
            other => Err(no_extractor(other)),
        }
    }
}

/// Extractor that picks the built-in extractor for the content type
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, content_type: ContentType, bytes: &[u8]) -> Result<String> {
        match content_type {
            ContentType::PlainText => PlainTextExtractor.extract(content_type, bytes),
            ContentType::Docx => DocxExtractor.extract(content_type, bytes),
        }
    }
}

fn no_extractor(content_type: ContentType) -> Error {
    Error::UnsupportedInput(format!("no extractor available for {}", content_type.mime()))
}

fn unreadable_docx(detail: impl std::fmt::Display) -> Error {
    Error::UnsupportedInput(format!("failed to read .docx content: {detail}"))
}

fn read_docx_body(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(unreadable_docx)?;
    let mut part = archive.by_name(DOCX_BODY_PART).map_err(unreadable_docx)?;
    let mut body = String::new();
    part.read_to_string(&mut body).map_err(unreadable_docx)?;
    Ok(body)
}

fn docx_body_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event().map_err(unreadable_docx)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_run_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Text(e) if in_run_text => {
                text.push_str(&e.unescape().map_err(unreadable_docx)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}
