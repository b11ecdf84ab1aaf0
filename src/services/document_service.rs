use std::io::{Cursor, Read};
use log::{info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use crate::error::ChatError;
use crate::models::file_context::FileContext;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

pub const NO_CONTENT: &str = "[No content available]";
pub const BINARY_UNREADABLE: &str = "[Binary file - content not readable]";

// word/document.xml larger than this is treated as corrupt
const MAX_DOCUMENT_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Placeholder that stands in for a document whose decoder failed.
pub fn unreadable_placeholder(name: &str) -> String {
    format!("[Document unreadable: {}]", name)
}

/// Extracts readable text from an uploaded file.
///
/// Plain text passes through untouched. Data URLs are decoded and routed to
/// the PDF, Word, or text decoder by mime type and file extension. Formats
/// with no decoder give [`BINARY_UNREADABLE`] rather than an error.
pub fn extract_text(file: &FileContext) -> Result<String, ChatError> {
    if file.content.is_empty() {
        return Ok(NO_CONTENT.to_string());
    }
    if !file.is_data_url() {
        return Ok(file.content.clone());
    }

    let data = match file
        .decode_data_url()
        .map_err(|e| ChatError::extraction(&file.name, e))?
    {
        Some(data) => data,
        None => {
            warn!("{} has a data URL without a base64 payload", file.name);
            return Ok(BINARY_UNREADABLE.to_string());
        }
    };

    if data.mime_type == MIME_PDF || file.has_extension(".pdf") {
        info!("Extracting PDF text from {}", file.name);
        return extract_pdf(&file.name, &data.bytes);
    }
    if data.mime_type == MIME_DOCX
        || data.mime_type == MIME_OCTET_STREAM
        || file.has_extension(".docx")
        || file.has_extension(".doc")
    {
        info!("Extracting Word text from {}", file.name);
        return extract_docx(&file.name, &data.bytes);
    }
    if data.mime_type.starts_with("text/")
        || file.has_extension(".txt")
        || file.has_extension(".md")
    {
        return String::from_utf8(data.bytes).map_err(|e| ChatError::extraction(&file.name, e));
    }

    Ok(BINARY_UNREADABLE.to_string())
}

fn extract_pdf(name: &str, bytes: &[u8]) -> Result<String, ChatError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ChatError::extraction(name, e))
}

fn extract_docx(name: &str, bytes: &[u8]) -> Result<String, ChatError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ChatError::extraction(name, e))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ChatError::extraction(name, e))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_DOCUMENT_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ChatError::extraction(name, e))?;
    if xml.len() as u64 >= MAX_DOCUMENT_XML_BYTES {
        return Err(ChatError::extraction(name, "word/document.xml exceeds size limit"));
    }

    paragraphs_from_document_xml(&xml).map_err(|e| ChatError::extraction(name, e))
}

/// Collects `<w:t>` runs, one line per `<w:p>` paragraph.
fn paragraphs_from_document_xml(xml: &[u8]) -> Result<String, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape().map_err(|e| e.to_string())?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}
