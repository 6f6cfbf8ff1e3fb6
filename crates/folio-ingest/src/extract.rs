//! Format extraction: raw document bytes to ordered page records.
//!
//! Dispatch is by filename extension. Each format normalizes its own notion
//! of a page (PDF page, slide, table, flowed section) into [`PageRecord`]s.
//! Malformed input never surfaces as an error: a broken unit is skipped, a
//! broken document degrades to a flat text dump, and failing that to nothing.

mod archive;
mod docx;
mod odf;
mod pdf;
mod pptx;
mod text;

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::page::PageRecord;

/// Failures inside a structured extractor. Converted into the fallback
/// policy by [`extract_bytes`]; never returned to callers.
#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("missing part: {0}")]
    MissingPart(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    /// Office Open XML word-processor document.
    Docx,
    /// Office Open XML presentation.
    Pptx,
    /// OpenDocument text, presentation or spreadsheet.
    OpenDocument,
    PlainText,
}

impl DocumentFormat {
    /// Detect format from extension. Unknown extensions are tried as PDF.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "pptx" => Self::Pptx,
            "odt" | "odp" | "ods" => Self::OpenDocument,
            "txt" => Self::PlainText,
            _ => Self::Pdf,
        }
    }

    /// Detect format from a filename or path.
    pub fn from_filename(filename: &str) -> Self {
        Self::from_extension(extension(filename))
    }

    /// Whether the extension maps to a format without going through the default.
    pub fn is_known_extension(ext: &str) -> bool {
        matches!(
            ext.to_lowercase().as_str(),
            "pdf" | "docx" | "pptx" | "odt" | "odp" | "ods" | "txt"
        )
    }
}

fn extension(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Extract page records from an in-memory document.
pub fn extract_bytes(bytes: &[u8], filename: &str) -> Vec<PageRecord> {
    let format = DocumentFormat::from_filename(filename);
    if !DocumentFormat::is_known_extension(extension(filename)) {
        debug!("Unrecognized extension on {}; trying it as PDF", filename);
    }

    let structured = match format {
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
        DocumentFormat::Pptx => pptx::extract(bytes),
        DocumentFormat::OpenDocument => odf::extract(bytes),
        DocumentFormat::PlainText => Ok(text::extract(bytes)),
    };

    match structured {
        Ok(pages) => {
            debug!("Extracted {} pages from {} ({:?})", pages.len(), filename, format);
            pages
        }
        Err(e) => {
            warn!(
                "Structured extraction failed for {} ({:?}): {}. Falling back to flat text.",
                filename, format, e
            );
            let fallback = match format {
                DocumentFormat::Pdf => pdf::dump_text(bytes),
                DocumentFormat::Docx => archive::dump_text(bytes, docx::is_text_part),
                DocumentFormat::Pptx => archive::dump_text(bytes, pptx::is_text_part),
                DocumentFormat::OpenDocument => archive::dump_text(bytes, odf::is_text_part),
                DocumentFormat::PlainText => None,
            };
            if fallback.is_none() {
                warn!("No recoverable text in {}", filename);
            }
            fallback.into_iter().collect()
        }
    }
}

/// Extract page records from a readable, seekable stream.
///
/// The stream is read from its start. Only I/O failures are reported;
/// malformed content yields fewer (possibly zero) records.
pub fn extract<R: Read + Seek>(stream: &mut R, filename: &str) -> io::Result<Vec<PageRecord>> {
    stream.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(extract_bytes(&bytes, filename))
}
