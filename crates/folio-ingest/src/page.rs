//! Page records and the running page buffer used by flow-based formats.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One unit of extracted text tied to a page, slide, section or table.
///
/// Page numbers follow the source format's native ordering. Units that yield
/// no text are dropped rather than recorded empty, so numbers may skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: u32,
    pub text: String,
}

impl PageRecord {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// Accumulates paragraphs for the page currently being read.
///
/// Formats without a physical page model (word-processor flows) push
/// paragraphs as they are read and call [`PageBuffer::flush`] on every page
/// break signal. A flush over an empty buffer emits nothing and does not
/// advance the page counter.
#[derive(Debug)]
pub struct PageBuffer {
    parts: Vec<String>,
    next_page: u32,
}

impl PageBuffer {
    /// Paragraphs of a page are joined with a blank line.
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            next_page: 1,
        }
    }

    /// Append one paragraph (or paragraph fragment). Blank text is ignored.
    pub fn push(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.parts.push(text.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Close the current page and start a new one.
    pub fn flush(&mut self) -> Option<PageRecord> {
        let text = self.parts.join("\n\n").trim().to_string();
        self.parts.clear();
        if text.is_empty() {
            return None;
        }
        let record = PageRecord::new(self.next_page, text);
        self.next_page += 1;
        Some(record)
    }
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HORIZONTAL_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize extracted text: collapse horizontal whitespace, trim every line,
/// and reduce three or more line breaks to a single blank line.
pub fn clean_text(raw: &str) -> String {
    let collapsed = HORIZONTAL_SPACE_RE.replace_all(raw, " ");
    let lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES_RE.replace_all(&joined, "\n\n").trim().to_string()
}

/// Flatten extracted text onto one line: every whitespace run, line breaks
/// included, becomes a single space.
pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw, " ").trim().to_string()
}

/// Full document text: page texts joined by a blank line.
pub fn full_text(pages: &[PageRecord]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
