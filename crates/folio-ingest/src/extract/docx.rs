//! DOCX extraction.
//!
//! WordprocessingML has no page model, so pages are approximated from two
//! signals: the `w:pageBreakBefore` paragraph property, and break markers
//! inside runs (`w:br w:type="page"` for manual breaks,
//! `w:lastRenderedPageBreak` where Word last laid out a page boundary).

use roxmltree::{Document, Node};
use tracing::debug;

use super::archive::{self, is};
use super::ExtractError;
use crate::page::{PageBuffer, PageRecord};

const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const DOCUMENT_PART: &str = "word/document.xml";

/// Parts searched by the flat-text fallback.
pub(crate) fn is_text_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || (name.starts_with("word/")
            && name.ends_with(".xml")
            && (name.contains("header") || name.contains("footer") || name.contains("notes")))
}

pub(crate) fn extract(bytes: &[u8]) -> Result<Vec<PageRecord>, ExtractError> {
    let mut archive = archive::open(bytes)?;
    let xml = archive::read_part(&mut archive, DOCUMENT_PART)?;
    let doc = Document::parse(&xml)?;
    let body = doc
        .descendants()
        .find(|n| is(*n, W, "body"))
        .ok_or_else(|| ExtractError::MissingPart("w:body".to_string()))?;

    let mut buffer = PageBuffer::new();
    let mut pages = Vec::new();
    let mut all_paragraphs = Vec::new();

    for para in body.children().filter(|n| is(*n, W, "p")) {
        if has_page_break_before(para) {
            pages.extend(buffer.flush());
        }

        let mut current = String::new();
        let mut whole = String::new();
        for run in runs(para) {
            for child in run.children().filter(|n| n.is_element()) {
                match child.tag_name().name() {
                    "t" => {
                        let t = child.text().unwrap_or("");
                        current.push_str(t);
                        whole.push_str(t);
                    }
                    "tab" => {
                        current.push('\t');
                        whole.push('\t');
                    }
                    "br" if child.attribute((W, "type")) == Some("page") => {
                        // Text before the break stays on the page being closed.
                        buffer.push(&current);
                        current.clear();
                        pages.extend(buffer.flush());
                    }
                    "br" | "cr" => {
                        current.push('\n');
                        whole.push('\n');
                    }
                    "lastRenderedPageBreak" => {
                        buffer.push(&current);
                        current.clear();
                        pages.extend(buffer.flush());
                    }
                    _ => {}
                }
            }
        }
        buffer.push(&current);

        let whole = whole.trim();
        if !whole.is_empty() {
            all_paragraphs.push(whole.to_string());
        }
    }

    pages.extend(buffer.flush());

    if pages.is_empty() && !all_paragraphs.is_empty() {
        debug!("No page structure found; collapsing {} paragraphs", all_paragraphs.len());
        pages.push(PageRecord::new(1, all_paragraphs.join("\n\n")));
    }

    Ok(pages)
}

/// `w:pPr/w:pageBreakBefore`, unless explicitly switched off.
fn has_page_break_before(para: Node<'_, '_>) -> bool {
    para.children()
        .filter(|n| is(*n, W, "pPr"))
        .flat_map(|ppr| ppr.children())
        .find(|n| is(*n, W, "pageBreakBefore"))
        .map(|n| !matches!(n.attribute((W, "val")), Some("0") | Some("false") | Some("off")))
        .unwrap_or(false)
}

/// Runs of a paragraph in order, including those wrapped in hyperlinks,
/// smart tags and tracked insertions.
fn runs<'a, 'input>(para: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    let mut out = Vec::new();
    for child in para.children() {
        if is(child, W, "r") {
            out.push(child);
        } else if is(child, W, "hyperlink") || is(child, W, "smartTag") || is(child, W, "ins") {
            out.extend(runs(child));
        }
    }
    out
}
