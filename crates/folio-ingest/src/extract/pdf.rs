//! PDF extraction: one page record per physical page.
//!
//! Page text is flattened onto a single line, since PDF line breaks follow
//! the layout rather than the prose.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use tracing::debug;

use super::ExtractError;
use crate::page::{collapse_whitespace, PageRecord};

pub(crate) fn extract(bytes: &[u8]) -> Result<Vec<PageRecord>, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    // BTreeMap: ascending page numbers.
    let outcomes = doc.get_pages().into_keys().map(|number| {
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[number])));
        let outcome = match extracted {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("text decoder panicked".to_string()),
        };
        (number, outcome)
    });
    collect_pages(outcomes)
}

/// Keep the pages that yielded text. A document where every page failed is
/// an error, so the caller falls back to the flat dump.
fn collect_pages<I>(outcomes: I) -> Result<Vec<PageRecord>, ExtractError>
where
    I: IntoIterator<Item = (u32, Result<String, String>)>,
{
    let mut pages = Vec::new();
    let mut failed = 0usize;
    let mut succeeded = 0usize;

    for (number, outcome) in outcomes {
        match outcome {
            Ok(raw) => {
                succeeded += 1;
                let text = collapse_whitespace(&raw);
                if text.is_empty() {
                    debug!("PDF page {} has no text", number);
                } else {
                    pages.push(PageRecord::new(number, text));
                }
            }
            Err(e) => {
                failed += 1;
                debug!("Skipping PDF page {}: {}", number, e);
            }
        }
    }

    if succeeded == 0 && failed > 0 {
        return Err(ExtractError::Pdf(format!("text extraction failed on all {} pages", failed)));
    }
    Ok(pages)
}

/// Flat dump of whatever text `pdf-extract` can recover, as a single page.
pub(crate) fn dump_text(bytes: &[u8]) -> Option<PageRecord> {
    let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match extracted {
        Ok(Ok(raw)) => {
            let text = collapse_whitespace(&raw);
            (!text.is_empty()).then(|| PageRecord::new(1, text))
        }
        Ok(Err(e)) => {
            debug!("pdf-extract fallback failed: {}", e);
            None
        }
        Err(_) => {
            debug!("pdf-extract fallback panicked");
            None
        }
    }
}
