//! Document and corpus statistics.

use folio_tokenize::TokenCodec;
use serde::{Deserialize, Serialize};

use crate::page::{full_text, PageRecord};

/// Size figures for one document, or summed over several.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub num_pages: usize,
    pub total_chars: usize,
    pub total_tokens: usize,
    pub avg_tokens_per_page: usize,
}

impl TextStats {
    /// Measure the full text of `pages` (page texts joined by a blank line).
    pub fn from_pages(pages: &[PageRecord], codec: &dyn TokenCodec) -> Self {
        let text = full_text(pages);
        Self::new(pages.len(), text.chars().count(), codec.count(&text))
    }

    pub fn new(num_pages: usize, total_chars: usize, total_tokens: usize) -> Self {
        Self {
            num_pages,
            total_chars,
            total_tokens,
            avg_tokens_per_page: total_tokens / num_pages.max(1),
        }
    }
}

/// Statistics of one named document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub name: String,
    /// Hex SHA-256 of the raw document bytes.
    pub sha256: String,
    #[serde(flatten)]
    pub stats: TextStats,
}

/// Totals over several documents plus the per-document breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    #[serde(flatten)]
    pub totals: TextStats,
    pub num_documents: usize,
    pub per_document: Vec<DocumentStats>,
}

impl CorpusStats {
    pub fn from_documents(per_document: Vec<DocumentStats>) -> Self {
        let (pages, chars, tokens) = per_document.iter().fold((0, 0, 0), |acc, doc| {
            (
                acc.0 + doc.stats.num_pages,
                acc.1 + doc.stats.total_chars,
                acc.2 + doc.stats.total_tokens,
            )
        });
        Self {
            totals: TextStats::new(pages, chars, tokens),
            num_documents: per_document.len(),
            per_document,
        }
    }
}
