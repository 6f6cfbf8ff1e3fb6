//! Folio Ingest — document extraction, chunking and aggregation.
//!
//! Raw document bytes become ordered [`PageRecord`]s (one per page, slide,
//! table or flowed section), which the chunkers turn into bounded
//! [`TextChunk`]s with page provenance. The [`Aggregator`] runs both over a
//! list of documents and produces statistics.

pub mod aggregate;
pub mod chunking;
pub mod extract;
pub mod page;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{content_hash, Aggregator, SourceFile};
pub use chunking::{
    chunk_by_tokens, chunk_pages, normalize_chunks, split_into_pages, split_into_paragraphs,
    TextChunk,
};
pub use extract::{extract, extract_bytes, DocumentFormat};
pub use page::{clean_text, full_text, PageBuffer, PageRecord};
pub use stats::{CorpusStats, DocumentStats, TextStats};
