//! Chunking: page records to bounded, page-attributed text chunks.
//!
//! Three strategies, selected by [`ChunkMode`]:
//! - page-aligned: one chunk per non-empty page
//! - paragraph: one chunk per blank-line separated block of each page
//! - token-window: fixed-size windows with overlap over the whole document,
//!   encoded once and attributed to pages by character span
//!
//! An optional normalization pass merges undersized chunks and splits
//! oversized ones.

use std::ops::Range;

use folio_core::{ChunkMode, ChunkingConfig, Error, Result};
use folio_tokenize::TokenCodec;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page::PageRecord;

/// Paragraph blocks shorter than this (in characters) are dropped.
pub const MIN_PARAGRAPH_CHARS: usize = 20;
/// Chunks below this many tokens are merged by [`normalize_chunks`].
pub const MIN_CHUNK_TOKENS: usize = 100;

/// A bounded unit of text handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Trimmed, never empty.
    pub text: String,
    /// Ascending in page/paragraph modes; first-seen order in token mode.
    pub source_pages: Vec<u32>,
    pub token_count: usize,
    /// Identifier of the originating document; empty until tagged.
    #[serde(default)]
    pub source_document: String,
}

impl TextChunk {
    pub fn new(text: impl Into<String>, source_pages: Vec<u32>, token_count: usize) -> Self {
        Self {
            text: text.into(),
            source_pages,
            token_count,
            source_document: String::new(),
        }
    }
}

/// Half-open character span `[start, end)` occupied by one page in the
/// concatenated document text. Character offsets count Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub page: u32,
    pub start: usize,
    pub end: usize,
}

impl PageSpan {
    /// Strict interval overlap with `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start.max(start) < self.end.min(end)
    }
}

/// Chunk pages according to `config`.
pub fn chunk_pages(
    pages: &[PageRecord],
    config: &ChunkingConfig,
    codec: &dyn TokenCodec,
) -> Result<Vec<TextChunk>> {
    config.validate()?;

    let chunks = match config.mode {
        ChunkMode::Page => split_into_pages(pages, codec),
        ChunkMode::Paragraph => split_into_paragraphs(pages, codec),
        ChunkMode::Token => {
            chunk_by_tokens(pages, config.max_tokens, config.overlap_tokens, codec)?
        }
    };

    if config.normalize {
        Ok(normalize_chunks(chunks, config.max_tokens, codec))
    } else {
        Ok(chunks)
    }
}

/// One chunk per page with non-empty trimmed text, in page order.
pub fn split_into_pages(pages: &[PageRecord], codec: &dyn TokenCodec) -> Vec<TextChunk> {
    pages
        .iter()
        .filter_map(|page| {
            let text = page.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TextChunk::new(text, vec![page.page_number], codec.count(text)))
        })
        .collect()
}

static PARAGRAPH_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());

/// One chunk per blank-line separated block longer than
/// [`MIN_PARAGRAPH_CHARS`] characters.
pub fn split_into_paragraphs(pages: &[PageRecord], codec: &dyn TokenCodec) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    for page in pages {
        for part in PARAGRAPH_SPLIT_RE.split(&page.text) {
            let part = part.trim();
            if part.chars().count() > MIN_PARAGRAPH_CHARS {
                chunks.push(TextChunk::new(part, vec![page.page_number], codec.count(part)));
            }
        }
    }
    chunks
}

/// Concatenate pages between numbered begin/end markers.
///
/// Each span covers the page's markers as well as its text, so the spans
/// tile the returned string without gaps.
pub fn concatenate_pages(pages: &[PageRecord]) -> (String, Vec<PageSpan>) {
    let mut full = String::new();
    let mut spans = Vec::with_capacity(pages.len());
    let mut offset = 0usize;

    for page in pages {
        let content = format!(
            "\n\n[Page {n} start]\n{}\n[Page {n} end]",
            page.text,
            n = page.page_number
        );
        let len = content.chars().count();
        spans.push(PageSpan {
            page: page.page_number,
            start: offset,
            end: offset + len,
        });
        full.push_str(&content);
        offset += len;
    }

    (full, spans)
}

/// Token ranges of successive windows over `total` tokens.
///
/// Each window holds at most `max_tokens` tokens; the next one starts
/// `overlap_tokens` before the previous end. Requires
/// `overlap_tokens < max_tokens`.
pub fn window_ranges(total: usize, max_tokens: usize, overlap_tokens: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    if total == 0 || max_tokens == 0 || overlap_tokens >= max_tokens {
        return ranges;
    }

    let mut start = 0;
    loop {
        let end = (start + max_tokens).min(total);
        ranges.push(start..end);
        if end == total {
            break;
        }
        start = end - overlap_tokens;
    }
    ranges
}

/// Character offset, in the decoded document, at which each window starts.
///
/// Equals `decode(&tokens[..range.start]).chars().count()` for every range,
/// but decodes each token only once: the prefix grows by the bytes between
/// consecutive window starts, and characters are counted as UTF-8 lead
/// bytes. A character cut by the prefix end counts once, matching the single
/// U+FFFD a lossy decode renders for it. Ranges must be sorted by start.
pub fn window_char_starts(
    tokens: &[u32],
    ranges: &[Range<usize>],
    codec: &dyn TokenCodec,
) -> Vec<usize> {
    let mut starts = Vec::with_capacity(ranges.len());
    let mut decoded_upto = 0;
    let mut chars = 0;
    for range in ranges {
        let delta = codec.decode_bytes(&tokens[decoded_upto..range.start]);
        chars += delta.iter().filter(|&&b| b & 0xC0 != 0x80).count();
        decoded_upto = range.start;
        starts.push(chars);
    }
    starts
}

/// Fixed-size token windows with overlap across all pages.
///
/// The document is encoded once. Each window's text is the decoded token
/// slice; its character span starts at the decoded length of the prefix
/// before the window, and every page whose span strictly overlaps it is
/// listed in first-seen order. Windows that decode to whitespace only are
/// skipped.
pub fn chunk_by_tokens(
    pages: &[PageRecord],
    max_tokens: usize,
    overlap_tokens: usize,
    codec: &dyn TokenCodec,
) -> Result<Vec<TextChunk>> {
    if max_tokens == 0 {
        return Err(Error::Config("max_tokens must be positive".to_string()));
    }
    if overlap_tokens >= max_tokens {
        return Err(Error::Config(format!(
            "overlap_tokens ({}) must be smaller than max_tokens ({})",
            overlap_tokens, max_tokens
        )));
    }

    let (full, spans) = concatenate_pages(pages);
    let tokens = codec.encode(&full);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let ranges = window_ranges(tokens.len(), max_tokens, overlap_tokens);
    debug!(
        "Token windows: {} tokens, {} windows of at most {} (overlap {})",
        tokens.len(),
        ranges.len(),
        max_tokens,
        overlap_tokens
    );

    let starts = window_char_starts(&tokens, &ranges, codec);
    let mut chunks = Vec::with_capacity(ranges.len());
    for (range, char_start) in ranges.into_iter().zip(starts) {
        let slice = &tokens[range.clone()];
        let window = codec.decode(slice);
        let char_end = char_start + window.chars().count();

        let mut source_pages: Vec<u32> = Vec::new();
        for span in spans.iter().filter(|s| s.overlaps(char_start, char_end)) {
            if !source_pages.contains(&span.page) {
                source_pages.push(span.page);
            }
        }

        let text = window.trim();
        if text.is_empty() {
            debug!("Skipping blank window at tokens {:?}", range);
            continue;
        }
        chunks.push(TextChunk::new(text, source_pages, slice.len()));
    }
    Ok(chunks)
}

/// Pending small chunks waiting to be merged.
#[derive(Default)]
struct MergeBuffer {
    text: String,
    pages: Vec<u32>,
}

impl MergeBuffer {
    fn append(&mut self, chunk: &TextChunk) {
        self.text.push(' ');
        self.text.push_str(&chunk.text);
        self.pages.extend_from_slice(&chunk.source_pages);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn take(&mut self, codec: &dyn TokenCodec) -> Option<TextChunk> {
        let text = std::mem::take(&mut self.text);
        let mut pages = std::mem::take(&mut self.pages);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        pages.sort_unstable();
        pages.dedup();
        Some(TextChunk::new(text, pages, codec.count(text)))
    }
}

/// Merge chunks under [`MIN_CHUNK_TOKENS`] and split chunks over `max_tokens`.
///
/// Small chunks are space-joined into a buffer that is emitted once it
/// reaches the minimum, or together with the next regular chunk. Oversized
/// chunks are split greedily on whitespace into pieces of at most
/// `max_tokens` tokens (a single word larger than that stays whole).
pub fn normalize_chunks(
    chunks: Vec<TextChunk>,
    max_tokens: usize,
    codec: &dyn TokenCodec,
) -> Vec<TextChunk> {
    let mut out = Vec::with_capacity(chunks.len());
    let mut buffer = MergeBuffer::default();

    for chunk in chunks {
        if chunk.token_count > max_tokens {
            out.extend(buffer.take(codec));
            split_oversized(&chunk, max_tokens, codec, &mut out);
        } else if chunk.token_count < MIN_CHUNK_TOKENS {
            buffer.append(&chunk);
            if codec.count(buffer.text.trim()) >= MIN_CHUNK_TOKENS {
                out.extend(buffer.take(codec));
            }
        } else if !buffer.is_empty() {
            buffer.append(&chunk);
            out.extend(buffer.take(codec));
        } else {
            out.push(chunk);
        }
    }
    out.extend(buffer.take(codec));
    out
}

fn split_oversized(
    chunk: &TextChunk,
    max_tokens: usize,
    codec: &dyn TokenCodec,
    out: &mut Vec<TextChunk>,
) {
    let mut current = String::new();
    for word in chunk.text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if codec.count(&candidate) > max_tokens && !current.is_empty() {
            let piece = std::mem::replace(&mut current, word.to_string());
            out.push(TextChunk::new(
                piece.as_str(),
                chunk.source_pages.clone(),
                codec.count(&piece),
            ));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        let count = codec.count(&current);
        out.push(TextChunk::new(current, chunk.source_pages.clone(), count));
    }
}
