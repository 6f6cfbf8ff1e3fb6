//! Multi-document aggregation: extraction and chunking per input file,
//! provenance tagging, and statistics.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use folio_core::{ChunkingConfig, Error, Result};
use folio_tokenize::TokenCodec;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::chunking::{chunk_pages, TextChunk};
use crate::extract::extract_bytes;
use crate::page::PageRecord;
use crate::stats::{CorpusStats, DocumentStats, TextStats};

/// A readable, seekable document stream and the name it is known by.
///
/// The name drives format detection (by extension) and provenance tagging.
#[derive(Debug)]
pub struct SourceFile<R> {
    pub name: String,
    pub reader: R,
}

impl<R: Read + Seek> SourceFile<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

impl SourceFile<File> {
    /// Open a file on disk, named by its final path component.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = File::open(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self { name, reader })
    }
}

/// Read the whole stream from its start, then put the read position back
/// where the caller left it.
fn read_all<R: Read + Seek>(reader: &mut R) -> io::Result<Vec<u8>> {
    let position = reader.stream_position()?;
    reader.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    let read = reader.read_to_end(&mut bytes);
    reader.seek(SeekFrom::Start(position))?;
    read?;
    Ok(bytes)
}

/// SHA-256 of raw document bytes, hex-encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Drives extraction and chunking over documents, one at a time, in input order.
pub struct Aggregator<'a> {
    codec: &'a dyn TokenCodec,
    config: ChunkingConfig,
}

impl<'a> Aggregator<'a> {
    /// Fails immediately on an invalid configuration.
    pub fn new(codec: &'a dyn TokenCodec, config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { codec, config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Page records of one document.
    pub fn extract_file<R: Read + Seek>(&self, file: &mut SourceFile<R>) -> Result<Vec<PageRecord>> {
        let bytes = read_all(&mut file.reader)?;
        Ok(extract_bytes(&bytes, &file.name))
    }

    /// Chunks of one document, tagged with its name.
    pub fn chunk_file<R: Read + Seek>(&self, file: &mut SourceFile<R>) -> Result<Vec<TextChunk>> {
        let pages = self.extract_file(file)?;
        let mut chunks = chunk_pages(&pages, &self.config, self.codec)?;
        for chunk in &mut chunks {
            chunk.source_document = file.name.clone();
        }
        info!(
            "Chunked {}: {} pages -> {} chunks ({} mode)",
            file.name,
            pages.len(),
            chunks.len(),
            self.config.mode
        );
        Ok(chunks)
    }

    /// Chunks of every document, concatenated in input order.
    pub fn chunk_files<R: Read + Seek>(&self, files: &mut [SourceFile<R>]) -> Result<Vec<TextChunk>> {
        self.chunk_files_with(files, |_, _| true)
    }

    /// Like [`Aggregator::chunk_files`], asking `on_document` before each
    /// document. Returning `false` stops the run with [`Error::Cancelled`].
    pub fn chunk_files_with<R, F>(
        &self,
        files: &mut [SourceFile<R>],
        mut on_document: F,
    ) -> Result<Vec<TextChunk>>
    where
        R: Read + Seek,
        F: FnMut(usize, &str) -> bool,
    {
        let total = files.len();
        let mut all = Vec::new();
        for (index, file) in files.iter_mut().enumerate() {
            if !on_document(index, &file.name) {
                debug!("Stopped before document {} ({})", index, file.name);
                return Err(Error::Cancelled(format!(
                    "stopped before {} ({} of {} documents done)",
                    file.name, index, total
                )));
            }
            all.extend(self.chunk_file(file)?);
        }
        info!("Chunked {} documents into {} chunks", total, all.len());
        Ok(all)
    }

    /// Statistics of one document.
    pub fn file_stats<R: Read + Seek>(&self, file: &mut SourceFile<R>) -> Result<DocumentStats> {
        let bytes = read_all(&mut file.reader)?;
        let pages = extract_bytes(&bytes, &file.name);
        Ok(DocumentStats {
            name: file.name.clone(),
            sha256: content_hash(&bytes),
            stats: TextStats::from_pages(&pages, self.codec),
        })
    }

    /// Statistics of every document plus their totals.
    pub fn corpus_stats<R: Read + Seek>(&self, files: &mut [SourceFile<R>]) -> Result<CorpusStats> {
        let per_document = files
            .iter_mut()
            .map(|file| self.file_stats(file))
            .collect::<Result<Vec<_>>>()?;
        Ok(CorpusStats::from_documents(per_document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CharCodec;
    use folio_core::ChunkMode;
    use std::io::Cursor;

    fn text_file(name: &str, text: &str) -> SourceFile<Cursor<Vec<u8>>> {
        SourceFile::new(name, Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = ChunkingConfig {
            overlap_tokens: 500,
            max_tokens: 500,
            ..ChunkingConfig::default()
        };
        assert!(matches!(Aggregator::new(&CharCodec, config), Err(Error::Config(_))));
    }

    #[test]
    fn test_chunks_are_tagged_in_input_order() {
        let aggregator = Aggregator::new(&CharCodec, ChunkingConfig::default()).unwrap();
        assert_eq!(aggregator.config().mode, ChunkMode::Page);
        let mut files = vec![text_file("one.txt", "first"), text_file("two.txt", "second")];
        let chunks = aggregator.chunk_files(&mut files).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source_document, "one.txt");
        assert_eq!(chunks[1].source_document, "two.txt");
        assert_eq!(chunks[1].text, "second");
    }

    #[test]
    fn test_stream_position_is_restored() {
        let aggregator = Aggregator::new(&CharCodec, ChunkingConfig::default()).unwrap();
        let mut file = text_file("notes.txt", "some notes");
        file.reader.set_position(4);

        let stats = aggregator.file_stats(&mut file).unwrap();
        assert_eq!(file.reader.position(), 4);
        let chunks = aggregator.chunk_file(&mut file).unwrap();
        assert_eq!(file.reader.position(), 4);

        assert_eq!(stats.stats.total_chars, 10);
        assert_eq!(chunks[0].text, "some notes");
    }

    #[test]
    fn test_cancellation_between_documents() {
        let config = ChunkingConfig {
            mode: ChunkMode::Token,
            ..ChunkingConfig::default()
        };
        let aggregator = Aggregator::new(&CharCodec, config).unwrap();
        let mut files = vec![text_file("a.txt", "alpha"), text_file("b.txt", "beta")];

        let mut seen = Vec::new();
        let result = aggregator.chunk_files_with(&mut files, |index, name| {
            seen.push(name.to_string());
            index == 0
        });
        assert!(matches!(result, Err(Error::Cancelled(_))));
        assert_eq!(seen, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_corpus_stats_fingerprints_documents() {
        let aggregator = Aggregator::new(&CharCodec, ChunkingConfig::default()).unwrap();
        let mut files = vec![
            text_file("a.txt", "same"),
            text_file("b.txt", "same"),
            text_file("empty.txt", "   "),
        ];
        let corpus = aggregator.corpus_stats(&mut files).unwrap();
        assert_eq!(corpus.num_documents, 3);
        assert_eq!(corpus.totals.num_pages, 2);
        assert_eq!(corpus.per_document[0].sha256, corpus.per_document[1].sha256);
        assert_ne!(corpus.per_document[0].sha256, corpus.per_document[2].sha256);
        assert_eq!(corpus.per_document[2].stats, TextStats::default());
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
