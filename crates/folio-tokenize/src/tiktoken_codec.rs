//! tiktoken BPE codec.
//!
//! Loads one of the OpenAI BPE vocabularies bundled with `tiktoken-rs`.
//! Construction parses the merge table, so build one instance at startup and
//! share it.

use tiktoken_rs::CoreBPE;
use tracing::info;

use folio_core::{Error, Result};

use crate::codec::TokenCodec;

/// Encodings accepted by [`TiktokenCodec::new`].
pub const SUPPORTED_ENCODINGS: &[&str] = &["cl100k_base", "o200k_base", "p50k_base", "r50k_base"];

/// Token codec backed by a tiktoken vocabulary.
pub struct TiktokenCodec {
    bpe: CoreBPE,
    encoding: String,
}

impl TiktokenCodec {
    /// Load the named encoding (`cl100k_base`, `o200k_base`, `p50k_base`, `r50k_base`).
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
            other => {
                return Err(Error::Tokenizer(format!(
                    "unsupported tiktoken encoding: {} (expected one of {})",
                    other,
                    SUPPORTED_ENCODINGS.join(", ")
                )))
            }
        }
        .map_err(|e| Error::Tokenizer(format!("Failed to load {}: {}", encoding, e)))?;

        info!("tiktoken codec loaded: encoding={}", encoding);

        Ok(Self {
            bpe,
            encoding: encoding.to_string(),
        })
    }

    /// The default `cl100k_base` encoding.
    pub fn cl100k() -> Result<Self> {
        Self::new("cl100k_base")
    }
}

impl TokenCodec for TiktokenCodec {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|id| id as u32)
            .collect()
    }

    fn decode(&self, ids: &[u32]) -> String {
        // Byte-level join first: a window boundary may fall inside a
        // multi-byte character, which the strict decoder rejects.
        String::from_utf8_lossy(&self.decode_bytes(ids)).into_owned()
    }

    fn decode_bytes(&self, ids: &[u32]) -> Vec<u8> {
        self.bpe
            ._decode_native_and_split(ids.iter().map(|&id| id as _).collect())
            .flatten()
            .collect()
    }

    fn name(&self) -> &str {
        &self.encoding
    }
}
