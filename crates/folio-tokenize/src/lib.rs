//! Folio Tokenize — the token codec shared by every chunking call.
//!
//! Provides the `TokenCodec` trait for counting, encoding and decoding.
//! `TiktokenCodec` is always available; when the `hf` feature is enabled and
//! a `tokenizer.json` path is configured, `HfTokenizerCodec` is used instead.

pub mod codec;
pub mod hf_codec;
pub mod tiktoken_codec;

pub use codec::TokenCodec;
pub use tiktoken_codec::{TiktokenCodec, SUPPORTED_ENCODINGS};

#[cfg(feature = "hf")]
pub use hf_codec::HfTokenizerCodec;

use std::path::Path;
use std::sync::Arc;

use folio_core::Result;

/// Create the codec for the given configuration.
///
/// Tries the HuggingFace tokenizer first (if the feature is enabled and a
/// path is given), falls back to the named tiktoken encoding.
pub fn create_codec(encoding: &str, tokenizer_path: Option<&Path>) -> Result<Arc<dyn TokenCodec>> {
    if let Some(path) = tokenizer_path {
        #[cfg(feature = "hf")]
        {
            match HfTokenizerCodec::load(path) {
                Ok(codec) => return Ok(Arc::new(codec)),
                Err(e) => {
                    tracing::warn!("HuggingFace tokenizer unavailable: {}. Falling back to {}.", e, encoding);
                }
            }
        }

        #[cfg(not(feature = "hf"))]
        {
            tracing::warn!(
                "hf feature disabled; ignoring tokenizer {} and using {}",
                path.display(),
                encoding
            );
        }
    }

    Ok(Arc::new(TiktokenCodec::new(encoding)?))
}
