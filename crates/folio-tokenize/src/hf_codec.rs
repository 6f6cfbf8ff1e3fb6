//! HuggingFace `tokenizer.json` codec. Requires the `hf` feature.

#[cfg(feature = "hf")]
mod inner {
    use std::path::Path;

    use tokenizers::Tokenizer;
    use tracing::{info, warn};

    use folio_core::{Error, Result};

    use crate::codec::TokenCodec;

    /// Token codec backed by a HuggingFace tokenizer.
    pub struct HfTokenizerCodec {
        tokenizer: Tokenizer,
        name: String,
    }

    impl HfTokenizerCodec {
        /// Load a tokenizer from a `tokenizer.json` file.
        pub fn load(path: &Path) -> Result<Self> {
            if !path.exists() {
                return Err(Error::Tokenizer(format!(
                    "Tokenizer not found: {}",
                    path.display()
                )));
            }

            let tokenizer = Tokenizer::from_file(path)
                .map_err(|e| Error::Tokenizer(format!("Failed to load tokenizer: {}", e)))?;

            info!("HuggingFace tokenizer loaded: {}", path.display());

            Ok(Self {
                tokenizer,
                name: path.display().to_string(),
            })
        }
    }

    impl TokenCodec for HfTokenizerCodec {
        fn encode(&self, text: &str) -> Vec<u32> {
            match self.tokenizer.encode(text, false) {
                Ok(encoding) => encoding.get_ids().to_vec(),
                Err(e) => {
                    warn!("Tokenization failed: {}", e);
                    Vec::new()
                }
            }
        }

        fn decode(&self, ids: &[u32]) -> String {
            self.tokenizer.decode(ids, false).unwrap_or_else(|e| {
                warn!("Detokenization failed: {}", e);
                String::new()
            })
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(feature = "hf")]
pub use inner::HfTokenizerCodec;
