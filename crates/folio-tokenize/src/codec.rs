//! Token codec trait.
//!
//! The `TokenCodec` trait abstracts over the subword tokenizer used for
//! budgeting and windowing. Implementations:
//! - `TiktokenCodec`: OpenAI BPE encodings via `tiktoken-rs` (default)
//! - `HfTokenizerCodec`: a HuggingFace `tokenizer.json` (requires the `hf` feature)

/// Count / encode / decode over one tokenizer vocabulary.
///
/// Implementations must be deterministic: the same text always encodes to the
/// same ids, and decoding a slice of ids always yields the same string.
pub trait TokenCodec: Send + Sync {
    /// Encode text into token ids. Never fails; special-token strings found in
    /// the text are encoded as ordinary text.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text.
    ///
    /// Lossy: a slice that cuts through a multi-byte character renders the
    /// partial bytes as U+FFFD instead of failing.
    fn decode(&self, ids: &[u32]) -> String;

    /// Raw UTF-8 bytes of `ids`, without replacing partial characters.
    ///
    /// Byte-level backends override this so that consecutive slices
    /// concatenate to exactly the bytes of the whole sequence.
    fn decode_bytes(&self, ids: &[u32]) -> Vec<u8> {
        self.decode(ids).into_bytes()
    }

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Human-readable backend name, for logs.
    fn name(&self) -> &str;
}
