//! Deterministic character-level codec for unit tests: one token per char.

use folio_tokenize::TokenCodec;

pub(crate) struct CharCodec;

impl TokenCodec for CharCodec {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .map(|&id| char::from_u32(id).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    fn name(&self) -> &str {
        "chars"
    }
}
