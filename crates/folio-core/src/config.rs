//! Chunking configuration and environment-driven defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default window size in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 10_000;
/// Default number of tokens repeated between consecutive windows.
pub const DEFAULT_OVERLAP_TOKENS: usize = 200;
/// Default tiktoken encoding.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// How extracted pages are turned into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMode {
    /// One chunk per non-empty page.
    #[default]
    Page,
    /// Fixed-size token windows with overlap across the whole document.
    Token,
    /// One chunk per paragraph (blank-line separated block) of each page.
    Paragraph,
}

impl fmt::Display for ChunkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Token => write!(f, "token"),
            Self::Paragraph => write!(f, "paragraph"),
        }
    }
}

impl FromStr for ChunkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "page" | "page-aligned" => Ok(Self::Page),
            "token" | "token-window" => Ok(Self::Token),
            "paragraph" => Ok(Self::Paragraph),
            other => Err(Error::Config(format!("unknown chunking mode: {}", other))),
        }
    }
}

/// Parameters handed to the chunkers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub mode: ChunkMode,
    /// Window size for token mode; split threshold when normalizing.
    pub max_tokens: usize,
    /// Tokens shared by consecutive windows. Must stay below `max_tokens`.
    pub overlap_tokens: usize,
    /// Merge undersized chunks and split oversized ones after chunking.
    pub normalize: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            mode: ChunkMode::Page,
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            normalize: false,
        }
    }
}

impl ChunkingConfig {
    /// Reject window parameters the token chunker cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".to_string()));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(Error::Config(format!(
                "overlap_tokens ({}) must be smaller than max_tokens ({})",
                self.overlap_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}

/// Top-level Folio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioConfig {
    pub chunking: ChunkingConfig,
    /// tiktoken encoding name (`cl100k_base`, `o200k_base`, ...).
    pub encoding: String,
    /// Optional HuggingFace `tokenizer.json`, preferred over `encoding` when set.
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            encoding: DEFAULT_ENCODING.to_string(),
            tokenizer_path: None,
        }
    }
}

impl FolioConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Numbers that fail to parse fall back to their defaults; an unknown
    /// mode is reported since it cannot be guessed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("FOLIO_CHUNK_MODE") {
            Some(raw) => raw.parse()?,
            None => ChunkMode::default(),
        };
        let max_tokens = lookup("FOLIO_MAX_TOKENS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let overlap_tokens = lookup("FOLIO_OVERLAP_TOKENS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_OVERLAP_TOKENS);
        let normalize = lookup("FOLIO_NORMALIZE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let encoding = lookup("FOLIO_ENCODING")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENCODING.to_string());
        let tokenizer_path = lookup("FOLIO_TOKENIZER")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            chunking: ChunkingConfig {
                mode,
                max_tokens,
                overlap_tokens,
                normalize,
            },
            encoding,
            tokenizer_path,
        })
    }
}
