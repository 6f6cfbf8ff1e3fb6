//! Folio Core — error type and chunking configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{ChunkMode, ChunkingConfig, FolioConfig};
pub use error::{Error, Result};
