//! Folio — extract, chunk and measure documents from the command line.
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_core::{ChunkMode, FolioConfig};
use folio_ingest::{Aggregator, SourceFile};
use folio_tokenize::{create_codec, TokenCodec};

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Turn documents into page-attributed text chunks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk documents and print the chunk list.
    Chunk {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        options: Options,
    },
    /// Print per-document and total statistics.
    Stats {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        options: Options,
    },
    /// Print the page records extracted from one document.
    Pages {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

/// Overrides for values otherwise read from `FOLIO_*` variables.
#[derive(Args, Debug, Default)]
struct Options {
    /// page, token or paragraph.
    #[arg(long)]
    mode: Option<ChunkMode>,
    #[arg(long)]
    max_tokens: Option<usize>,
    #[arg(long)]
    overlap_tokens: Option<usize>,
    /// Merge undersized chunks and split oversized ones.
    #[arg(long)]
    normalize: bool,
    /// tiktoken encoding name.
    #[arg(long)]
    encoding: Option<String>,
    /// HuggingFace tokenizer.json (needs the `hf` feature).
    #[arg(long)]
    tokenizer: Option<PathBuf>,
    #[arg(long)]
    pretty: bool,
}

impl Options {
    fn apply(&self, config: &mut FolioConfig) {
        if let Some(mode) = self.mode {
            config.chunking.mode = mode;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.chunking.max_tokens = max_tokens;
        }
        if let Some(overlap_tokens) = self.overlap_tokens {
            config.chunking.overlap_tokens = overlap_tokens;
        }
        if self.normalize {
            config.chunking.normalize = true;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(tokenizer) = &self.tokenizer {
            config.tokenizer_path = Some(tokenizer.clone());
        }
    }
}

fn open_all(paths: &[PathBuf]) -> anyhow::Result<Vec<SourceFile<std::fs::File>>> {
    paths
        .iter()
        .map(|path| SourceFile::open(path).with_context(|| format!("cannot open {}", path.display())))
        .collect()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn resolve_config(options: &Options) -> anyhow::Result<FolioConfig> {
    let mut config = FolioConfig::from_env()?;
    options.apply(&mut config);
    Ok(config)
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Chunk { files, options } => {
            let config = resolve_config(&options)?;
            let codec = create_codec(&config.encoding, config.tokenizer_path.as_deref())?;
            let aggregator = Aggregator::new(codec.as_ref(), config.chunking)?;
            let chunking = aggregator.config();
            info!(
                "Chunking {} documents ({} mode, max {} tokens, overlap {}, codec {})",
                files.len(),
                chunking.mode,
                chunking.max_tokens,
                chunking.overlap_tokens,
                codec.name()
            );

            let mut sources = open_all(&files)?;
            let chunks = aggregator.chunk_files(&mut sources)?;
            print_json(&chunks, options.pretty)
        }
        Command::Stats { files, options } => {
            let config = resolve_config(&options)?;
            let codec = create_codec(&config.encoding, config.tokenizer_path.as_deref())?;
            let aggregator = Aggregator::new(codec.as_ref(), config.chunking)?;

            let mut sources = open_all(&files)?;
            let stats = aggregator.corpus_stats(&mut sources)?;
            print_json(&stats, options.pretty)
        }
        Command::Pages { file, pretty } => {
            let pages = extract_pages(&file)?;
            print_json(&pages, pretty)
        }
    }
}

fn extract_pages(path: &Path) -> anyhow::Result<Vec<folio_ingest::PageRecord>> {
    let mut source = SourceFile::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let pages = folio_ingest::extract(&mut source.reader, &source.name)?;
    info!("{}: {} pages", source.name, pages.len());
    Ok(pages)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli.command)
}
