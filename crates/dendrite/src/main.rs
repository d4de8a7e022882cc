//! # Dendrite CLI
//!
//! Command-line front end for the Dendrite preprocessing pipeline.
//!
//! ```bash
//! # Chunk a document and print the chunks
//! dendrite process notes.md
//!
//! # JSON output with a tighter budget
//! dendrite process manual.pdf --format json --max-tokens 256
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use dendrite::{DendriteConfig, Pipeline, WordTokenizer};
use dendrite_core::ChunkingConfig;

#[derive(Parser)]
#[command(name = "dendrite")]
#[command(about = "Prepare documents for RAG: parse, normalize, chunk")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a document into chunks
    Process {
        /// Input file (md, html, txt, pdf)
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Maximum tokens per chunk
        #[arg(long, default_value_t = 512)]
        max_tokens: usize,

        /// Minimum tokens per chunk (smaller chunks are dropped)
        #[arg(long, default_value_t = 32)]
        min_tokens: usize,

        /// Quality threshold in [0, 1]
        #[arg(long, default_value_t = 0.7)]
        quality_threshold: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialize logging")?;

    match cli.command {
        Commands::Process {
            file,
            format,
            max_tokens,
            min_tokens,
            quality_threshold,
        } => {
            let chunking = ChunkingConfig {
                max_tokens_per_chunk: max_tokens,
                min_tokens_per_chunk: min_tokens,
                quality_threshold,
                ..Default::default()
            };
            let pipeline = Pipeline::new(DendriteConfig {
                chunking,
                ..Default::default()
            });

            let processed = pipeline
                .process_path(&file, Arc::new(WordTokenizer::new()))
                .await
                .with_context(|| format!("processing {} failed", file.display()))?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&processed)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{}: {} chunks, {} tokens ({} avg), {:?}",
                        processed.document_id,
                        processed.statistics.chunk_count,
                        processed.statistics.total_token_count,
                        processed.statistics.average_tokens_per_chunk,
                        processed.statistics.processing_time,
                    );
                    for chunk in &processed.chunks {
                        println!();
                        println!(
                            "── {} [{} tokens, q={:.2}]",
                            chunk.breadcrumb, chunk.token_count, chunk.quality_score
                        );
                        println!("{}", chunk.content);
                    }
                }
            }
        }
    }

    Ok(())
}
