//! # dendrite
//!
//! Document preprocessing for Retrieval-Augmented Generation.
//!
//! Dendrite accepts a document's bytes, normalizes them into a canonical
//! semantic tree with deterministic, content-addressed identity, and then
//! decomposes that tree into bounded, context-rich chunks with hierarchical
//! breadcrumbs, quality scores, and stable identifiers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dendrite::{DendriteConfig, Pipeline};
//! use dendrite_core::DocumentId;
//! use dendrite_tokenizer::WordTokenizer;
//!
//! # async fn run() -> dendrite_core::Result<()> {
//! let pipeline = Pipeline::new(DendriteConfig::default());
//! let processed = pipeline
//!     .process_bytes(
//!         b"# Hello\n\nSome text.",
//!         "md",
//!         DocumentId::new("hello.md"),
//!         Arc::new(WordTokenizer::new()),
//!     )
//!     .await?;
//! for chunk in &processed.chunks {
//!     println!("[{}] {}", chunk.breadcrumb, chunk.content);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod pipeline;

pub use config::DendriteConfig;
pub use pipeline::Pipeline;

pub use dendrite_chunker::ChunkingEngine;
pub use dendrite_core::{
    Breadcrumb, Chunk, ChunkingConfig, DocumentId, Error, ProcessedDocument, Result, SplitUnit,
};
pub use dendrite_parsers::ParserRegistry;
pub use dendrite_tokenizer::WordTokenizer;
