//! # dendrite-core
//!
//! Core types and traits for Dendrite, a document preprocessing engine for
//! Retrieval-Augmented Generation.
//!
//! Dendrite turns source bytes (Markdown, HTML, plain text, PDF) into a
//! canonical semantic tree with deterministic identity, then decomposes that
//! tree into bounded, context-rich chunks. This crate provides the shared
//! vocabulary:
//!
//! - **Identity**: [`DocumentId`], [`NodeId`] (content-addressed SHA-256),
//!   [`ChunkId`], [`TokenCount`]
//! - **IR**: [`SemanticNode`] / [`InlineNode`] with pure projections
//! - **Metadata**: [`DocumentMetadata`], [`SourceDetails`], [`MetadataBuilder`]
//! - **Output**: [`Chunk`], [`Breadcrumb`], [`ProcessedDocument`]
//! - **Traits**: [`Tokenizer`] and [`DocumentParser`]
//! - **Errors**: the [`Error`] taxonomy
//!
//! ## Architecture
//!
//! ```text
//! bytes → DocumentParser → Vec<SemanticNode> → ChunkingEngine → Vec<Chunk>
//!                              (dendrite-parsers)   (dendrite-chunker)
//! ```
//!
//! ## Related crates
//!
//! - `dendrite-parsers`: parser implementations and ordered dispatch
//! - `dendrite-tokenizer`: default word-boundary tokenizer
//! - `dendrite-chunker`: the chunking engine
//! - `dendrite`: the pipeline orchestrator and CLI

pub mod chunk;
pub mod config;
pub mod error;
pub mod id;
pub mod metadata;
pub mod node;
pub mod traits;

pub use chunk::{Breadcrumb, Chunk, ProcessedDocument, ProcessingStats};
pub use config::{ChunkingConfig, SplitUnit};
pub use error::{ChunkError, Error, ParseError, Result, TokenizeError};
pub use id::{ChunkId, DocumentId, NodeId, TokenCount};
pub use metadata::{
    DocumentMetadata, LineEnding, MetadataBuilder, OutlineEntry, SourceDetails,
};
pub use node::{inline_text, InlineNode, SemanticNode, Span};
pub use traits::{DocumentParser, ParsedDocument, Tokenizer, TokenizerInfo};
