//! # dendrite-chunker
//!
//! The chunking engine: a single-pass, stateful traversal that turns a
//! semantic node tree into bounded, breadcrumbed, quality-scored chunks.
//!
//! The engine buffers nodes up to the token budget, switches breadcrumbs on
//! headings, diverts tables and code blocks to specialized handlers, splits
//! oversized nodes at semantic boundaries with optional overlap, and
//! post-filters on quality and minimum size. All token accounting goes
//! through the [`Tokenizer`](dendrite_core::Tokenizer) trait.

mod engine;
mod quality;
mod special;
mod splitter;

pub use engine::ChunkingEngine;
