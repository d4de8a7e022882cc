//! # dendrite-tokenizer
//!
//! Default [`Tokenizer`](dendrite_core::Tokenizer) implementation for
//! Dendrite: a deterministic word-boundary tokenizer with no model weights
//! and no I/O. Suitable as a baseline and for tests; production deployments
//! can swap in a subword tokenizer behind the same trait.

pub mod word;

pub use word::WordTokenizer;
