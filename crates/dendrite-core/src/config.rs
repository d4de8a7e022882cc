//! Chunking configuration.

use serde::{Deserialize, Serialize};

/// Semantic boundary preferred when splitting oversized nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitUnit {
    #[default]
    Sentence,
    Word,
    Paragraph,
}

/// Configuration for the chunking engine.
///
/// Out-of-range values are clamped, not rejected: construction sites call
/// [`ChunkingConfig::normalized`], which enforces
///
/// - `max_tokens_per_chunk >= 64`
/// - `min_tokens_per_chunk <= max / 4`
/// - `overlap_tokens <= max / 4`
/// - `quality_threshold` in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Hard upper bound on chunk token count.
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_chunk: usize,

    /// Chunks below this are discarded in post-filtering.
    #[serde(default = "default_min_tokens")]
    pub min_tokens_per_chunk: usize,

    /// Tokens of trailing context prepended when a node is split.
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,

    /// Boundary unit for large-node splitting.
    #[serde(default)]
    pub split_unit: SplitUnit,

    /// Prepend overlap text to split continuations.
    #[serde(default = "default_true")]
    pub preserve_context: bool,

    /// Chunks scoring below this are discarded in post-filtering.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Route tables and code blocks through specialized handlers.
    #[serde(default = "default_true")]
    pub enable_special_handling: bool,
}

fn default_max_tokens() -> usize {
    512
}

fn default_min_tokens() -> usize {
    32
}

fn default_overlap_tokens() -> usize {
    32
}

fn default_quality_threshold() -> f64 {
    0.7
}

fn default_true() -> bool {
    true
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: default_max_tokens(),
            min_tokens_per_chunk: default_min_tokens(),
            overlap_tokens: default_overlap_tokens(),
            split_unit: SplitUnit::default(),
            preserve_context: true,
            quality_threshold: default_quality_threshold(),
            enable_special_handling: true,
        }
    }
}

impl ChunkingConfig {
    /// Apply the documented clamps, returning a config the engine can trust.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let max_tokens_per_chunk = self.max_tokens_per_chunk.max(64);
        Self {
            max_tokens_per_chunk,
            min_tokens_per_chunk: self.min_tokens_per_chunk.min(max_tokens_per_chunk / 4),
            overlap_tokens: self.overlap_tokens.min(max_tokens_per_chunk / 4),
            split_unit: self.split_unit,
            preserve_context: self.preserve_context,
            quality_threshold: self.quality_threshold.clamp(0.0, 1.0),
            enable_special_handling: self.enable_special_handling,
        }
    }
}
