//! Splitting of nodes whose text exceeds the token budget.
//!
//! The tokenizer does the partitioning; this module adds the sentence-aligned
//! overlap between consecutive pieces and emits the `Part n` chunks.

use std::collections::BTreeSet;

use dendrite_core::{ChunkError, SemanticNode, TokenCount};

use crate::engine::DocumentRun;

/// Fallback overlap length when a piece has no sentence boundary.
const OVERLAP_FALLBACK_CHARS: usize = 200;

impl DocumentRun<'_> {
    /// Split an oversized node into `Part 1..n` chunks. The buffer has
    /// already been flushed, so no preceding context leaks into the pieces.
    pub(crate) async fn split_oversized(
        &mut self,
        node: &SemanticNode,
        text: &str,
    ) -> Result<(), ChunkError> {
        let config = self.engine.config();
        let budget = TokenCount(
            config
                .max_tokens_per_chunk
                .saturating_sub(config.overlap_tokens),
        );
        let pieces = self
            .tokenizer()
            .split(text, budget, config.split_unit)
            .await?;

        let base = self.trail.snapshot();
        let importance = node.structural_importance();
        let preserve_context = config.preserve_context;
        let mut previous_tail: Option<String> = None;

        for (i, piece) in pieces.iter().enumerate() {
            let content = match previous_tail.take() {
                Some(tail) if i > 0 => format!("{tail}\n\n{piece}"),
                _ => piece.clone(),
            };

            let mut source_ids = BTreeSet::new();
            source_ids.insert(node.id().clone());
            self.emit(
                content,
                base.child(format!("Part {}", i + 1)),
                source_ids,
                importance,
            )
            .await?;

            if preserve_context {
                previous_tail = Some(self.overlap_tail(piece).await?);
            }
        }
        Ok(())
    }

    /// The trailing slice of `piece` carried into the next part: whole
    /// sentences from the end until the accumulation reaches the overlap
    /// budget, or the last 200 characters when the piece has no sentence
    /// boundary.
    async fn overlap_tail(&self, piece: &str) -> Result<String, ChunkError> {
        let sentences: Vec<&str> = piece.split(". ").collect();
        if sentences.len() < 2 {
            let mut start = piece.len().saturating_sub(OVERLAP_FALLBACK_CHARS);
            while start > 0 && !piece.is_char_boundary(start) {
                start -= 1;
            }
            return Ok(piece[start..].to_string());
        }

        let overlap = TokenCount(self.engine.config().overlap_tokens);
        let mut tail = String::new();
        for sentence in sentences.iter().rev() {
            let candidate = if tail.is_empty() {
                (*sentence).to_string()
            } else {
                format!("{sentence}. {tail}")
            };
            let tokens = self.tokenizer().count_tokens(&candidate).await?;
            // Keep the tail within the overlap budget; a lone sentence that
            // exceeds it is taken whole to stay sentence-aligned.
            if tokens > overlap && !tail.is_empty() {
                break;
            }
            tail = candidate;
            if tokens >= overlap {
                break;
            }
        }
        Ok(tail)
    }
}
