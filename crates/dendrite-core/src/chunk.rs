//! Chunks, breadcrumbs, and the processed-document aggregate.

use crate::id::{ChunkId, DocumentId, NodeId, TokenCount};
use crate::metadata::DocumentMetadata;
use crate::node::SemanticNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Hierarchical location of a chunk: an ordered list of non-empty labels
/// (heading titles plus synthetic labels like `"Table"` or `"Part 2"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breadcrumb(Vec<String>);

impl Breadcrumb {
    #[must_use]
    pub fn root(component: impl Into<String>) -> Self {
        Self::default().child(component)
    }

    /// A new breadcrumb with `component` appended. Blank components are
    /// ignored; breadcrumbs never contain empty labels.
    #[must_use]
    pub fn child(&self, component: impl Into<String>) -> Self {
        let mut components = self.0.clone();
        let component = component.into();
        if !component.trim().is_empty() {
            components.push(component);
        }
        Self(components)
    }

    pub fn push(&mut self, component: impl Into<String>) {
        let component = component.into();
        if !component.trim().is_empty() {
            self.0.push(component);
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" > "))
    }
}

impl From<Vec<String>> for Breadcrumb {
    fn from(components: Vec<String>) -> Self {
        components
            .into_iter()
            .fold(Self::default(), |b, c| b.child(c))
    }
}

/// A bounded, immutable slice of document text with provenance.
///
/// The unit of embedding: content plus enough context (breadcrumb, metadata
/// handle, source-node IDs) to stay meaningful in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: DocumentId,
    pub content: String,
    pub token_count: TokenCount,
    pub breadcrumb: Breadcrumb,
    /// IDs of the semantic nodes this chunk was assembled from.
    pub source_node_ids: BTreeSet<NodeId>,
    /// Shared handle to the owning document's metadata.
    pub metadata: Arc<DocumentMetadata>,
    pub created_at: DateTime<Utc>,
    /// Heuristic quality in [0, 1], used for post-filtering.
    pub quality_score: f64,
}

impl Chunk {
    /// Check the chunk invariants: non-blank content, positive token count,
    /// score in range, valid metadata.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.content.trim().is_empty()
            && !self.token_count.is_zero()
            && (0.0..=1.0).contains(&self.quality_score)
            && self.metadata.is_valid()
    }
}

/// Statistics accumulated over one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Monotonic wall-clock time spent in parse + chunk.
    pub processing_time: Duration,
    pub total_token_count: TokenCount,
    pub chunk_count: usize,
    /// Integer average; zero when no chunks survived.
    pub average_tokens_per_chunk: TokenCount,
}

impl ProcessingStats {
    #[must_use]
    pub fn from_chunks(chunks: &[Chunk], processing_time: Duration) -> Self {
        let total_token_count: TokenCount = chunks.iter().map(|c| c.token_count).sum();
        let chunk_count = chunks.len();
        let average_tokens_per_chunk = if chunk_count == 0 {
            TokenCount::ZERO
        } else {
            TokenCount(total_token_count.get() / chunk_count)
        };
        Self {
            processing_time,
            total_token_count,
            chunk_count,
            average_tokens_per_chunk,
        }
    }
}

/// The aggregate output of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub document_id: DocumentId,
    pub metadata: Arc<DocumentMetadata>,
    /// The full semantic tree the chunks were derived from.
    pub nodes: Vec<SemanticNode>,
    pub chunks: Vec<Chunk>,
    pub statistics: ProcessingStats,
}
