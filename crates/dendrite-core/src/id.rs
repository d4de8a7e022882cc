//! Typed identifiers and deterministic identity.
//!
//! Node identity is content-addressed: a [`NodeId`] is the lowercase hex of
//! `SHA-256(parent_id_or_empty ‖ content)`, so reruns of the same input
//! produce bit-identical IDs on every platform. The wrappers exist to keep
//! document, node, and chunk identifiers from being mixed up at compile time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Identifier of a source document. Caller-supplied, or derived from the
/// file name by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Content-addressed identifier of a semantic node: 64 hex chars of SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Derive the ID for a node from its parent's ID (empty when the node is
    /// a root) and its identity content.
    #[must_use]
    pub fn derive(parent: Option<&NodeId>, content: &str) -> Self {
        let mut hasher = Sha256::new();
        if let Some(parent) = parent {
            hasher.update(parent.0.as_bytes());
        }
        hasher.update(content.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a chunk: `{document_id}_chunk_{index}`, with the index
/// monotonic within one processing run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    #[must_use]
    pub fn new(document_id: &DocumentId, index: usize) -> Self {
        Self(format!("{}_chunk_{}", document_id.as_str(), index))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The monotonic index embedded in the identifier.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.0.rsplit("_chunk_").next().and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-negative token count.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenCount(pub usize);

impl TokenCount {
    pub const ZERO: TokenCount = TokenCount(0);

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn saturating_sub(self, other: TokenCount) -> TokenCount {
        TokenCount(self.0.saturating_sub(other.0))
    }
}

impl Add for TokenCount {
    type Output = TokenCount;

    fn add(self, rhs: TokenCount) -> TokenCount {
        TokenCount(self.0 + rhs.0)
    }
}

impl AddAssign for TokenCount {
    fn add_assign(&mut self, rhs: TokenCount) {
        self.0 += rhs.0;
    }
}

impl Sum for TokenCount {
    fn sum<I: Iterator<Item = TokenCount>>(iter: I) -> Self {
        TokenCount(iter.map(|t| t.0).sum())
    }
}

impl From<usize> for TokenCount {
    fn from(n: usize) -> Self {
        TokenCount(n)
    }
}

impl fmt::Display for TokenCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
