//! The chunking engine and its per-document traversal state.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use dendrite_core::{
    Breadcrumb, Chunk, ChunkError, ChunkId, ChunkingConfig, DocumentId, DocumentMetadata, NodeId,
    SemanticNode, TokenCount, Tokenizer,
};

use crate::quality;

/// The chunking engine.
///
/// Holds only the shared, read-only dependencies (tokenizer and normalized
/// config); every [`ChunkingEngine::chunk`] call builds a fresh traversal
/// state, so a single engine can serve concurrent documents.
pub struct ChunkingEngine {
    tokenizer: Arc<dyn Tokenizer>,
    config: ChunkingConfig,
}

impl ChunkingEngine {
    /// Create an engine. The config is normalized (clamped) here.
    #[must_use]
    pub fn new(tokenizer: Arc<dyn Tokenizer>, config: ChunkingConfig) -> Self {
        Self {
            tokenizer,
            config: config.normalized(),
        }
    }

    /// The normalized configuration in effect.
    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk a document's top-level nodes in order.
    pub async fn chunk(
        &self,
        nodes: &[SemanticNode],
        document_id: &DocumentId,
        metadata: Arc<DocumentMetadata>,
    ) -> Result<Vec<Chunk>, ChunkError> {
        debug!(
            document = %document_id,
            nodes = nodes.len(),
            "chunking document"
        );

        let mut run = DocumentRun::new(self, document_id.clone(), metadata);

        for node in nodes {
            run.visit(node).await?;
        }
        run.flush().await?;

        let threshold = self.config.quality_threshold;
        let min_tokens = self.config.min_tokens_per_chunk;
        let before = run.chunks.len();
        run.chunks
            .retain(|c| c.quality_score >= threshold && c.token_count.get() >= min_tokens);
        debug!(
            kept = run.chunks.len(),
            dropped = before - run.chunks.len(),
            "post-filtered chunks"
        );

        Ok(run.chunks)
    }
}

/// Mutable traversal state for one document. Never shared across documents.
pub(crate) struct DocumentRun<'a> {
    pub(crate) engine: &'a ChunkingEngine,
    document_id: DocumentId,
    metadata: Arc<DocumentMetadata>,
    pub(crate) trail: BreadcrumbTrail,
    buffer: NodeBuffer,
    next_index: usize,
    chunks: Vec<Chunk>,
}

impl<'a> DocumentRun<'a> {
    fn new(
        engine: &'a ChunkingEngine,
        document_id: DocumentId,
        metadata: Arc<DocumentMetadata>,
    ) -> Self {
        let root = metadata
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Document")
            .to_string();
        Self {
            engine,
            document_id,
            metadata,
            trail: BreadcrumbTrail::new(root),
            buffer: NodeBuffer::default(),
            next_index: 0,
            chunks: Vec::new(),
        }
    }

    pub(crate) fn tokenizer(&self) -> &dyn Tokenizer {
        self.engine.tokenizer.as_ref()
    }

    /// Process one top-level node.
    async fn visit(&mut self, node: &SemanticNode) -> Result<(), ChunkError> {
        if node.is_context_boundary() {
            self.flush().await?;
            if let SemanticNode::Heading { level, text, .. } = node {
                // A heading never enters the buffer; it only reshapes the
                // breadcrumb for everything that follows.
                self.trail.observe(*level, text);
                return Ok(());
            }
        }

        if self.engine.config.enable_special_handling && node.requires_special_handling() {
            return self.handle_special(node).await;
        }

        let text = node.plain_text();
        if text.trim().is_empty() {
            return Ok(());
        }

        let node_tokens = self.tokenizer().count_tokens(&text).await?;
        let max = self.engine.config.max_tokens_per_chunk;

        if node_tokens.get() > max {
            // Flush first so preceding context never mixes into the pieces.
            self.flush().await?;
            return self.split_oversized(node, &text).await;
        }

        if (self.buffer.tokens + node_tokens).get() > max {
            self.flush().await?;
        }
        self.buffer.push(
            text,
            node_tokens,
            node.id().clone(),
            node.structural_importance(),
        );
        Ok(())
    }

    async fn handle_special(&mut self, node: &SemanticNode) -> Result<(), ChunkError> {
        match node {
            SemanticNode::Table {
                id,
                caption,
                headers,
                rows,
                ..
            } => {
                self.handle_table(caption.as_deref(), headers, rows, id, node)
                    .await
            }
            SemanticNode::CodeBlock {
                id, language, code, ..
            } => {
                self.handle_code(language.as_deref(), code, id, node)
                    .await
            }
            _ => Ok(()),
        }
    }

    /// Flush the buffer into a chunk. A no-op when the buffer is empty.
    pub(crate) async fn flush(&mut self) -> Result<(), ChunkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let content = self.buffer.texts.join("\n\n");
        let avg_importance = self.buffer.mean_importance();
        let node_ids = std::mem::take(&mut self.buffer.node_ids);
        self.buffer.clear();

        let breadcrumb = self.trail.snapshot();
        self.emit(content, breadcrumb, node_ids, avg_importance).await
    }

    /// Construct and record a chunk from final content. Empty content is
    /// silently skipped; no empty chunks are ever emitted.
    pub(crate) async fn emit(
        &mut self,
        content: String,
        breadcrumb: Breadcrumb,
        source_node_ids: BTreeSet<NodeId>,
        avg_importance: f64,
    ) -> Result<(), ChunkError> {
        if content.trim().is_empty() {
            return Ok(());
        }
        let token_count = self.tokenizer().count_tokens(&content).await?;
        if token_count.is_zero() {
            return Ok(());
        }

        let quality_score = quality::score_chunk(
            &content,
            token_count,
            avg_importance,
            self.engine.config.max_tokens_per_chunk,
        );

        let id = ChunkId::new(&self.document_id, self.next_index);
        self.next_index += 1;

        self.chunks.push(Chunk {
            id,
            document_id: self.document_id.clone(),
            content,
            token_count,
            breadcrumb,
            source_node_ids,
            metadata: Arc::clone(&self.metadata),
            created_at: Utc::now(),
            quality_score,
        });
        Ok(())
    }
}

/// Pending nodes awaiting a flush.
#[derive(Default)]
struct NodeBuffer {
    texts: Vec<String>,
    tokens: TokenCount,
    node_ids: BTreeSet<NodeId>,
    importances: Vec<f64>,
}

impl NodeBuffer {
    fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    fn push(&mut self, text: String, tokens: TokenCount, id: NodeId, importance: f64) {
        self.texts.push(text);
        self.tokens += tokens;
        self.node_ids.insert(id);
        self.importances.push(importance);
    }

    fn mean_importance(&self) -> f64 {
        if self.importances.is_empty() {
            0.0
        } else {
            self.importances.iter().sum::<f64>() / self.importances.len() as f64
        }
    }

    fn clear(&mut self) {
        self.texts.clear();
        self.tokens = TokenCount::ZERO;
        self.node_ids.clear();
        self.importances.clear();
    }
}

/// The breadcrumb stack: a fixed root (document title or `"Document"`) plus
/// the chain of ancestor headings for the current position.
pub(crate) struct BreadcrumbTrail {
    root: String,
    headings: Vec<String>,
}

impl BreadcrumbTrail {
    fn new(root: String) -> Self {
        Self {
            root,
            headings: Vec::new(),
        }
    }

    /// Record a heading at `level`: pop entries at that depth or deeper,
    /// then push the new title.
    pub(crate) fn observe(&mut self, level: u8, text: &str) {
        while self.headings.len() >= usize::from(level) {
            self.headings.pop();
        }
        self.headings.push(text.to_string());
    }

    pub(crate) fn snapshot(&self) -> Breadcrumb {
        let mut crumb = Breadcrumb::root(&self.root);
        for heading in &self.headings {
            crumb.push(heading);
        }
        crumb
    }
}
