//! The processing pipeline: resolve parser → parse → chunk → aggregate.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::info;

use dendrite_chunker::ChunkingEngine;
use dendrite_core::{
    DocumentId, Error, MetadataBuilder, ProcessedDocument, ProcessingStats, Result, Tokenizer,
};

use crate::config::DendriteConfig;

/// The document-processing pipeline.
///
/// Processing is atomic per document: any parser or chunker error is
/// returned as-is and no partial [`ProcessedDocument`] escapes. Documents may
/// be processed concurrently; the pipeline holds no per-document state.
pub struct Pipeline {
    config: DendriteConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: DendriteConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DendriteConfig {
        &self.config
    }

    /// Process in-memory bytes of the given content type.
    pub async fn process_bytes(
        &self,
        bytes: &[u8],
        content_type: &str,
        document_id: DocumentId,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<ProcessedDocument> {
        let started = Instant::now();

        let mut builder = MetadataBuilder::new()
            .file_size(bytes.len() as u64)
            .checksum(checksum(bytes));
        if let Some(mime) = mime_for(content_type) {
            builder = builder.mime_type(mime);
        }

        let parsed = self
            .config
            .parsers
            .parse(bytes, content_type, builder)
            .await?;
        let metadata = Arc::new(parsed.metadata);

        let engine = ChunkingEngine::new(tokenizer, self.config.chunking.clone());
        let chunks = engine
            .chunk(&parsed.nodes, &document_id, Arc::clone(&metadata))
            .await?;

        let statistics = ProcessingStats::from_chunks(&chunks, started.elapsed());
        info!(
            document = %document_id,
            chunks = statistics.chunk_count,
            tokens = %statistics.total_token_count,
            elapsed_ms = statistics.processing_time.as_millis() as u64,
            "processed document"
        );

        Ok(ProcessedDocument {
            document_id,
            metadata,
            nodes: parsed.nodes,
            chunks,
            statistics,
        })
    }

    /// Process a file: the content type comes from the extension and the
    /// document ID defaults to the file name.
    pub async fn process_path(
        &self,
        path: &Path,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<ProcessedDocument> {
        let bytes = tokio::fs::read(path).await.map_err(|source| Error::FileRead {
            url: path.to_path_buf(),
            source,
        })?;

        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let document_id = DocumentId::new(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("document"),
        );

        self.process_bytes(&bytes, &content_type, document_id, tokenizer)
            .await
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DendriteConfig::default())
    }
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// MIME type for a content-type tag, when the tag is not already one.
fn mime_for(content_type: &str) -> Option<&'static str> {
    match content_type.to_ascii_lowercase().as_str() {
        "md" | "markdown" | "text/markdown" => Some("text/markdown"),
        "html" | "htm" | "text/html" => Some("text/html"),
        "txt" | "text" | "text/plain" => Some("text/plain"),
        "pdf" | "application/pdf" => Some("application/pdf"),
        _ => None,
    }
}
