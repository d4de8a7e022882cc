//! End-to-end pipeline tests: parse → chunk → aggregate.

use std::collections::BTreeSet;
use std::sync::Arc;

use dendrite::{DendriteConfig, Pipeline, WordTokenizer};
use dendrite_core::{
    ChunkingConfig, DocumentId, Error, LineEnding, SemanticNode, SourceDetails, TokenCount,
    Tokenizer,
};

fn tokenizer() -> Arc<dyn Tokenizer> {
    Arc::new(WordTokenizer::new())
}

/// A permissive config so short fixture documents survive post-filtering.
fn permissive(max_tokens: usize) -> DendriteConfig {
    DendriteConfig {
        chunking: ChunkingConfig {
            max_tokens_per_chunk: max_tokens,
            min_tokens_per_chunk: 1,
            overlap_tokens: 16,
            quality_threshold: 0.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

const GUIDE_MD: &str = "---\n\
title: \"Guide\"\n\
author: \"A\"\n\
---\n\
\n\
# Intro\n\
\n\
Hello world.\n\
\n\
# Details\n\
\n\
Further details follow below.\n\
\n\
| Col1 | Col2 |\n\
|------|------|\n\
| a | b |\n\
| c | d |\n\
| e | f |\n";

#[tokio::test]
async fn test_markdown_with_front_matter_and_table() {
    let pipeline = Pipeline::new(permissive(512));
    let processed = pipeline
        .process_bytes(
            GUIDE_MD.as_bytes(),
            "md",
            DocumentId::new("guide.md"),
            tokenizer(),
        )
        .await
        .unwrap();

    assert_eq!(processed.metadata.title.as_deref(), Some("Guide"));
    assert_eq!(processed.metadata.author.as_deref(), Some("A"));

    // First text chunk sits under Guide > Intro.
    let first = &processed.chunks[0];
    assert_eq!(first.content, "Hello world.");
    assert_eq!(first.breadcrumb.components(), &["Guide", "Intro"]);

    // The table explodes into one structure chunk plus three row chunks.
    let table_chunks: Vec<_> = processed
        .chunks
        .iter()
        .filter(|c| c.breadcrumb.components().contains(&"Table".to_string()))
        .collect();
    assert_eq!(table_chunks.len(), 4);
    assert_eq!(
        table_chunks[0].breadcrumb.to_string(),
        "Guide > Details > Table > Structure"
    );
    for (i, chunk) in table_chunks[1..].iter().enumerate() {
        assert_eq!(
            chunk.breadcrumb.to_string(),
            format!("Guide > Details > Table > Row {}", i + 1)
        );
    }
    assert!(table_chunks[1].content.contains("Col1: a"));
    assert!(table_chunks[3].content.contains("Col2: f"));
}

#[tokio::test]
async fn test_plain_text_document() {
    let pipeline = Pipeline::new(permissive(512));
    let processed = pipeline
        .process_bytes(
            b"This is a sample plain text document.",
            "txt",
            DocumentId::new("sample.txt"),
            tokenizer(),
        )
        .await
        .unwrap();

    assert_eq!(processed.nodes.len(), 1);
    assert!(matches!(processed.nodes[0], SemanticNode::Paragraph { .. }));
    assert_eq!(processed.metadata.title, None);
    assert_eq!(
        processed.metadata.source_details,
        Some(SourceDetails::PlainText {
            encoding: "UTF-8".to_string(),
            line_ending: LineEnding::Lf,
            line_count: 1,
        })
    );

    assert_eq!(processed.chunks.len(), 1);
    assert_eq!(
        processed.chunks[0].content,
        "This is a sample plain text document."
    );
}

#[tokio::test]
async fn test_html_single_heading() {
    let pipeline = Pipeline::new(permissive(512));
    let processed = pipeline
        .process_bytes(
            b"<h1>Hello World</h1>",
            "html",
            DocumentId::new("page.html"),
            tokenizer(),
        )
        .await
        .unwrap();

    assert_eq!(processed.nodes.len(), 1);
    match &processed.nodes[0] {
        SemanticNode::Heading { level, text, .. } => {
            assert_eq!(*level, 1);
            assert_eq!(text, "Hello World");
        }
        other => panic!("unexpected node: {other:?}"),
    }
    // A heading alone reshapes the breadcrumb but carries no content.
    assert!(processed.chunks.is_empty());
}

#[tokio::test]
async fn test_html_heading_breadcrumb_flows_into_chunks() {
    let pipeline = Pipeline::new(permissive(512));
    let processed = pipeline
        .process_bytes(
            b"<h1>Hello World</h1><p>Welcome to the page body.</p>",
            "html",
            DocumentId::new("page.html"),
            tokenizer(),
        )
        .await
        .unwrap();

    assert_eq!(processed.chunks.len(), 1);
    let components = processed.chunks[0].breadcrumb.components();
    assert_eq!(components.last().map(String::as_str), Some("Hello World"));
}

#[tokio::test]
async fn test_oversized_paragraph_splits_with_overlap() {
    let max = 64;
    let pipeline = Pipeline::new(permissive(max));
    // Roughly 3x the budget, in 9-word sentences.
    let body: String = (0..24)
        .map(|i| format!("Sentence number {i} talks about topic {i} at length."))
        .collect::<Vec<_>>()
        .join(" ");
    let text = format!("big paragraph:\n\n{body}");

    let processed = pipeline
        .process_bytes(
            text.as_bytes(),
            "txt",
            DocumentId::new("long.txt"),
            tokenizer(),
        )
        .await
        .unwrap();

    let parts: Vec<_> = processed
        .chunks
        .iter()
        .filter(|c| {
            c.breadcrumb
                .components()
                .last()
                .is_some_and(|l| l.starts_with("Part "))
        })
        .collect();
    assert!(parts.len() >= 3, "expected >= 3 parts, got {}", parts.len());

    let source_ids: BTreeSet<_> = parts
        .iter()
        .flat_map(|c| c.source_node_ids.iter().cloned())
        .collect();
    assert_eq!(source_ids.len(), 1, "parts share one source node");

    for (i, part) in parts.iter().enumerate() {
        assert_eq!(
            part.breadcrumb.components().last().unwrap(),
            &format!("Part {}", i + 1)
        );
        assert!(part.token_count.get() <= max);
    }

    // Consecutive parts share sentence-aligned overlap text.
    for pair in parts.windows(2) {
        let opening = pair[1].content.split("\n\n").next().unwrap();
        let last_sentence = opening.rsplit(". ").next().unwrap();
        assert!(
            pair[0]
                .content
                .contains(last_sentence.trim().trim_end_matches('.')),
            "parts do not overlap"
        );
    }
}

#[tokio::test]
async fn test_large_swift_code_block() {
    let max = 200;
    let pipeline = Pipeline::new(permissive(max));
    let code: String = (0..1000)
        .map(|i| format!("let metric{i} = reading{i} * factor{i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let markdown = format!("```swift\n{code}\n```\n");

    let processed = pipeline
        .process_bytes(
            markdown.as_bytes(),
            "md",
            DocumentId::new("code.md"),
            tokenizer(),
        )
        .await
        .unwrap();

    assert!(processed.chunks.len() >= 5);
    for chunk in &processed.chunks {
        assert!(chunk.content.starts_with("Code (swift):\n"));
        assert!(chunk.token_count.get() <= max, "chunk over budget");
        for line in chunk.content.lines().skip(1) {
            assert!(code.lines().any(|l| l == line), "split mid-line: {line:?}");
        }
    }
}

#[tokio::test]
async fn test_unsupported_extension() {
    let pipeline = Pipeline::new(permissive(512));
    let result = pipeline
        .process_bytes(b"PK\x03\x04", "zip", DocumentId::new("a.zip"), tokenizer())
        .await;
    match result {
        Err(Error::UnsupportedFileType(ext)) => assert_eq!(ext, "zip"),
        other => panic!("expected UnsupportedFileType, got {other:?}"),
    }
}

#[tokio::test]
async fn test_process_path_infers_type_and_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.md");
    std::fs::write(&path, "# Title\n\nA body paragraph with several words.\n").unwrap();

    let pipeline = Pipeline::new(permissive(512));
    let processed = pipeline.process_path(&path, tokenizer()).await.unwrap();

    assert_eq!(processed.document_id.as_str(), "note.md");
    assert_eq!(processed.chunks.len(), 1);
    assert_eq!(processed.chunks[0].id.as_str(), "note.md_chunk_0");
}

#[tokio::test]
async fn test_missing_file_is_read_error() {
    let pipeline = Pipeline::new(permissive(512));
    let result = pipeline
        .process_path(std::path::Path::new("/nonexistent/doc.md"), tokenizer())
        .await;
    assert!(matches!(result, Err(Error::FileRead { .. })));
}

#[tokio::test]
async fn test_determinism_across_runs() {
    let pipeline = Pipeline::new(permissive(512));
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let processed = pipeline
            .process_bytes(
                GUIDE_MD.as_bytes(),
                "md",
                DocumentId::new("guide.md"),
                tokenizer(),
            )
            .await
            .unwrap();
        outputs.push(processed);
    }
    let (a, b) = (&outputs[0], &outputs[1]);

    assert_eq!(
        serde_json::to_string(&a.nodes).unwrap(),
        serde_json::to_string(&b.nodes).unwrap()
    );
    assert_eq!(a.chunks.len(), b.chunks.len());
    for (x, y) in a.chunks.iter().zip(&b.chunks) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.content, y.content);
        assert_eq!(x.breadcrumb, y.breadcrumb);
        assert_eq!(x.source_node_ids, y.source_node_ids);
        assert_eq!(x.token_count, y.token_count);
    }
}

#[tokio::test]
async fn test_universal_invariants() {
    let pipeline = Pipeline::new(permissive(64));
    let processed = pipeline
        .process_bytes(
            GUIDE_MD.as_bytes(),
            "md",
            DocumentId::new("guide.md"),
            tokenizer(),
        )
        .await
        .unwrap();

    // Non-emptiness and validity.
    for chunk in &processed.chunks {
        assert!(!chunk.content.trim().is_empty());
        assert!(chunk.is_valid());
        assert!((0.0..=1.0).contains(&chunk.quality_score));
        for component in chunk.breadcrumb.components() {
            assert!(!component.trim().is_empty());
        }
    }

    // Chunk and node IDs are pairwise unique.
    let chunk_ids: BTreeSet<_> = processed.chunks.iter().map(|c| c.id.clone()).collect();
    assert_eq!(chunk_ids.len(), processed.chunks.len());
    let node_ids: BTreeSet<_> = processed.nodes.iter().map(|n| n.id().clone()).collect();
    assert_eq!(node_ids.len(), processed.nodes.len());

    // Monotonic chunk indices.
    let indices: Vec<_> = processed
        .chunks
        .iter()
        .map(|c| c.id.index().unwrap())
        .collect();
    for pair in indices.windows(2) {
        assert!(pair[0] < pair[1]);
    }

    // Token accounting.
    let total: TokenCount = processed.chunks.iter().map(|c| c.token_count).sum();
    assert_eq!(processed.statistics.total_token_count, total);
    assert_eq!(processed.statistics.chunk_count, processed.chunks.len());
}

#[tokio::test]
async fn test_quality_threshold_enforced() {
    let config = DendriteConfig {
        chunking: ChunkingConfig {
            min_tokens_per_chunk: 1,
            quality_threshold: 0.7,
            ..Default::default()
        },
        ..Default::default()
    };
    let pipeline = Pipeline::new(config);
    let processed = pipeline
        .process_bytes(
            GUIDE_MD.as_bytes(),
            "md",
            DocumentId::new("guide.md"),
            tokenizer(),
        )
        .await
        .unwrap();
    for chunk in &processed.chunks {
        assert!(chunk.quality_score >= 0.7);
    }
}

#[tokio::test]
async fn test_min_token_threshold_enforced() {
    let config = DendriteConfig {
        chunking: ChunkingConfig {
            min_tokens_per_chunk: 8,
            quality_threshold: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let pipeline = Pipeline::new(config);
    let processed = pipeline
        .process_bytes(
            b"Tiny.\n\nA paragraph that is long enough to keep after filtering, clearly.",
            "txt",
            DocumentId::new("t.txt"),
            tokenizer(),
        )
        .await
        .unwrap();
    for chunk in &processed.chunks {
        assert!(chunk.token_count.get() >= 8);
    }
    assert!(!processed.chunks.is_empty());
}
