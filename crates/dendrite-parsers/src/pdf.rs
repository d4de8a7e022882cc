//! PDF parser.
//!
//! Text comes from `pdf-extract`; the page count and document-information
//! dictionary come from `lopdf`. Both run under `spawn_blocking` since PDF
//! decoding is CPU-bound. Image-only PDFs surface a parse failure; OCR is a
//! collaborator concern, not handled here.

use async_trait::async_trait;
use lopdf::{Document, Object};
use tracing::{debug, warn};

use dendrite_core::{
    DocumentParser, InlineNode, MetadataBuilder, ParseError, ParsedDocument, SemanticNode,
    SourceDetails,
};

/// Parser for PDF documents.
pub struct PdfParser;

impl PdfParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supported_types(&self) -> &[&str] {
        &["pdf", "application/pdf"]
    }

    async fn parse(
        &self,
        bytes: &[u8],
        _content_type: &str,
        mut builder: MetadataBuilder,
    ) -> Result<ParsedDocument, ParseError> {
        let data = bytes.to_vec();
        let extracted = tokio::task::spawn_blocking(move || extract(&data))
            .await
            .map_err(|e| ParseError::failed("pdf", format!("task join error: {e}")))??;

        let text = cleanup_text(&extracted.text);
        if text.trim().is_empty() {
            return Err(ParseError::failed(
                "pdf",
                "no extractable text; the document may be image-based",
            ));
        }
        debug!(
            pages = extracted.page_count,
            chars = text.len(),
            "extracted pdf text"
        );

        let nodes: Vec<SemanticNode> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                let joined = p.lines().map(str::trim).collect::<Vec<_>>().join(" ");
                SemanticNode::paragraph(None, vec![InlineNode::text(joined)])
            })
            .collect();

        if let Some(title) = extracted.title.filter(|t| !t.trim().is_empty()) {
            builder = builder.title(title.trim());
        }
        if let Some(author) = extracted.author.filter(|a| !a.trim().is_empty()) {
            builder = builder.author(author.trim());
        }
        let metadata = builder
            .source_details(SourceDetails::Pdf {
                page_count: extracted.page_count,
            })
            .build();

        Ok(ParsedDocument { nodes, metadata })
    }
}

struct Extracted {
    text: String,
    page_count: u32,
    title: Option<String>,
    author: Option<String>,
}

fn extract(data: &[u8]) -> Result<Extracted, ParseError> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| ParseError::failed("pdf", e.to_string()))?;

    let (page_count, title, author) = match Document::load_mem(data) {
        Ok(doc) => {
            let pages = doc.get_pages().len() as u32;
            let (title, author) = document_info(&doc);
            (pages.max(1), title, author)
        }
        Err(e) => {
            warn!("failed to load pdf structure: {e}");
            (1, None, None)
        }
    };

    Ok(Extracted {
        text,
        page_count,
        title,
        author,
    })
}

/// Title and author from the document-information dictionary, when present.
fn document_info(doc: &Document) -> (Option<String>, Option<String>) {
    let Ok(info) = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_object(id))
        .and_then(Object::as_dict)
    else {
        return (None, None);
    };

    let read = |key: &[u8]| {
        info.get(key)
            .and_then(Object::as_str)
            .ok()
            .map(|s| String::from_utf8_lossy(s).into_owned())
    };
    (read(b"Title"), read(b"Author"))
}

/// Normalize extracted text: strip nulls, trim line edges, and collapse runs
/// of blank lines into paragraph breaks.
fn cleanup_text(text: &str) -> String {
    let mut out = String::new();
    let mut blank_run = 0usize;
    for line in text.replace('\0', "").lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        blank_run = 0;
        out.push_str(line);
    }
    out
}
