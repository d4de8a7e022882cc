//! Document metadata produced by parsers and carried through to chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metadata describing a source document.
///
/// Produced by a parser (via [`MetadataBuilder`]) and consumed unchanged by
/// the chunker; every chunk holds a shared handle to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub keywords: BTreeSet<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Link targets discovered in the document.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub links: BTreeSet<String>,
    pub language: Option<String>,
    pub mime_type: Option<String>,
    /// Source size in bytes.
    pub file_size: Option<u64>,
    /// SHA-256 of the source bytes, lowercase hex.
    pub checksum: Option<String>,
    /// Format-specific attributes recorded by the parser.
    pub source_details: Option<SourceDetails>,
}

impl DocumentMetadata {
    /// Check internal validity: a present title must not be blank. File size
    /// is non-negative by construction.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.title.as_deref().map_or(true, |t| !t.trim().is_empty())
    }
}

/// Format-specific metadata, tagged by source format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum SourceDetails {
    Markdown {
        /// Heading outline in document order.
        outline: Vec<OutlineEntry>,
        table_count: usize,
        code_block_count: usize,
        has_front_matter: bool,
    },
    Html {
        /// `src` attributes of images, in document order.
        image_sources: Vec<String>,
        script_count: usize,
        link_count: usize,
    },
    Pdf {
        page_count: u32,
    },
    PlainText {
        encoding: String,
        line_ending: LineEnding,
        line_count: usize,
    },
}

/// One entry of a heading outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
}

/// Dominant line-ending convention of a plain-text source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

/// Builder handed to parsers by the pipeline.
///
/// The pipeline pre-populates byte-level facts (size, checksum, MIME type);
/// the parser fills in everything it can read from the content and calls
/// [`MetadataBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    metadata: DocumentMetadata,
}

impl MetadataBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.metadata.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.metadata.keywords.insert(keyword.into());
        self
    }

    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.metadata.links.insert(link.into());
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.metadata.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.metadata.mime_type = Some(mime_type.into());
        self
    }

    #[must_use]
    pub fn file_size(mut self, size: u64) -> Self {
        self.metadata.file_size = Some(size);
        self
    }

    #[must_use]
    pub fn checksum(mut self, checksum: impl Into<String>) -> Self {
        self.metadata.checksum = Some(checksum.into());
        self
    }

    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.created_at = Some(at);
        self
    }

    #[must_use]
    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.modified_at = Some(at);
        self
    }

    #[must_use]
    pub fn source_details(mut self, details: SourceDetails) -> Self {
        self.metadata.source_details = Some(details);
        self
    }

    #[must_use]
    pub fn build(self) -> DocumentMetadata {
        self.metadata
    }
}
