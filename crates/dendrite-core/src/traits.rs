//! Trait interfaces for Dendrite collaborators.
//!
//! The chunker and pipeline depend on these, never on concrete tokenizers or
//! parsers. Adding a source format means implementing [`DocumentParser`] and
//! registering it ahead of the defaults; swapping tokenization means
//! implementing [`Tokenizer`]. Both are shared, read-only dependencies and
//! must be safe to call from concurrent document-processing tasks.

use async_trait::async_trait;

use crate::config::SplitUnit;
use crate::error::{ParseError, TokenizeError};
use crate::id::TokenCount;
use crate::metadata::{DocumentMetadata, MetadataBuilder};
use crate::node::SemanticNode;

/// Informational description of a tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerInfo {
    pub name: String,
    pub max_context_tokens: usize,
    pub avg_tokens_per_word: f64,
}

/// Token counting and budget-aware text splitting.
///
/// The sole contract between the chunker and tokenization; implementations
/// must not leak vocabulary specifics into the rest of the system. Counting
/// the same string twice yields the same count.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Describe the tokenizer (name, context length, tokens-per-word).
    fn model_info(&self) -> TokenizerInfo;

    /// Count tokens in `text`. Empty text counts zero.
    async fn count_tokens(&self, text: &str) -> Result<TokenCount, TokenizeError>;

    /// Partition `text` into pieces of at most `max_tokens` tokens each,
    /// splitting preferentially at `unit` boundaries and falling back to
    /// word level when a single unit exceeds the budget.
    ///
    /// Concatenating the pieces covers all non-whitespace content of the
    /// input; trimming is permitted. `max_tokens == 0` yields no pieces; a
    /// text already within budget comes back as a single piece.
    async fn split(
        &self,
        text: &str,
        max_tokens: TokenCount,
        unit: SplitUnit,
    ) -> Result<Vec<String>, TokenizeError>;
}

/// The output of a parser: the semantic tree plus document metadata.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub nodes: Vec<SemanticNode>,
    pub metadata: DocumentMetadata,
}

/// A format-specific parser producing the semantic IR.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Name used in error reporting.
    fn name(&self) -> &str;

    /// Content-type tags this parser accepts (extensions and MIME types).
    fn supported_types(&self) -> &[&str];

    /// Whether this parser handles `content_type`. Default: membership in
    /// [`DocumentParser::supported_types`], ASCII case-insensitive.
    fn can_parse(&self, content_type: &str) -> bool {
        self.supported_types()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(content_type))
    }

    /// Parse `bytes` into the semantic tree, completing `builder` with
    /// whatever metadata the content yields.
    async fn parse(
        &self,
        bytes: &[u8],
        content_type: &str,
        builder: MetadataBuilder,
    ) -> Result<ParsedDocument, ParseError>;
}
