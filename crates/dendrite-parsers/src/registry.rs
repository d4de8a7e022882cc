//! Ordered parser dispatch.

use std::sync::Arc;

use dendrite_core::{DocumentParser, Error, MetadataBuilder, ParsedDocument};

use crate::{HtmlParser, MarkdownParser, PdfParser, PlainTextParser};

/// An ordered list of parsers; the first whose `can_parse` answers true wins.
///
/// Registration order is the dispatch contract: parsers registered ahead of
/// the defaults take precedence for the types they claim.
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// The default parser stack: markdown, HTML, plain text, PDF.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MarkdownParser::new());
        registry.register(HtmlParser::new());
        registry.register(PlainTextParser::new());
        registry.register(PdfParser::new());
        registry
    }

    /// Append a parser to the end of the dispatch order.
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Arc::new(parser));
    }

    /// Insert a parser ahead of everything already registered.
    pub fn register_first<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.insert(0, Arc::new(parser));
    }

    /// Parsers in dispatch order.
    #[must_use]
    pub fn parsers(&self) -> &[Arc<dyn DocumentParser>] {
        &self.parsers
    }

    /// Resolve the parser for a content type, in declaration order.
    #[must_use]
    pub fn resolve(&self, content_type: &str) -> Option<Arc<dyn DocumentParser>> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(content_type))
            .cloned()
    }

    /// Parse `bytes` with the first matching parser.
    pub async fn parse(
        &self,
        bytes: &[u8],
        content_type: &str,
        builder: MetadataBuilder,
    ) -> Result<ParsedDocument, Error> {
        let parser = self
            .resolve(content_type)
            .ok_or_else(|| Error::UnsupportedFileType(content_type.to_string()))?;
        Ok(parser.parse(bytes, content_type, builder).await?)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl From<Vec<Arc<dyn DocumentParser>>> for ParserRegistry {
    fn from(parsers: Vec<Arc<dyn DocumentParser>>) -> Self {
        Self { parsers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dendrite_core::ParseError;

    struct ClaimAll {
        name: &'static str,
    }

    #[async_trait]
    impl DocumentParser for ClaimAll {
        fn name(&self) -> &str {
            self.name
        }

        fn supported_types(&self) -> &[&str] {
            &["md"]
        }

        async fn parse(
            &self,
            _bytes: &[u8],
            _content_type: &str,
            builder: MetadataBuilder,
        ) -> Result<ParsedDocument, ParseError> {
            Ok(ParsedDocument {
                nodes: vec![],
                metadata: builder.title(self.name).build(),
            })
        }
    }

    #[test]
    fn test_defaults_cover_expected_types() {
        let registry = ParserRegistry::with_defaults();
        for content_type in ["md", "markdown", "html", "htm", "txt", "text", "pdf"] {
            assert!(
                registry.resolve(content_type).is_some(),
                "no parser for {content_type}"
            );
        }
    }

    #[test]
    fn test_unknown_type_resolves_to_none() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.resolve("zip").is_none());
        assert!(registry.resolve("docx").is_none());
    }

    #[tokio::test]
    async fn test_parse_unsupported_type_errors() {
        let registry = ParserRegistry::with_defaults();
        let result = registry.parse(b"data", "zip", MetadataBuilder::new()).await;
        match result {
            Err(Error::UnsupportedFileType(ext)) => assert_eq!(ext, "zip"),
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_registered_wins() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register_first(ClaimAll { name: "custom" });

        let parsed = registry
            .parse(b"# Heading", "md", MetadataBuilder::new())
            .await
            .unwrap();
        assert_eq!(parsed.metadata.title.as_deref(), Some("custom"));
    }

    #[tokio::test]
    async fn test_later_registration_does_not_shadow() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register(ClaimAll { name: "late" });

        let parsed = registry
            .parse(b"plain body", "md", MetadataBuilder::new())
            .await
            .unwrap();
        assert_ne!(parsed.metadata.title.as_deref(), Some("late"));
    }

    #[test]
    fn test_content_type_matching_is_case_insensitive() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.resolve("MD").is_some());
        assert!(registry.resolve("Html").is_some());
    }
}
