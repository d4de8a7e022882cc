//! Plain-text parser.

use async_trait::async_trait;

use dendrite_core::{
    DocumentParser, InlineNode, LineEnding, MetadataBuilder, ParseError, ParsedDocument,
    SemanticNode, SourceDetails,
};

/// Parser for plain UTF-8 text. Paragraphs are separated by blank lines.
pub struct PlainTextParser;

impl PlainTextParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn supported_types(&self) -> &[&str] {
        &["txt", "text", "text/plain"]
    }

    async fn parse(
        &self,
        bytes: &[u8],
        _content_type: &str,
        builder: MetadataBuilder,
    ) -> Result<ParsedDocument, ParseError> {
        let text = decode_utf8(bytes)?;
        let line_ending = detect_line_ending(text);
        let line_count = text.lines().count();

        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let nodes = normalized
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| SemanticNode::paragraph(None, vec![InlineNode::text(p)]))
            .collect();

        let metadata = builder
            .source_details(SourceDetails::PlainText {
                encoding: "UTF-8".to_string(),
                line_ending,
                line_count,
            })
            .build();

        Ok(ParsedDocument { nodes, metadata })
    }
}

/// Strict UTF-8 decode with BOM tolerance.
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|_| ParseError::Decoding("UTF-8".to_string()))
}

/// The dominant line-ending convention of `text`.
fn detect_line_ending(text: &str) -> LineEnding {
    let crlf = text.matches("\r\n").count();
    let lf = text.matches('\n').count() - crlf;
    let cr = text.matches('\r').count() - crlf;

    if crlf >= lf && crlf >= cr && crlf > 0 {
        LineEnding::CrLf
    } else if cr > lf {
        LineEnding::Cr
    } else {
        LineEnding::Lf
    }
}
