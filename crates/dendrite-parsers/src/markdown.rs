//! Markdown parser.
//!
//! A line-oriented block scanner plus a small inline scanner. Supports YAML
//! front matter (`title`, `author`, `description`, `keywords`, `language`,
//! `date`), ATX headings, fenced code blocks, pipe tables, ordered and
//! unordered lists, blockquotes, thematic breaks, and paragraphs with links,
//! images, emphasis, strong, and inline code.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use dendrite_core::{
    DocumentParser, InlineNode, MetadataBuilder, OutlineEntry, ParseError, ParsedDocument,
    SemanticNode, SourceDetails,
};

use crate::text::decode_utf8;

/// Parser for Markdown documents.
pub struct MarkdownParser;

impl MarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for MarkdownParser {
    fn name(&self) -> &str {
        "markdown"
    }

    fn supported_types(&self) -> &[&str] {
        &["md", "markdown", "text/markdown"]
    }

    async fn parse(
        &self,
        bytes: &[u8],
        _content_type: &str,
        builder: MetadataBuilder,
    ) -> Result<ParsedDocument, ParseError> {
        let text = decode_utf8(bytes)?;
        let normalized = text.replace("\r\n", "\n");

        let (front_matter, body) = split_front_matter(&normalized);
        let has_front_matter = front_matter.is_some();
        let mut builder = apply_front_matter(builder, front_matter.as_deref());

        let nodes = parse_blocks(body);
        debug!(nodes = nodes.len(), "parsed markdown blocks");

        let mut outline = Vec::new();
        let mut table_count = 0usize;
        let mut code_block_count = 0usize;
        for node in &nodes {
            match node {
                SemanticNode::Heading { level, text, .. } => outline.push(OutlineEntry {
                    level: *level,
                    text: text.clone(),
                }),
                SemanticNode::Table { .. } => table_count += 1,
                SemanticNode::CodeBlock { .. } => code_block_count += 1,
                _ => {}
            }
        }
        for destination in collect_link_destinations(&nodes) {
            builder = builder.link(destination);
        }

        let metadata = builder
            .source_details(SourceDetails::Markdown {
                outline,
                table_count,
                code_block_count,
                has_front_matter,
            })
            .build();

        Ok(ParsedDocument { nodes, metadata })
    }
}

/// Split off a leading `---` front-matter fence. Returns the front-matter
/// body (without fences) and the remaining document.
fn split_front_matter(text: &str) -> (Option<String>, &str) {
    let rest = match text.strip_prefix("---\n") {
        Some(rest) => rest,
        None => return (None, text),
    };
    match rest.find("\n---") {
        Some(end) => {
            let matter = &rest[..end];
            let body = rest[end + 4..].trim_start_matches('\n');
            (Some(matter.to_string()), body)
        }
        None => (None, text),
    }
}

fn apply_front_matter(mut builder: MetadataBuilder, matter: Option<&str>) -> MetadataBuilder {
    let Some(matter) = matter else {
        return builder;
    };
    for line in matter.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            continue;
        }
        match key.trim().to_ascii_lowercase().as_str() {
            "title" => builder = builder.title(value),
            "author" => builder = builder.author(value),
            "description" => builder = builder.description(value),
            "language" | "lang" => builder = builder.language(value),
            "keywords" | "tags" => {
                for keyword in value
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .split(',')
                {
                    let keyword = keyword.trim().trim_matches('"').trim_matches('\'');
                    if !keyword.is_empty() {
                        builder = builder.keyword(keyword);
                    }
                }
            }
            "date" => {
                if let Some(date) = parse_date(value) {
                    builder = builder.created_at(date);
                }
            }
            _ => {}
        }
    }
    builder
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse the document body into top-level blocks.
fn parse_blocks(body: &str) -> Vec<SemanticNode> {
    let lines: Vec<&str> = body.lines().collect();
    let mut nodes = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim();
        if trimmed.is_empty() {
            i += 1;
            continue;
        }

        if let Some((level, text)) = parse_heading(trimmed) {
            nodes.push(SemanticNode::heading(None, level, text));
            i += 1;
            continue;
        }

        if let Some(language) = parse_fence_open(trimmed) {
            let (node, next) = parse_code_block(&lines, i + 1, language);
            nodes.push(node);
            i = next;
            continue;
        }

        if is_thematic_break(trimmed) {
            nodes.push(SemanticNode::thematic_break(None));
            i += 1;
            continue;
        }

        if trimmed.starts_with('|')
            && i + 1 < lines.len()
            && is_table_separator(lines[i + 1].trim())
        {
            let (node, next) = parse_table(&lines, i);
            nodes.push(node);
            i = next;
            continue;
        }

        if trimmed.starts_with('>') {
            let (node, next) = parse_blockquote(&lines, i);
            nodes.push(node);
            i = next;
            continue;
        }

        if parse_list_marker(trimmed).is_some() {
            let (node, next) = parse_list(&lines, i);
            nodes.push(node);
            i = next;
            continue;
        }

        let (node, next) = parse_paragraph(&lines, i);
        nodes.push(node);
        i = next;
    }

    nodes
}

/// Parse an ATX heading (`# Title`), up to six levels.
fn parse_heading(line: &str) -> Option<(u8, String)> {
    if !line.starts_with('#') {
        return None;
    }
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if rest.is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((hashes as u8, rest.trim().to_string()))
}

/// The info string of an opening code fence, if `line` is one.
fn parse_fence_open(line: &str) -> Option<Option<String>> {
    let rest = line.strip_prefix("```")?;
    let info = rest.trim();
    if info.is_empty() {
        Some(None)
    } else {
        Some(Some(info.to_string()))
    }
}

fn parse_code_block(
    lines: &[&str],
    start: usize,
    language: Option<String>,
) -> (SemanticNode, usize) {
    let mut code_lines = Vec::new();
    let mut i = start;
    while i < lines.len() && !lines[i].trim_start().starts_with("```") {
        code_lines.push(lines[i]);
        i += 1;
    }
    let node = SemanticNode::code_block(None, language, code_lines.join("\n"));
    // skip the closing fence when present
    (node, (i + 1).min(lines.len()))
}

fn is_thematic_break(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && (compact.chars().all(|c| c == '-')
            || compact.chars().all(|c| c == '*')
            || compact.chars().all(|c| c == '_'))
}

/// Split a pipe row into trimmed cells, dropping the outer empties.
fn parse_table_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_table_separator(line: &str) -> bool {
    if !line.starts_with('|') && !line.contains('|') {
        return false;
    }
    let cells = parse_table_row(line);
    !cells.is_empty()
        && cells.iter().all(|c| {
            let c = c.trim_start_matches(':').trim_end_matches(':');
            !c.is_empty() && c.chars().all(|ch| ch == '-')
        })
}

fn parse_table(lines: &[&str], start: usize) -> (SemanticNode, usize) {
    let headers = parse_table_row(lines[start]);
    let mut rows = Vec::new();
    let mut i = start + 2; // skip the separator row
    while i < lines.len() && lines[i].trim().starts_with('|') {
        rows.push(parse_table_row(lines[i]));
        i += 1;
    }
    (SemanticNode::table(None, None, headers, rows), i)
}

fn parse_blockquote(lines: &[&str], start: usize) -> (SemanticNode, usize) {
    let mut inner = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if let Some(rest) = trimmed.strip_prefix('>') {
            inner.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            i += 1;
        } else {
            break;
        }
    }

    let children = inner
        .join("\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let joined = p.lines().map(str::trim).collect::<Vec<_>>().join(" ");
            SemanticNode::paragraph(None, parse_inline(&joined))
        })
        .collect();

    (SemanticNode::blockquote(None, children), i)
}

/// The marker prefix of a list line: `(ordered, content_offset)`.
fn parse_list_marker(line: &str) -> Option<(bool, usize)> {
    for marker in ["- ", "* ", "+ "] {
        if line.starts_with(marker) {
            return Some((false, marker.len()));
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with(". ") {
        return Some((true, digits + 2));
    }
    None
}

fn parse_list(lines: &[&str], start: usize) -> (SemanticNode, usize) {
    let (ordered, _) = parse_list_marker(lines[start].trim()).unwrap_or((false, 2));
    let mut items: Vec<String> = Vec::new();
    let mut i = start;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some((_, offset)) = parse_list_marker(trimmed) {
            items.push(trimmed[offset..].trim().to_string());
            i += 1;
        } else if line.starts_with("  ") && !items.is_empty() {
            // lazy continuation of the previous item
            let last = items.last_mut().unwrap();
            last.push(' ');
            last.push_str(trimmed);
            i += 1;
        } else {
            break;
        }
    }

    let runs = items.iter().map(|item| parse_inline(item)).collect();
    (SemanticNode::list(None, ordered, runs), i)
}

fn parse_paragraph(lines: &[&str], start: usize) -> (SemanticNode, usize) {
    // The first line is consumed unconditionally so the scanner always makes
    // progress, even on lines that merely look like other blocks.
    let mut collected = vec![lines[start].trim()];
    let mut i = start + 1;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        if trimmed.is_empty()
            || parse_heading(trimmed).is_some()
            || parse_fence_open(trimmed).is_some()
            || is_thematic_break(trimmed)
            || trimmed.starts_with('>')
            || trimmed.starts_with('|')
            || parse_list_marker(trimmed).is_some()
        {
            break;
        }
        collected.push(trimmed);
        i += 1;
    }
    let joined = collected.join(" ");
    (SemanticNode::paragraph(None, parse_inline(&joined)), i)
}

/// Scan inline markup: images, links, strong, emphasis, inline code.
pub(crate) fn parse_inline(text: &str) -> Vec<InlineNode> {
    let mut nodes = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.starts_with("![") {
            if let Some((alt, source, consumed)) = parse_bracketed(rest, 2) {
                flush_plain(&mut nodes, &mut plain);
                nodes.push(InlineNode::Image {
                    source: (!source.is_empty()).then(|| source.to_string()),
                    alt: alt.to_string(),
                });
                rest = &rest[consumed..];
                continue;
            }
        } else if rest.starts_with('[') {
            if let Some((label, destination, consumed)) = parse_bracketed(rest, 1) {
                flush_plain(&mut nodes, &mut plain);
                nodes.push(InlineNode::Link {
                    destination: (!destination.is_empty()).then(|| destination.to_string()),
                    children: parse_inline(label),
                });
                rest = &rest[consumed..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                flush_plain(&mut nodes, &mut plain);
                nodes.push(InlineNode::Strong {
                    children: parse_inline(&after[..end]),
                });
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = after.find('*') {
                flush_plain(&mut nodes, &mut plain);
                nodes.push(InlineNode::Emphasis {
                    children: parse_inline(&after[..end]),
                });
                rest = &after[end + 1..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = after.find('`') {
                flush_plain(&mut nodes, &mut plain);
                nodes.push(InlineNode::InlineCode {
                    code: after[..end].to_string(),
                });
                rest = &after[end + 1..];
                continue;
            }
        }

        let ch = rest.chars().next().expect("non-empty rest");
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    flush_plain(&mut nodes, &mut plain);
    nodes
}

fn flush_plain(nodes: &mut Vec<InlineNode>, plain: &mut String) {
    if !plain.is_empty() {
        nodes.push(InlineNode::text(std::mem::take(plain)));
    }
}

/// Parse `[label](target)` starting at `prefix` bytes in (1 for links, 2 for
/// images). Returns `(label, target, bytes_consumed)`.
fn parse_bracketed(s: &str, prefix: usize) -> Option<(&str, &str, usize)> {
    let close = s[prefix..].find(']')? + prefix;
    let after_close = &s[close + 1..];
    if !after_close.starts_with('(') {
        return None;
    }
    let paren_end = after_close[1..].find(')')? + close + 2;
    Some((&s[prefix..close], &s[close + 2..paren_end], paren_end + 1))
}

fn collect_link_destinations(nodes: &[SemanticNode]) -> Vec<String> {
    fn from_inline(children: &[InlineNode], out: &mut Vec<String>) {
        for child in children {
            match child {
                InlineNode::Link {
                    destination,
                    children,
                } => {
                    if let Some(destination) = destination {
                        out.push(destination.clone());
                    }
                    from_inline(children, out);
                }
                InlineNode::Emphasis { children } | InlineNode::Strong { children } => {
                    from_inline(children, out);
                }
                _ => {}
            }
        }
    }

    fn from_node(node: &SemanticNode, out: &mut Vec<String>) {
        match node {
            SemanticNode::Paragraph { children, .. } | SemanticNode::ListItem { children, .. } => {
                from_inline(children, out);
            }
            SemanticNode::List { items, .. } => {
                for item in items {
                    from_node(item, out);
                }
            }
            SemanticNode::Blockquote { children, .. } => {
                for child in children {
                    from_node(child, out);
                }
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for node in nodes {
        from_node(node, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dendrite_core::MetadataBuilder;

    async fn parse(input: &str) -> ParsedDocument {
        MarkdownParser::new()
            .parse(input.as_bytes(), "md", MetadataBuilder::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_front_matter_metadata() {
        let doc = parse(
            "---\ntitle: \"Guide\"\nauthor: \"A\"\nkeywords: rust, chunking\n---\n\n# Intro\n\nHello world.\n",
        )
        .await;
        assert_eq!(doc.metadata.title.as_deref(), Some("Guide"));
        assert_eq!(doc.metadata.author.as_deref(), Some("A"));
        assert!(doc.metadata.keywords.contains("rust"));
        assert!(doc.metadata.keywords.contains("chunking"));
        match &doc.metadata.source_details {
            Some(SourceDetails::Markdown {
                has_front_matter, ..
            }) => assert!(has_front_matter),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_headings_and_outline() {
        let doc = parse("# One\n\ntext\n\n## Two\n\nmore\n\n### Three\n").await;
        let headings: Vec<_> = doc
            .nodes
            .iter()
            .filter_map(|n| match n {
                SemanticNode::Heading { level, text, .. } => Some((*level, text.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec![
                (1, "One".to_string()),
                (2, "Two".to_string()),
                (3, "Three".to_string())
            ]
        );
        match &doc.metadata.source_details {
            Some(SourceDetails::Markdown { outline, .. }) => {
                assert_eq!(outline.len(), 3);
                assert_eq!(outline[0].text, "One");
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_seven_hashes_is_not_a_heading() {
        let doc = parse("####### not a heading\n").await;
        assert!(matches!(doc.nodes[0], SemanticNode::Paragraph { .. }));
    }

    #[tokio::test]
    async fn test_fenced_code_block() {
        let doc = parse("```rust\nfn main() {}\nlet x = 1;\n```\n").await;
        assert_eq!(doc.nodes.len(), 1);
        match &doc.nodes[0] {
            SemanticNode::CodeBlock { language, code, .. } => {
                assert_eq!(language.as_deref(), Some("rust"));
                assert_eq!(code, "fn main() {}\nlet x = 1;");
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unterminated_fence_consumes_rest() {
        let doc = parse("```\ncode line\n").await;
        assert_eq!(doc.nodes.len(), 1);
        assert!(matches!(doc.nodes[0], SemanticNode::CodeBlock { .. }));
    }

    #[tokio::test]
    async fn test_pipe_table() {
        let doc = parse("| Name | Qty |\n|------|-----|\n| Bolt | 4 |\n| Nut | 8 |\n").await;
        assert_eq!(doc.nodes.len(), 1);
        match &doc.nodes[0] {
            SemanticNode::Table { headers, rows, .. } => {
                assert_eq!(headers, &["Name", "Qty"]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0], vec!["Bolt", "4"]);
            }
            other => panic!("unexpected node: {other:?}"),
        }
        match &doc.metadata.source_details {
            Some(SourceDetails::Markdown { table_count, .. }) => assert_eq!(*table_count, 1),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pipe_without_separator_is_paragraph() {
        let doc = parse("| just some text |\n").await;
        assert!(matches!(doc.nodes[0], SemanticNode::Paragraph { .. }));
    }

    #[tokio::test]
    async fn test_unordered_list() {
        let doc = parse("- alpha\n- beta\n- gamma\n").await;
        match &doc.nodes[0] {
            SemanticNode::List { ordered, items, .. } => {
                assert!(!ordered);
                assert_eq!(items.len(), 3);
                assert_eq!(items[1].plain_text(), "beta");
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_list() {
        let doc = parse("1. first\n2. second\n").await;
        match &doc.nodes[0] {
            SemanticNode::List { ordered, items, .. } => {
                assert!(ordered);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_continuation_lines() {
        let doc = parse("- first item\n  continued here\n- second\n").await;
        match &doc.nodes[0] {
            SemanticNode::List { items, .. } => {
                assert_eq!(items[0].plain_text(), "first item continued here");
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blockquote() {
        let doc = parse("> quoted wisdom\n> and more\n").await;
        match &doc.nodes[0] {
            SemanticNode::Blockquote { children, .. } => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].plain_text(), "quoted wisdom and more");
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_thematic_break() {
        let doc = parse("before\n\n---\n\nafter\n").await;
        assert_eq!(doc.nodes.len(), 3);
        assert!(matches!(doc.nodes[1], SemanticNode::ThematicBreak { .. }));
    }

    #[tokio::test]
    async fn test_paragraph_soft_wrap_joins() {
        let doc = parse("line one\nline two\n").await;
        assert_eq!(doc.nodes[0].plain_text(), "line one line two");
    }

    #[tokio::test]
    async fn test_inline_link_collected_into_metadata() {
        let doc = parse("See [the docs](https://example.com/docs) for details.\n").await;
        assert!(doc.metadata.links.contains("https://example.com/docs"));
        assert_eq!(
            doc.nodes[0].plain_text(),
            "See the docs for details."
        );
    }

    #[tokio::test]
    async fn test_inline_markup_shapes() {
        let nodes = parse_inline("a **bold** and *soft* `code` ![alt](img.png) end");
        let rendered: Vec<&str> = nodes
            .iter()
            .map(|n| match n {
                InlineNode::Text { .. } => "text",
                InlineNode::Strong { .. } => "strong",
                InlineNode::Emphasis { .. } => "em",
                InlineNode::InlineCode { .. } => "code",
                InlineNode::Image { .. } => "image",
                InlineNode::Link { .. } => "link",
            })
            .collect();
        assert_eq!(
            rendered,
            vec!["text", "strong", "text", "em", "text", "code", "text", "image", "text"]
        );
    }

    #[tokio::test]
    async fn test_unclosed_markup_stays_literal() {
        let nodes = parse_inline("an *unclosed emphasis");
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], InlineNode::Text { text } if text == "an *unclosed emphasis"));
    }

    #[tokio::test]
    async fn test_date_front_matter() {
        let doc = parse("---\ntitle: T\ndate: 2024-03-01\n---\n\nBody.\n").await;
        assert!(doc.metadata.created_at.is_some());
    }

    #[tokio::test]
    async fn test_no_front_matter_title_is_none() {
        let doc = parse("# Just a Heading\n\nBody text.\n").await;
        assert_eq!(doc.metadata.title, None);
    }

    #[tokio::test]
    async fn test_node_ids_unique_within_document() {
        let doc = parse("# A\n\npara one\n\n# B\n\npara two\n").await;
        let mut ids: Vec<_> = doc.nodes.iter().map(|n| n.id().clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), doc.nodes.len());
    }

    #[tokio::test]
    async fn test_determinism() {
        let input = "---\ntitle: T\n---\n\n# H\n\nsome text\n\n- a\n- b\n";
        let a = parse(input).await;
        let b = parse(input).await;
        let ja = serde_json::to_string(&a.nodes).unwrap();
        let jb = serde_json::to_string(&b.nodes).unwrap();
        assert_eq!(ja, jb);
    }
}
