//! HTML parser.
//!
//! Walks the `<body>` DOM in document order and maps structural elements
//! onto the semantic IR. Document metadata comes from `<title>`, `<meta>`
//! tags, and the `lang` attribute; image sources, script count, and link
//! count are recorded as source details.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use dendrite_core::{
    DocumentParser, InlineNode, MetadataBuilder, ParseError, ParsedDocument, SemanticNode,
    SourceDetails,
};

use crate::text::decode_utf8;

/// Parser for HTML documents.
pub struct HtmlParser;

impl HtmlParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for HtmlParser {
    fn name(&self) -> &str {
        "html"
    }

    fn supported_types(&self) -> &[&str] {
        &["html", "htm", "text/html"]
    }

    async fn parse(
        &self,
        bytes: &[u8],
        _content_type: &str,
        builder: MetadataBuilder,
    ) -> Result<ParsedDocument, ParseError> {
        let text = decode_utf8(bytes)?;
        let document = Html::parse_document(text);

        let mut builder = extract_metadata(&document, builder);

        let body_selector = Selector::parse("body").unwrap();
        let mut nodes = Vec::new();
        if let Some(body) = document.select(&body_selector).next() {
            walk_block(body, &mut nodes);
        }
        debug!(nodes = nodes.len(), "parsed html blocks");

        let image_selector = Selector::parse("img[src]").unwrap();
        let image_sources: Vec<String> = document
            .select(&image_selector)
            .filter_map(|el| el.value().attr("src"))
            .map(str::to_string)
            .collect();

        let script_selector = Selector::parse("script").unwrap();
        let script_count = document.select(&script_selector).count();

        let anchor_selector = Selector::parse("a[href]").unwrap();
        let hrefs: Vec<String> = document
            .select(&anchor_selector)
            .filter_map(|el| el.value().attr("href"))
            .map(str::to_string)
            .collect();
        let link_count = hrefs.len();
        for href in hrefs {
            builder = builder.link(href);
        }

        let metadata = builder
            .source_details(SourceDetails::Html {
                image_sources,
                script_count,
                link_count,
            })
            .build();

        Ok(ParsedDocument { nodes, metadata })
    }
}

fn extract_metadata(document: &Html, mut builder: MetadataBuilder) -> MetadataBuilder {
    let title_selector = Selector::parse("title").unwrap();
    if let Some(title) = document
        .select(&title_selector)
        .next()
        .map(collapsed_text)
        .filter(|t| !t.is_empty())
    {
        builder = builder.title(title);
    }

    if let Some(author) = meta_content(document, "author") {
        builder = builder.author(author);
    }
    if let Some(description) = meta_content(document, "description") {
        builder = builder.description(description);
    }
    if let Some(keywords) = meta_content(document, "keywords") {
        for keyword in keywords.split(',') {
            let keyword = keyword.trim();
            if !keyword.is_empty() {
                builder = builder.keyword(keyword);
            }
        }
    }

    let html_selector = Selector::parse("html[lang]").unwrap();
    if let Some(lang) = document
        .select(&html_selector)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .filter(|l| !l.trim().is_empty())
    {
        builder = builder.language(lang.trim());
    }

    builder
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Map the children of `element` onto block nodes, recursing through
/// non-semantic containers.
fn walk_block(element: ElementRef, nodes: &mut Vec<SemanticNode>) {
    for child in element.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        match el.value().name() {
            name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                let level = name[1..].parse().unwrap_or(1);
                let text = collapsed_text(el);
                if !text.is_empty() {
                    nodes.push(SemanticNode::heading(None, level, text));
                }
            }
            "p" => {
                let children = inline_children(el);
                if !children.is_empty() {
                    nodes.push(SemanticNode::paragraph(None, children));
                }
            }
            "ul" | "ol" => {
                let ordered = el.value().name() == "ol";
                let item_selector = Selector::parse("li").unwrap();
                let runs: Vec<Vec<InlineNode>> = el
                    .select(&item_selector)
                    .map(inline_children)
                    .filter(|run| !run.is_empty())
                    .collect();
                if !runs.is_empty() {
                    nodes.push(SemanticNode::list(None, ordered, runs));
                }
            }
            "pre" => {
                let code_selector = Selector::parse("code").unwrap();
                let (code, language) = match el.select(&code_selector).next() {
                    Some(code_el) => (
                        code_el.text().collect::<String>(),
                        language_from_class(code_el),
                    ),
                    None => (el.text().collect::<String>(), None),
                };
                let code = code.trim_matches('\n').to_string();
                if !code.trim().is_empty() {
                    nodes.push(SemanticNode::code_block(None, language, code));
                }
            }
            "table" => {
                if let Some(table) = parse_table(el) {
                    nodes.push(table);
                }
            }
            "blockquote" => {
                let paragraph_selector = Selector::parse("p").unwrap();
                let mut children: Vec<SemanticNode> = el
                    .select(&paragraph_selector)
                    .map(|p| SemanticNode::paragraph(None, inline_children(p)))
                    .collect();
                if children.is_empty() {
                    let text = collapsed_text(el);
                    if !text.is_empty() {
                        children.push(SemanticNode::paragraph(
                            None,
                            vec![InlineNode::text(text)],
                        ));
                    }
                }
                if !children.is_empty() {
                    nodes.push(SemanticNode::blockquote(None, children));
                }
            }
            "hr" => nodes.push(SemanticNode::thematic_break(None)),
            "script" | "style" | "noscript" => {}
            // containers and anything unknown: keep walking in order
            _ => walk_block(el, nodes),
        }
    }
}

/// Map the children of a text-bearing element onto inline nodes.
fn inline_children(element: ElementRef) -> Vec<InlineNode> {
    let mut out = Vec::new();
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let piece = collapse_inline(text);
            // a lone whitespace run only matters between siblings
            if !piece.trim().is_empty() || (piece == " " && !out.is_empty()) {
                out.push(InlineNode::text(piece));
            }
            continue;
        }
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        match el.value().name() {
            "a" => out.push(InlineNode::Link {
                destination: el.value().attr("href").map(str::to_string),
                children: inline_children(el),
            }),
            "strong" | "b" => out.push(InlineNode::Strong {
                children: inline_children(el),
            }),
            "em" | "i" => out.push(InlineNode::Emphasis {
                children: inline_children(el),
            }),
            "code" => out.push(InlineNode::InlineCode {
                code: el.text().collect::<String>(),
            }),
            "img" => out.push(InlineNode::Image {
                source: el.value().attr("src").map(str::to_string),
                alt: el.value().attr("alt").unwrap_or_default().to_string(),
            }),
            "br" => {}
            _ => out.extend(inline_children(el)),
        }
    }
    out
}

fn parse_table(el: ElementRef) -> Option<SemanticNode> {
    let caption_selector = Selector::parse("caption").unwrap();
    let caption = el
        .select(&caption_selector)
        .next()
        .map(collapsed_text)
        .filter(|c| !c.is_empty());

    let header_selector = Selector::parse("th").unwrap();
    let headers: Vec<String> = el.select(&header_selector).map(collapsed_text).collect();

    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let rows: Vec<Vec<String>> = el
        .select(&row_selector)
        .map(|tr| tr.select(&cell_selector).map(collapsed_text).collect())
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    if headers.is_empty() && rows.is_empty() {
        return None;
    }
    Some(SemanticNode::table(None, caption, headers, rows))
}

fn language_from_class(el: ElementRef) -> Option<String> {
    el.value().attr("class").and_then(|classes| {
        classes
            .split_whitespace()
            .find_map(|c| c.strip_prefix("language-"))
            .map(str::to_string)
    })
}

fn collapsed_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse interior whitespace while keeping one boundary space on either
/// side, so concatenated inline runs keep their separation.
fn collapse_inline(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return if text.is_empty() { String::new() } else { " ".to_string() };
    }
    let mut out = String::new();
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dendrite_core::MetadataBuilder;

    async fn parse(input: &str) -> ParsedDocument {
        HtmlParser::new()
            .parse(input.as_bytes(), "html", MetadataBuilder::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_single_heading() {
        let doc = parse("<h1>Hello World</h1>").await;
        assert_eq!(doc.nodes.len(), 1);
        match &doc.nodes[0] {
            SemanticNode::Heading { level, text, .. } => {
                assert_eq!(*level, 1);
                assert_eq!(text, "Hello World");
            }
            other => panic!("unexpected node: {other:?}"),
        }
        assert_eq!(doc.metadata.title, None);
    }

    #[tokio::test]
    async fn test_title_and_meta() {
        let doc = parse(
            r#"<html lang="en"><head><title>Page Title</title>
            <meta name="author" content="A. Writer">
            <meta name="description" content="About things">
            <meta name="keywords" content="one, two"></head>
            <body><p>Body text.</p></body></html>"#,
        )
        .await;
        assert_eq!(doc.metadata.title.as_deref(), Some("Page Title"));
        assert_eq!(doc.metadata.author.as_deref(), Some("A. Writer"));
        assert_eq!(doc.metadata.description.as_deref(), Some("About things"));
        assert!(doc.metadata.keywords.contains("one"));
        assert_eq!(doc.metadata.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_paragraph_with_inline_markup() {
        let doc = parse(
            r#"<p>See <a href="https://example.com">the site</a> for <strong>bold</strong> claims.</p>"#,
        )
        .await;
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(
            doc.nodes[0].plain_text(),
            "See the site for bold claims."
        );
        assert!(doc.metadata.links.contains("https://example.com"));
    }

    #[tokio::test]
    async fn test_lists() {
        let doc = parse("<ul><li>alpha</li><li>beta</li></ul><ol><li>one</li></ol>").await;
        assert_eq!(doc.nodes.len(), 2);
        match &doc.nodes[0] {
            SemanticNode::List { ordered, items, .. } => {
                assert!(!ordered);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected node: {other:?}"),
        }
        assert!(matches!(
            &doc.nodes[1],
            SemanticNode::List { ordered: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_pre_code_with_language() {
        let doc = parse(
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>",
        )
        .await;
        match &doc.nodes[0] {
            SemanticNode::CodeBlock { language, code, .. } => {
                assert_eq!(language.as_deref(), Some("rust"));
                assert_eq!(code, "fn main() {}");
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_table_with_caption() {
        let doc = parse(
            "<table><caption>Inventory</caption>\
             <tr><th>Name</th><th>Qty</th></tr>\
             <tr><td>Bolt</td><td>4</td></tr>\
             <tr><td>Nut</td><td>8</td></tr></table>",
        )
        .await;
        match &doc.nodes[0] {
            SemanticNode::Table {
                caption,
                headers,
                rows,
                ..
            } => {
                assert_eq!(caption.as_deref(), Some("Inventory"));
                assert_eq!(headers, &["Name", "Qty"]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blockquote() {
        let doc = parse("<blockquote><p>Quoted wisdom.</p></blockquote>").await;
        match &doc.nodes[0] {
            SemanticNode::Blockquote { children, .. } => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].plain_text(), "Quoted wisdom.");
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hr_is_thematic_break() {
        let doc = parse("<p>before</p><hr><p>after</p>").await;
        assert_eq!(doc.nodes.len(), 3);
        assert!(matches!(doc.nodes[1], SemanticNode::ThematicBreak { .. }));
    }

    #[tokio::test]
    async fn test_nested_containers_are_flattened() {
        let doc = parse(
            "<div><section><h2>Inside</h2><p>Nested paragraph.</p></section></div>",
        )
        .await;
        assert_eq!(doc.nodes.len(), 2);
        assert!(matches!(doc.nodes[0], SemanticNode::Heading { .. }));
    }

    #[tokio::test]
    async fn test_scripts_skipped_but_counted() {
        let doc = parse(
            "<body><script>var x = 1;</script><p>Visible.</p><script></script></body>",
        )
        .await;
        assert_eq!(doc.nodes.len(), 1);
        match &doc.metadata.source_details {
            Some(SourceDetails::Html { script_count, .. }) => assert_eq!(*script_count, 2),
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_image_inventory() {
        let doc = parse(
            r#"<p>Look: <img src="one.png" alt="first"> and <img src="two.png" alt=""></p>"#,
        )
        .await;
        match &doc.metadata.source_details {
            Some(SourceDetails::Html { image_sources, .. }) => {
                assert_eq!(image_sources, &["one.png", "two.png"]);
            }
            other => panic!("unexpected details: {other:?}"),
        }
        assert_eq!(doc.nodes[0].plain_text().trim(), "Look: first and");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoding_error() {
        let result = HtmlParser::new()
            .parse(&[0xff, 0xfe], "html", MetadataBuilder::new())
            .await;
        assert!(matches!(result, Err(ParseError::Decoding(_))));
    }
}
