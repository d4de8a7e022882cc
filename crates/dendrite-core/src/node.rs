//! The semantic node tree (intermediate representation).
//!
//! Parsers normalize every source format into this tree; the chunker consumes
//! it without knowing where it came from. Block nodes carry a deterministic,
//! content-addressed [`NodeId`]; inline nodes are identified only by their
//! enclosing block.
//!
//! Identity follows `NodeId = SHA-256(parent_id ‖ identity_content)`. The
//! associated constructors derive IDs top-down: container constructors
//! re-derive their block children's IDs with the container's own ID as
//! parent, so trees built bottom-up still satisfy the hash chain.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Byte range of a node in its source document.
pub type Span = Range<usize>;

/// A block-level node in the semantic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SemanticNode {
    /// Section heading, level 1..=6.
    Heading {
        id: NodeId,
        level: u8,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    Paragraph {
        id: NodeId,
        children: Vec<InlineNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    /// Ordered or unordered list; items are always `ListItem` nodes.
    List {
        id: NodeId,
        ordered: bool,
        items: Vec<SemanticNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    ListItem {
        id: NodeId,
        children: Vec<InlineNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    Blockquote {
        id: NodeId,
        children: Vec<SemanticNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    CodeBlock {
        id: NodeId,
        language: Option<String>,
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    /// Headers and every row have identical length (normalized at
    /// construction).
    Table {
        id: NodeId,
        caption: Option<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
    ThematicBreak {
        id: NodeId,
        #[serde(skip_serializing_if = "Option::is_none")]
        span: Option<Span>,
    },
}

/// An inline node. No independent identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineNode {
    Text { text: String },
    Emphasis { children: Vec<InlineNode> },
    Strong { children: Vec<InlineNode> },
    InlineCode { code: String },
    Link {
        destination: Option<String>,
        children: Vec<InlineNode>,
    },
    Image {
        source: Option<String>,
        alt: String,
    },
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Textual projection of an inline run: leaves concatenated in order.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::InlineCode { code } => code.clone(),
            Self::Emphasis { children } | Self::Strong { children } => inline_text(children),
            Self::Link { children, .. } => inline_text(children),
            Self::Image { alt, .. } => alt.clone(),
        }
    }

    /// Heuristic weight of the inline kind, used in quality scoring. Only
    /// plain text carries weight; markup wrappers score zero.
    #[must_use]
    pub fn structural_importance(&self) -> f64 {
        match self {
            Self::Text { .. } => 0.3,
            _ => 0.0,
        }
    }

    fn to_markdown(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::InlineCode { code } => format!("`{code}`"),
            Self::Emphasis { children } => format!("*{}*", inline_markdown(children)),
            Self::Strong { children } => format!("**{}**", inline_markdown(children)),
            Self::Link {
                destination,
                children,
            } => match destination {
                Some(dest) => format!("[{}]({dest})", inline_markdown(children)),
                None => inline_markdown(children),
            },
            Self::Image { source, alt } => match source {
                Some(src) => format!("![{alt}]({src})"),
                None => format!("![{alt}]()"),
            },
        }
    }
}

/// Concatenated plain text of an inline run.
#[must_use]
pub fn inline_text(children: &[InlineNode]) -> String {
    children.iter().map(InlineNode::plain_text).collect()
}

fn inline_markdown(children: &[InlineNode]) -> String {
    children.iter().map(InlineNode::to_markdown).collect()
}

impl SemanticNode {
    /// Create a heading. Levels are clamped into 1..=6.
    #[must_use]
    pub fn heading(parent: Option<&NodeId>, level: u8, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::Heading {
            id: NodeId::derive(parent, &text),
            level: level.clamp(1, 6),
            text,
            span: None,
        }
    }

    #[must_use]
    pub fn paragraph(parent: Option<&NodeId>, children: Vec<InlineNode>) -> Self {
        let id = NodeId::derive(parent, &inline_text(&children));
        Self::Paragraph {
            id,
            children,
            span: None,
        }
    }

    /// Create a list from its item runs. Each run becomes a `ListItem` whose
    /// ID is derived with the list's ID as parent.
    #[must_use]
    pub fn list(parent: Option<&NodeId>, ordered: bool, item_runs: Vec<Vec<InlineNode>>) -> Self {
        let content: String = item_runs.iter().map(|run| inline_text(run)).collect();
        let id = NodeId::derive(parent, &content);
        let items = item_runs
            .into_iter()
            .map(|children| Self::list_item(Some(&id), children))
            .collect();
        Self::List {
            id,
            ordered,
            items,
            span: None,
        }
    }

    #[must_use]
    pub fn list_item(parent: Option<&NodeId>, children: Vec<InlineNode>) -> Self {
        let id = NodeId::derive(parent, &inline_text(&children));
        Self::ListItem {
            id,
            children,
            span: None,
        }
    }

    /// Create a blockquote. The children's IDs (and their descendants') are
    /// re-derived with the blockquote's ID as parent.
    #[must_use]
    pub fn blockquote(parent: Option<&NodeId>, mut children: Vec<SemanticNode>) -> Self {
        let content: String = children.iter().map(SemanticNode::plain_text).collect();
        let id = NodeId::derive(parent, &content);
        for child in &mut children {
            child.reparent(Some(&id));
        }
        Self::Blockquote {
            id,
            children,
            span: None,
        }
    }

    #[must_use]
    pub fn code_block(
        parent: Option<&NodeId>,
        language: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        let code = code.into();
        let content = format!("{}{}", language.as_deref().unwrap_or(""), code);
        Self::CodeBlock {
            id: NodeId::derive(parent, &content),
            language,
            code,
            span: None,
        }
    }

    /// Create a table. Rows are normalized to the header width.
    #[must_use]
    pub fn table(
        parent: Option<&NodeId>,
        caption: Option<String>,
        headers: Vec<String>,
        mut rows: Vec<Vec<String>>,
    ) -> Self {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }
        let content = format!(
            "{}{}{}",
            caption.as_deref().unwrap_or(""),
            headers.concat(),
            rows.iter().flatten().cloned().collect::<String>()
        );
        Self::Table {
            id: NodeId::derive(parent, &content),
            caption,
            headers,
            rows,
            span: None,
        }
    }

    #[must_use]
    pub fn thematic_break(parent: Option<&NodeId>) -> Self {
        Self::ThematicBreak {
            id: NodeId::derive(parent, "thematicBreak"),
            span: None,
        }
    }

    /// Attach a source byte range.
    #[must_use]
    pub fn with_span(mut self, range: Span) -> Self {
        *self.span_mut() = Some(range);
        self
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Heading { id, .. }
            | Self::Paragraph { id, .. }
            | Self::List { id, .. }
            | Self::ListItem { id, .. }
            | Self::Blockquote { id, .. }
            | Self::CodeBlock { id, .. }
            | Self::Table { id, .. }
            | Self::ThematicBreak { id, .. } => id,
        }
    }

    #[must_use]
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Heading { span, .. }
            | Self::Paragraph { span, .. }
            | Self::List { span, .. }
            | Self::ListItem { span, .. }
            | Self::Blockquote { span, .. }
            | Self::CodeBlock { span, .. }
            | Self::Table { span, .. }
            | Self::ThematicBreak { span, .. } => span.as_ref(),
        }
    }

    fn span_mut(&mut self) -> &mut Option<Span> {
        match self {
            Self::Heading { span, .. }
            | Self::Paragraph { span, .. }
            | Self::List { span, .. }
            | Self::ListItem { span, .. }
            | Self::Blockquote { span, .. }
            | Self::CodeBlock { span, .. }
            | Self::Table { span, .. }
            | Self::ThematicBreak { span, .. } => span,
        }
    }

    /// The string hashed (together with the parent ID) into this node's ID.
    fn identity_content(&self) -> String {
        match self {
            Self::Heading { text, .. } => text.clone(),
            Self::Paragraph { children, .. } | Self::ListItem { children, .. } => {
                inline_text(children)
            }
            Self::List { items, .. } => items.iter().map(SemanticNode::plain_text).collect(),
            Self::Blockquote { children, .. } => {
                children.iter().map(SemanticNode::plain_text).collect()
            }
            Self::CodeBlock { language, code, .. } => {
                format!("{}{}", language.as_deref().unwrap_or(""), code)
            }
            Self::Table {
                caption,
                headers,
                rows,
                ..
            } => format!(
                "{}{}{}",
                caption.as_deref().unwrap_or(""),
                headers.concat(),
                rows.iter().flatten().cloned().collect::<String>()
            ),
            Self::ThematicBreak { .. } => "thematicBreak".to_string(),
        }
    }

    /// Re-derive this node's ID under a new parent, cascading through block
    /// descendants so the hash chain stays intact.
    pub(crate) fn reparent(&mut self, parent: Option<&NodeId>) {
        let id = NodeId::derive(parent, &self.identity_content());
        match self {
            Self::Heading { id: slot, .. }
            | Self::Paragraph { id: slot, .. }
            | Self::ListItem { id: slot, .. }
            | Self::CodeBlock { id: slot, .. }
            | Self::Table { id: slot, .. }
            | Self::ThematicBreak { id: slot, .. } => *slot = id,
            Self::List { id: slot, items, .. } => {
                *slot = id.clone();
                for item in items {
                    item.reparent(Some(&id));
                }
            }
            Self::Blockquote {
                id: slot, children, ..
            } => {
                *slot = id.clone();
                for child in children {
                    child.reparent(Some(&id));
                }
            }
        }
    }

    /// Textual projection: leaves concatenated, newline separators between
    /// list items and between table rows.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match self {
            Self::Heading { text, .. } => text.clone(),
            Self::Paragraph { children, .. } | Self::ListItem { children, .. } => {
                inline_text(children)
            }
            Self::List { items, .. } => items
                .iter()
                .map(SemanticNode::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Blockquote { children, .. } => children
                .iter()
                .map(SemanticNode::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::CodeBlock { code, .. } => code.clone(),
            Self::Table { headers, rows, .. } => {
                let mut lines = Vec::with_capacity(rows.len() + 1);
                if !headers.is_empty() {
                    lines.push(headers.join(" | "));
                }
                for row in rows {
                    lines.push(row.join(" | "));
                }
                lines.join("\n")
            }
            Self::ThematicBreak { .. } => String::new(),
        }
    }

    /// Markdown projection of the node.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        match self {
            Self::Heading { level, text, .. } => {
                format!("{} {}", "#".repeat(usize::from(*level)), text)
            }
            Self::Paragraph { children, .. } => inline_markdown(children),
            Self::ListItem { children, .. } => inline_markdown(children),
            Self::List { ordered, items, .. } => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if *ordered {
                        format!("{}. {}", i + 1, item.to_markdown())
                    } else {
                        format!("- {}", item.to_markdown())
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Blockquote { children, .. } => children
                .iter()
                .flat_map(|c| {
                    c.to_markdown()
                        .lines()
                        .map(|l| format!("> {l}"))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::CodeBlock { language, code, .. } => {
                format!("```{}\n{}\n```", language.as_deref().unwrap_or(""), code)
            }
            Self::Table {
                caption,
                headers,
                rows,
                ..
            } => {
                let mut out = String::new();
                if let Some(caption) = caption {
                    out.push_str(caption);
                    out.push('\n');
                }
                out.push_str(&format!("| {} |\n", headers.join(" | ")));
                out.push_str(&format!(
                    "| {} |\n",
                    headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
                ));
                for row in rows {
                    out.push_str(&format!("| {} |\n", row.join(" | ")));
                }
                out.trim_end().to_string()
            }
            Self::ThematicBreak { .. } => "---".to_string(),
        }
    }

    /// Heuristic weight of the node kind, used in quality scoring.
    #[must_use]
    pub fn structural_importance(&self) -> f64 {
        match self {
            Self::Heading { level, .. } => 1.0 - 0.15 * f64::from(level.saturating_sub(1)),
            Self::Table { .. } => 0.9,
            Self::CodeBlock { .. } => 0.8,
            Self::List { .. } => 0.7,
            Self::Blockquote { .. } => 0.6,
            Self::Paragraph { .. } => 0.5,
            Self::ListItem { .. } | Self::ThematicBreak { .. } => 0.0,
        }
    }

    /// True for node kinds that end the current semantic run.
    #[must_use]
    pub fn is_context_boundary(&self) -> bool {
        matches!(
            self,
            Self::Heading { .. }
                | Self::Table { .. }
                | Self::CodeBlock { .. }
                | Self::ThematicBreak { .. }
        )
    }

    /// True for node kinds the chunker routes through specialized handlers.
    #[must_use]
    pub fn requires_special_handling(&self) -> bool {
        matches!(self, Self::Table { .. } | Self::CodeBlock { .. })
    }
}
