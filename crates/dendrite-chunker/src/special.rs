//! Specialized handlers for tables and code blocks.
//!
//! Tables explode into one schema chunk plus one chunk per logical row, each
//! carrying enough surrounding context (caption, headers) to stand alone.
//! Code blocks stay whole when they fit and otherwise split line-by-line,
//! never inside a single line.

use std::collections::BTreeSet;

use dendrite_core::{ChunkError, NodeId, SemanticNode};

use crate::engine::DocumentRun;

impl DocumentRun<'_> {
    pub(crate) async fn handle_table(
        &mut self,
        caption: Option<&str>,
        headers: &[String],
        rows: &[Vec<String>],
        node_id: &NodeId,
        node: &SemanticNode,
    ) -> Result<(), ChunkError> {
        let caption = caption.map(str::trim).filter(|c| !c.is_empty());
        let base = self.trail.snapshot().child("Table");
        let importance = node.structural_importance();

        let mut structure = String::from("Table Information:\n");
        if let Some(caption) = caption {
            structure.push_str(&format!("Caption: {caption}\n"));
        }
        structure.push_str(&format!("Headers: {}\n", headers.join(", ")));
        structure.push_str(&format!("Rows: {}\n", rows.len()));
        structure.push_str(&format!(
            "Structure: {} columns × {} rows",
            headers.len(),
            rows.len()
        ));
        self.emit(
            structure,
            base.child("Structure"),
            single_source(node_id),
            importance,
        )
        .await?;

        for (i, row) in rows.iter().enumerate() {
            let mut content = String::new();
            if let Some(caption) = caption {
                content.push_str(&format!("Table: {caption}\n"));
            }
            let fields = headers
                .iter()
                .zip(row)
                .map(|(header, value)| format!("{header}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            content.push_str(&format!("Row: {{ {fields} }}"));

            self.emit(
                content,
                base.child(format!("Row {}", i + 1)),
                single_source(node_id),
                importance,
            )
            .await?;
        }
        Ok(())
    }

    pub(crate) async fn handle_code(
        &mut self,
        language: Option<&str>,
        code: &str,
        node_id: &NodeId,
        node: &SemanticNode,
    ) -> Result<(), ChunkError> {
        let base = self.trail.snapshot().child("Code");
        let importance = node.structural_importance();
        let label = match language {
            Some(language) => format!("Code ({language}):\n"),
            None => "Code:\n".to_string(),
        };

        let max = self.engine.config().max_tokens_per_chunk;
        let code_tokens = self.tokenizer().count_tokens(code).await?;
        if code_tokens.get() <= max {
            self.emit(
                format!("{label}{code}"),
                base,
                single_source(node_id),
                importance,
            )
            .await?;
            return Ok(());
        }

        // Reserve room for the wrapper so parts stay within budget.
        let label_tokens = self.tokenizer().count_tokens(&label).await?;
        let budget = max.saturating_sub(label_tokens.get()).max(1);

        let mut part = 1usize;
        let mut lines: Vec<&str> = Vec::new();
        let mut tokens = 0usize;

        for line in code.lines() {
            let line_tokens = self.tokenizer().count_tokens(line).await?.get();
            if !lines.is_empty() && tokens + line_tokens > budget {
                let content = format!("{label}{}", lines.join("\n"));
                self.emit(
                    content,
                    base.child(format!("Part {part}")),
                    single_source(node_id),
                    importance,
                )
                .await?;
                part += 1;
                lines.clear();
                tokens = 0;
            }
            lines.push(line);
            tokens += line_tokens;
        }
        if !lines.is_empty() {
            let content = format!("{label}{}", lines.join("\n"));
            self.emit(
                content,
                base.child(format!("Part {part}")),
                single_source(node_id),
                importance,
            )
            .await?;
        }
        Ok(())
    }
}

fn single_source(node_id: &NodeId) -> BTreeSet<NodeId> {
    let mut set = BTreeSet::new();
    set.insert(node_id.clone());
    set
}
