//! Word-boundary tokenizer.
//!
//! Counts Unicode words as tokens and splits text at sentence, word, or
//! paragraph boundaries. Fully deterministic: the same input always yields
//! the same counts and pieces.

use async_trait::async_trait;
use dendrite_core::{SplitUnit, TokenCount, TokenizeError, Tokenizer, TokenizerInfo};
use unicode_segmentation::UnicodeSegmentation;

/// A tokenizer that treats Unicode words as tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn count(text: &str) -> usize {
        text.unicode_words().count()
    }

    /// Split `text` into pieces of at most `max` words, never breaking
    /// inside a word.
    fn split_words(text: &str, max: usize) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut words = 0usize;

        for segment in text.split_word_bounds() {
            let is_word = segment.chars().any(char::is_alphanumeric);
            if is_word && words == max {
                push_piece(&mut pieces, &current);
                current.clear();
                words = 0;
            }
            current.push_str(segment);
            if is_word {
                words += 1;
            }
        }
        push_piece(&mut pieces, &current);
        pieces
    }
}

fn push_piece(pieces: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}

#[async_trait]
impl Tokenizer for WordTokenizer {
    fn model_info(&self) -> TokenizerInfo {
        TokenizerInfo {
            name: "word-boundary".to_string(),
            max_context_tokens: 8192,
            avg_tokens_per_word: 1.0,
        }
    }

    async fn count_tokens(&self, text: &str) -> Result<TokenCount, TokenizeError> {
        Ok(TokenCount(Self::count(text)))
    }

    async fn split(
        &self,
        text: &str,
        max_tokens: TokenCount,
        unit: SplitUnit,
    ) -> Result<Vec<String>, TokenizeError> {
        let max = max_tokens.get();
        if max == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }
        if Self::count(text) <= max {
            return Ok(vec![text.to_string()]);
        }

        let units: Vec<&str> = match unit {
            SplitUnit::Sentence => text.split_sentence_bounds().collect(),
            SplitUnit::Word => return Ok(Self::split_words(text, max)),
            SplitUnit::Paragraph => text.split("\n\n").collect(),
        };
        let separator = match unit {
            SplitUnit::Paragraph => "\n\n",
            _ => "",
        };

        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;

        for unit_text in units {
            let unit_tokens = Self::count(unit_text);
            if unit_tokens == 0 {
                continue;
            }

            // A single unit over budget falls back to word-level splitting;
            // the chunker never re-splits.
            if unit_tokens > max {
                push_piece(&mut pieces, &current);
                current.clear();
                current_tokens = 0;
                pieces.extend(Self::split_words(unit_text, max));
                continue;
            }

            if current_tokens + unit_tokens > max {
                push_piece(&mut pieces, &current);
                current.clear();
                current_tokens = 0;
            }
            if !current.is_empty() {
                current.push_str(separator);
            }
            current.push_str(unit_text);
            current_tokens += unit_tokens;
        }
        push_piece(&mut pieces, &current);

        Ok(pieces)
    }
}
