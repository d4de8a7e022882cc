//! Chunk quality scoring.
//!
//! Combines length fitness against the token budget, the mean structural
//! importance of the contributing nodes, and surface features of the content
//! into a score in [0, 1] used for post-filtering.

use dendrite_core::TokenCount;

/// Score a candidate chunk.
pub(crate) fn score_chunk(
    content: &str,
    token_count: TokenCount,
    avg_importance: f64,
    max_tokens: usize,
) -> f64 {
    let mut score = 1.0_f64;

    let ratio = token_count.get() as f64 / max_tokens.max(1) as f64;
    if ratio < 0.1 {
        score *= 0.7;
    } else if ratio > 0.9 {
        score *= 0.9;
    }

    score = (score + avg_importance) / 2.0;
    score = (score + content_quality(content)) / 2.0;
    score.clamp(0.0, 1.0)
}

fn content_quality(content: &str) -> f64 {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if trimmed.chars().count() < 10 {
        return 0.3;
    }

    let mut score = 0.7_f64;
    if has_complete_sentence(trimmed) {
        score += 0.2;
    }
    if trimmed.contains([':', '-', '•']) {
        score += 0.1;
    }
    score.min(1.0)
}

/// A segment split on sentence punctuation that is longer than 5 chars and
/// starts with a letter.
fn has_complete_sentence(text: &str) -> bool {
    text.split(['.', '!', '?']).any(|segment| {
        let segment = segment.trim();
        segment.chars().count() > 5 && segment.chars().next().is_some_and(char::is_alphabetic)
    })
}
