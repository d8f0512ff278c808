//! Extractive summaries
//!
//! Sentences are scored by how often their words recur across the whole
//! description; the best few are kept in their original order.

use super::{is_stop_word, tokenize};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Sentences kept per summary
pub const DEFAULT_SUMMARY_SENTENCES: usize = 2;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence pattern"));

/// Splits after `.`, `!` or `?` when followed by whitespace
fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BREAK.find_iter(text) {
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Picks the `max_sentences` most representative sentences of `description`
///
/// A sentence scores the summed corpus frequency of its non-stop-word tokens,
/// divided by its token count. Returns `None` for a missing or empty
/// description, or one without any words.
pub fn generate_summary(description: Option<&str>, max_sentences: usize) -> Option<String> {
    let description = description.filter(|d| !d.trim().is_empty())?;
    let sentences = split_sentences(description);

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for token in tokenize(&sentences.join(" ")) {
        *frequency.entry(token).or_default() += 1;
    }

    let mut scored: Vec<(usize, &str, f64)> = sentences
        .iter()
        .enumerate()
        .filter_map(|(position, sentence)| {
            let tokens = tokenize(sentence);
            if tokens.is_empty() {
                return None;
            }
            let total: usize = tokens
                .iter()
                .filter(|t| !is_stop_word(t))
                .map(|t| frequency.get(t.as_str()).copied().unwrap_or(0))
                .sum();
            Some((position, *sentence, total as f64 / tokens.len() as f64))
        })
        .collect();

    if scored.is_empty() {
        return None;
    }

    // stable, so ties keep document order
    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
    scored.truncate(max_sentences);
    scored.sort_by_key(|(position, _, _)| *position);

    Some(
        scored
            .iter()
            .map(|(_, sentence, _)| *sentence)
            .collect::<Vec<_>>()
            .join(" "),
    )
}
