//! Keyword tags
//!
//! Candidate phrases are the runs of words between stop words. Phrases that
//! recur, and longer phrases, rank higher.

use super::{is_stop_word, tokenize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tags kept per video
pub const DEFAULT_MAX_TAGS: usize = 6;

/// Runs of non-stop words, lowercased; phrases of two characters or fewer are dropped
fn candidate_phrases(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for word in tokenize(text) {
        if is_stop_word(&word) {
            if !current.is_empty() {
                phrases.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        phrases.push(current.join(" "));
    }

    phrases.retain(|phrase| phrase.chars().count() > 2);
    phrases
}

fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives up to `max_tags` title-cased tags from a title and description
///
/// Each distinct phrase scores `count * (1 + log2(words))`. Ties keep the
/// order in which phrases first appear.
pub fn generate_tags(title: Option<&str>, description: Option<&str>, max_tags: usize) -> Vec<String> {
    let combined = [title, description]
        .into_iter()
        .flatten()
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for phrase in candidate_phrases(&combined) {
        match seen.get(&phrase) {
            Some(&index) => counts[index].1 += 1,
            None => {
                seen.insert(phrase.clone(), counts.len());
                counts.push((phrase, 1));
            }
        }
    }

    let mut scored: Vec<(String, f64)> = counts
        .into_iter()
        .map(|(phrase, count)| {
            let words = phrase.split(' ').count() as f64;
            let score = count as f64 * (1.0 + words.log2());
            (phrase, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .take(max_tags)
        .map(|(phrase, _)| title_case(&phrase))
        .collect()
}
