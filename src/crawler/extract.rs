//! Embedded page state extraction
//!
//! Search and watch pages ship their initial render data as a JSON object
//! assigned to a well-known identifier inside a `<script>` block, e.g.
//! `var ytInitialData = {...};`. This module finds that assignment, decodes
//! the object, and offers a safe accessor for walking the decoded tree.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

/// Identifier of the state object embedded in search listing pages
pub const SEARCH_STATE_IDENTIFIER: &str = "ytInitialData";

/// Identifier of the player response embedded in watch pages
pub const PLAYER_STATE_IDENTIFIER: &str = "ytInitialPlayerResponse";

/// Pattern for the search listing state
pub static SEARCH_STATE: LazyLock<EmbeddedState> =
    LazyLock::new(|| EmbeddedState::new(SEARCH_STATE_IDENTIFIER).expect("escaped identifier"));

/// Pattern for the watch page player response
pub static PLAYER_STATE: LazyLock<EmbeddedState> =
    LazyLock::new(|| EmbeddedState::new(PLAYER_STATE_IDENTIFIER).expect("escaped identifier"));

/// Locates `identifier = {...};` in a document and decodes the object
///
/// The match is non-greedy and spans lines, stopping at the first `};`.
#[derive(Debug, Clone)]
pub struct EmbeddedState {
    identifier: String,
    pattern: Regex,
}

impl EmbeddedState {
    /// Builds the assignment pattern for `identifier`
    pub fn new(identifier: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?s){}\s*=\s*(\{{.+?\}});",
            regex::escape(identifier)
        ))?;
        Ok(Self {
            identifier: identifier.to_string(),
            pattern,
        })
    }

    /// The identifier this pattern looks for
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the raw text of the first assigned object, if any
    ///
    /// `<script>` contents are searched first, in document order. If no
    /// script carries the assignment the whole text is searched, which also
    /// covers bare fragments that are not wrapped in markup.
    pub fn find_raw<'h>(&self, html: &'h str) -> Option<&'h str> {
        for script in script_ranges(html) {
            if let Some(raw) = self.capture(&html[script]) {
                return Some(raw);
            }
        }
        self.capture(html)
    }

    /// Finds and decodes the embedded state
    ///
    /// Returns `None` when the identifier is absent or the captured text
    /// cannot be decoded even after the trailing-syntax cleanup.
    pub fn extract(&self, html: &str) -> Option<Value> {
        let Some(raw) = self.find_raw(html) else {
            tracing::debug!("No {} assignment found", self.identifier);
            return None;
        };

        let decoded = decode_fragment(raw);
        if decoded.is_none() {
            tracing::warn!(
                "Failed to decode {} ({} bytes captured)",
                self.identifier,
                raw.len()
            );
        }
        decoded
    }

    fn capture<'h>(&self, text: &'h str) -> Option<&'h str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Decodes a captured JSON fragment in two stages
///
/// The fragment is parsed strictly first. If that fails, surrounding
/// whitespace and trailing semicolons are stripped and it is parsed once more.
pub fn decode_fragment(raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(first) => {
            tracing::debug!("Strict decode failed ({}), retrying without trailing ';'", first);
            let cleaned = raw.trim().trim_end_matches(';').trim_end();
            serde_json::from_str(cleaned).ok()
        }
    }
}

/// Byte ranges of every `<script>` body, in document order
fn script_ranges(html: &str) -> Vec<std::ops::Range<usize>> {
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut ranges = Vec::new();
    let mut cursor = 0;
    for element in document.select(&selector) {
        let body: String = element.text().collect();
        if body.trim().is_empty() {
            continue;
        }
        // Script bodies are raw text, so they appear verbatim in the source
        if let Some(offset) = html[cursor..].find(body.as_str()) {
            let start = cursor + offset;
            ranges.push(start..start + body.len());
            cursor = start + body.len();
        }
    }
    ranges
}

/// One step of a path into decoded page state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Look up a key in an object
    Key(&'a str),
    /// Index into an array
    Index(usize),
}

/// Walks `path` from `root`, returning the node at the end
///
/// Short-circuits to `None` as soon as a key or index is missing, a node has
/// the wrong shape for the step, or an intermediate value is `null`.
pub fn value_at<'v>(root: &'v Value, path: &[Step<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, step| {
        let next = match (step, node) {
            (Step::Key(key), Value::Object(map)) => map.get(*key),
            (Step::Index(index), Value::Array(items)) => items.get(*index),
            _ => None,
        }?;
        (!next.is_null()).then_some(next)
    })
}

/// String at the end of `path`, if present
pub fn str_at<'v>(root: &'v Value, path: &[Step<'_>]) -> Option<&'v str> {
    value_at(root, path).and_then(Value::as_str)
}

/// Array at the end of `path`, or an empty slice
pub fn array_at<'v>(root: &'v Value, path: &[Step<'_>]) -> &'v [Value] {
    value_at(root, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
