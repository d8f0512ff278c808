//! Parsers for decoded page state
//!
//! This module turns the JSON state embedded in pages into typed values:
//! - Search listings become a list of [`ItemSummary`] in listing order
//! - Watch page player responses become [`DetailFields`]
//!
//! Upstream owns this shape and changes it without notice, so nothing here
//! fails. A missing branch of the tree simply yields absent fields.

use crate::crawler::extract::{array_at, str_at, value_at, Step};
use serde_json::Value;
use Step::{Index, Key};

/// Path from the search state root to the list of result sections
const SECTIONS_PATH: [Step<'static>; 5] = [
    Key("contents"),
    Key("twoColumnSearchResultsRenderer"),
    Key("primaryContents"),
    Key("sectionListRenderer"),
    Key("contents"),
];

/// Path from a section to its items
const SECTION_ITEMS_PATH: [Step<'static>; 2] = [Key("itemSectionRenderer"), Key("contents")];

/// Key under which an item carries video data; other kinds are skipped
const VIDEO_ITEM_KEY: &str = "videoRenderer";

/// One video as listed on a search results page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSummary {
    pub video_id: String,
    pub title: Option<String>,
    pub channel: Option<String>,
    /// Relative label such as "3 weeks ago"
    pub published_time_text: Option<String>,
    /// Clock label such as "12:14"
    pub duration_text: Option<String>,
    /// Highest-resolution thumbnail
    pub thumbnail_url: Option<String>,
}

/// Authoritative fields read from a watch page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub description: Option<String>,
    /// Absolute date, e.g. "2024-03-01"
    pub published_at: Option<String>,
    pub duration_seconds: Option<i64>,
}

impl DetailFields {
    /// Returns true if no field was found
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Extracts video summaries from decoded search state, in listing order
///
/// Items of any kind other than video are skipped, as are video items with
/// no id. Callers truncate to their own limit.
///
/// # Example
///
/// ```
/// use reel_harvest::crawler::parse_search;
/// use serde_json::json;
///
/// let state = json!({"contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {
///     "sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [
///         {"videoRenderer": {"videoId": "abc123", "title": {"simpleText": "Orbit"}}}
///     ]}}]}}}}});
///
/// let items = parse_search(&state);
/// assert_eq!(items[0].video_id, "abc123");
/// assert_eq!(items[0].title.as_deref(), Some("Orbit"));
/// ```
pub fn parse_search(state: &Value) -> Vec<ItemSummary> {
    array_at(state, &SECTIONS_PATH)
        .iter()
        .flat_map(|section| array_at(section, &SECTION_ITEMS_PATH))
        .filter_map(|item| value_at(item, &[Key(VIDEO_ITEM_KEY)]))
        .filter_map(parse_video_item)
        .collect()
}

/// Reads one video item; `None` if it has no id
fn parse_video_item(item: &Value) -> Option<ItemSummary> {
    let video_id = str_at(item, &[Key("videoId")]).filter(|id| !id.is_empty())?;

    Some(ItemSummary {
        video_id: video_id.to_string(),
        title: item_title(item),
        channel: owned(str_at(item, &[Key("ownerText"), Key("runs"), Index(0), Key("text")])),
        published_time_text: owned(str_at(item, &[Key("publishedTimeText"), Key("simpleText")])),
        duration_text: owned(str_at(item, &[Key("lengthText"), Key("simpleText")])),
        thumbnail_url: array_at(item, &[Key("thumbnail"), Key("thumbnails")])
            .last()
            .and_then(|thumb| str_at(thumb, &[Key("url")]))
            .map(str::to_string),
    })
}

/// Title from the run list if there is one, otherwise the simple text
fn item_title(item: &Value) -> Option<String> {
    let runs = array_at(item, &[Key("title"), Key("runs")]);
    let joined: String = runs
        .iter()
        .filter_map(|run| str_at(run, &[Key("text")]))
        .collect();

    if !joined.is_empty() {
        return Some(joined);
    }
    owned(str_at(item, &[Key("title"), Key("simpleText")]))
}

/// Extracts detail fields from a decoded player response
///
/// The publish date prefers `publishDate` and falls back to `uploadDate`.
/// `lengthSeconds` becomes a number only when present and numeric. A player
/// response without video details yields an all-absent result.
pub fn parse_detail(player: &Value) -> DetailFields {
    let details = value_at(player, &[Key("videoDetails")]);
    let microformat = value_at(player, &[Key("microformat"), Key("playerMicroformatRenderer")]);

    let detail_str = |key: &str| details.and_then(|d| str_at(d, &[Key(key)]));
    let microformat_str = |key: &str| {
        microformat
            .and_then(|m| str_at(m, &[Key(key)]))
            .filter(|s| !s.is_empty())
    };

    DetailFields {
        title: owned(detail_str("title")),
        channel: owned(detail_str("author")),
        description: owned(detail_str("shortDescription")),
        published_at: owned(microformat_str("publishDate").or_else(|| microformat_str("uploadDate"))),
        duration_seconds: details
            .and_then(|d| value_at(d, &[Key("lengthSeconds")]))
            .and_then(length_seconds),
    }
}

/// `lengthSeconds` arrives as a string, occasionally as a number
fn length_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}
