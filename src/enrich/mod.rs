//! Enrichment of stored videos
//!
//! Derives a short extractive summary and a handful of keyword tags from the
//! title and description already in the library, and writes them back to the
//! two enrichment columns. Everything runs locally; no external service is
//! involved.

mod summary;
mod tags;

pub use summary::{generate_summary, DEFAULT_SUMMARY_SENTENCES};
pub use tags::{generate_tags, DEFAULT_MAX_TAGS};

use crate::storage::{SortOrder, Storage, StorageResult, VideoQuery};
use regex::Regex;
use std::sync::LazyLock;

/// Words ignored when scoring sentences and that split tag phrases
pub const STOP_WORDS: [&str; 41] = [
    "the", "a", "an", "and", "or", "in", "on", "for", "of", "to", "with", "from", "by", "is",
    "are", "be", "this", "that", "it", "as", "at", "we", "you", "your", "our", "their", "they",
    "he", "she", "his", "her", "its", "was", "were", "will", "about", "into", "over", "under",
    "after", "before",
];

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9']+").expect("valid token pattern"));

/// Lowercased word tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.iter().any(|stop| *stop == token)
}

/// Rows read from the library per round of enrichment
const PAGE_SIZE: usize = 50;

/// Enriches up to `limit` videos that lack a summary or tags
///
/// Videos are taken most recently crawled first. Derived values only fill
/// the gaps; a stored summary or tag list is kept as is. A video whose derived values
/// change nothing is skipped without counting against `limit`, so videos
/// behind it still get their turn.
///
/// # Returns
///
/// The number of videos updated
pub fn enrich_pending(storage: &mut dyn Storage, limit: usize) -> StorageResult<usize> {
    let mut updated = 0;
    let mut skipped = 0;
    // Pending rows already seen in this run; updated rows usually leave the
    // pending set and do not shift the next page
    let mut offset = 0;

    'pages: while updated < limit {
        let page = storage.query_videos(&VideoQuery {
            missing_enrichment: true,
            sort: SortOrder::CrawledDesc,
            limit: PAGE_SIZE,
            offset,
            ..VideoQuery::default()
        })?;
        if page.is_empty() {
            break;
        }
        tracing::debug!("{} videos awaiting enrichment at offset {}", page.len(), offset);

        for mut video in page {
            if updated == limit {
                break 'pages;
            }

            let summary = video.ai_summary.clone().or_else(|| {
                generate_summary(video.description.as_deref(), DEFAULT_SUMMARY_SENTENCES)
            });
            let (tags, joined) = if video.ai_tags.is_some() {
                (video.tag_list(), video.ai_tags.clone())
            } else {
                let derived = generate_tags(
                    video.title.as_deref(),
                    video.description.as_deref(),
                    DEFAULT_MAX_TAGS,
                );
                let joined = (!derived.is_empty()).then(|| derived.join(", "));
                (derived, joined)
            };

            if summary == video.ai_summary && joined == video.ai_tags {
                tracing::debug!("Nothing new to derive for {}", video.video_id);
                skipped += 1;
                offset += 1;
                continue;
            }

            if storage.save_enrichment(&video.video_id, summary.as_deref(), &tags)? {
                updated += 1;
            }

            video.ai_summary = summary;
            video.ai_tags = joined;
            if video.needs_enrichment() {
                offset += 1;
            }
        }
    }

    tracing::info!("Enriched {} videos ({} had nothing new)", updated, skipped);
    Ok(updated)
}
