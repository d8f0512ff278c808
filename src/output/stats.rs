//! Statistics generation from the video library
//!
//! This module provides functionality for extracting and displaying
//! library statistics from the storage layer.

use crate::storage::{Storage, StorageResult};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Library statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStatistics {
    /// Total number of stored videos
    pub total_videos: u64,

    /// Number of distinct channels
    pub channels: u64,

    /// Videos carrying a summary or tags
    pub enriched_videos: u64,

    /// Most recent crawl time, if anything was ever stored
    pub latest_crawl: Option<DateTime<Utc>>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<LibraryStatistics> {
    Ok(LibraryStatistics {
        total_videos: storage.count_videos()?,
        channels: storage.distinct_channels()?.len() as u64,
        enriched_videos: storage.count_enriched()?,
        latest_crawl: storage.latest_crawl_timestamp()?,
    })
}

/// Renders statistics as the text printed by [`print_statistics`]
pub fn format_statistics(stats: &LibraryStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Library Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total videos: {}", stats.total_videos);
    let _ = writeln!(out, "  Channels: {}", stats.channels);

    let enriched_rate = if stats.total_videos > 0 {
        (stats.enriched_videos as f64 / stats.total_videos as f64) * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "  Enriched: {} ({:.1}%)",
        stats.enriched_videos, enriched_rate
    );

    match stats.latest_crawl {
        Some(at) => {
            let _ = writeln!(out, "  Last crawl: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => {
            let _ = writeln!(out, "  Last crawl: never");
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LibraryStatistics) {
    print!("{}", format_statistics(stats));
}
