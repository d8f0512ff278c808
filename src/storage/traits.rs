//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{VideoQuery, VideoRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every entry point makes sure the schema exists before touching it, so an
/// operation against a fresh store is never an error.
pub trait Storage {
    // ===== Crawl Writes =====

    /// Inserts new videos and updates known ones, keyed by video id
    ///
    /// The whole batch is written atomically. Crawl-owned columns are
    /// replaced; enrichment columns keep their stored value unless the record
    /// carries a non-null replacement.
    ///
    /// # Returns
    ///
    /// The number of rows inserted or updated
    fn upsert_videos(&mut self, records: &[VideoRecord]) -> StorageResult<usize>;

    // ===== Reads =====

    /// Fetches videos matching the filters, in the requested order
    fn query_videos(&self, query: &VideoQuery) -> StorageResult<Vec<VideoRecord>>;

    /// Gets a single video by id
    fn get_video(&self, video_id: &str) -> StorageResult<Option<VideoRecord>>;

    /// Sorted list of distinct channel names, without absent channels
    fn distinct_channels(&self) -> StorageResult<Vec<String>>;

    /// The most recent `crawled_at` across all videos
    fn latest_crawl_timestamp(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Gets total video count
    fn count_videos(&self) -> StorageResult<u64>;

    /// Counts videos carrying a summary or tags
    fn count_enriched(&self) -> StorageResult<u64>;

    // ===== Enrichment Writes =====

    /// Replaces the summary and tags of one video
    ///
    /// Tags are stored as a single `", "`-joined string; an empty list is
    /// stored as null. Returns false if the video is unknown.
    fn save_enrichment(
        &mut self,
        video_id: &str,
        summary: Option<&str>,
        tags: &[String],
    ) -> StorageResult<bool>;
}
