//! Storage module for persisting harvested videos
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent batch upserts keyed by video id
//! - Filtered and sorted library reads
//! - The narrow write path used by enrichment

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Base of every stored watch link
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Canonical watch link for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_BASE, video_id)
}

/// Opens (creating if needed) the storage database at `path`
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// One harvested video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub description: Option<String>,
    /// Absolute date when known, otherwise the listing's relative label
    pub published_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
    /// Query that surfaced this video
    pub search_query: String,
    pub crawled_at: DateTime<Utc>,
    pub ai_summary: Option<String>,
    /// Tags as stored: a single `", "`-joined string
    pub ai_tags: Option<String>,
    watch_url: String,
}

impl VideoRecord {
    /// Creates a record with only its identity and provenance set
    pub fn new(video_id: &str, search_query: &str, crawled_at: DateTime<Utc>) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: None,
            channel: None,
            description: None,
            published_at: None,
            duration_seconds: None,
            thumbnail_url: None,
            search_query: search_query.to_string(),
            crawled_at,
            ai_summary: None,
            ai_tags: None,
            watch_url: watch_url(video_id),
        }
    }

    /// Watch link, always derived from the video id
    pub fn watch_url(&self) -> &str {
        &self.watch_url
    }

    /// Stored tags split back into a list
    pub fn tag_list(&self) -> Vec<String> {
        self.ai_tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a summary or tags are missing that the stored text could
    /// provide; the same rule as `VideoQuery::missing_enrichment`
    pub fn needs_enrichment(&self) -> bool {
        let has = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
        let described = has(&self.description);
        (self.ai_summary.is_none() && described)
            || (self.ai_tags.is_none() && (described || has(&self.title)))
    }
}

/// Sort order for library reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently published first
    #[default]
    PublishedDesc,
    PublishedAsc,
    /// Most recently crawled first
    CrawledDesc,
    CrawledAsc,
    TitleAsc,
    ChannelAsc,
}

impl SortOrder {
    /// The ORDER BY clause for this order
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::PublishedDesc => "published_at DESC",
            Self::PublishedAsc => "published_at ASC",
            Self::CrawledDesc => "crawled_at DESC",
            Self::CrawledAsc => "crawled_at ASC",
            Self::TitleAsc => "title COLLATE NOCASE ASC",
            Self::ChannelAsc => "channel COLLATE NOCASE ASC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublishedDesc => "published-desc",
            Self::PublishedAsc => "published-asc",
            Self::CrawledDesc => "crawled-desc",
            Self::CrawledAsc => "crawled-asc",
            Self::TitleAsc => "title",
            Self::ChannelAsc => "channel",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published-desc" | "newest" => Ok(Self::PublishedDesc),
            "published-asc" | "oldest" => Ok(Self::PublishedAsc),
            "crawled-desc" => Ok(Self::CrawledDesc),
            "crawled-asc" => Ok(Self::CrawledAsc),
            "title" => Ok(Self::TitleAsc),
            "channel" => Ok(Self::ChannelAsc),
            other => Err(format!(
                "unknown sort '{}' (expected published-desc, published-asc, crawled-desc, crawled-asc, title or channel)",
                other
            )),
        }
    }
}

/// Filters, order and paging for a library read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoQuery {
    /// Substring of title or description, ignoring ASCII case only
    ///
    /// SQLite `LIKE` folds `A`-`Z`; `"été"` does not match `"ÉTÉ"`.
    pub search: Option<String>,
    /// Exact channel name
    pub channel: Option<String>,
    /// Every tag must appear in the stored tag string
    pub tags: Vec<String>,
    /// Only videos with a summary or tags still missing that their text
    /// could provide (no summary without a description)
    pub missing_enrichment: bool,
    pub sort: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

impl Default for VideoQuery {
    fn default() -> Self {
        Self {
            search: None,
            channel: None,
            tags: Vec::new(),
            missing_enrichment: false,
            sort: SortOrder::default(),
            limit: 100,
            offset: 0,
        }
    }
}
