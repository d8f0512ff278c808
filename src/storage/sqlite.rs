//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{watch_url, VideoQuery, VideoRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const VIDEO_COLUMNS: &str = "video_id, title, channel, description, published_at, \
     duration_seconds, thumbnail_url, watch_url, search_query, crawled_at, ai_summary, ai_tags";

/// Insert-or-update keyed by video id. Enrichment columns are only replaced
/// by non-null values.
const UPSERT_SQL: &str = "
    INSERT INTO videos (video_id, title, channel, description, published_at,
        duration_seconds, thumbnail_url, watch_url, search_query, crawled_at,
        ai_summary, ai_tags)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    ON CONFLICT(video_id) DO UPDATE SET
        title = excluded.title,
        channel = excluded.channel,
        description = excluded.description,
        published_at = excluded.published_at,
        duration_seconds = excluded.duration_seconds,
        thumbnail_url = excluded.thumbnail_url,
        watch_url = excluded.watch_url,
        search_query = excluded.search_query,
        crawled_at = excluded.crawled_at,
        ai_summary = COALESCE(excluded.ai_summary, videos.ai_summary),
        ai_tags = COALESCE(excluded.ai_tags, videos.ai_tags)
";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`, creating parent directories
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a batch is being written
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Runs before every entry point so a dropped or fresh table is recreated
    fn ensure_schema(&self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    // ===== Crawl Writes =====

    fn upsert_videos(&mut self, records: &[VideoRecord]) -> StorageResult<usize> {
        self.ensure_schema()?;
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for record in records {
                affected += stmt.execute(params![
                    record.video_id,
                    record.title,
                    record.channel,
                    record.description,
                    record.published_at,
                    record.duration_seconds,
                    record.thumbnail_url,
                    record.watch_url(),
                    record.search_query,
                    format_timestamp(&record.crawled_at),
                    record.ai_summary,
                    record.ai_tags,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Upserted {} of {} records", affected, records.len());
        Ok(affected)
    }

    // ===== Reads =====

    fn query_videos(&self, query: &VideoQuery) -> StorageResult<Vec<VideoRecord>> {
        self.ensure_schema()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            clauses.push(r"(title LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')");
            let pattern = like_pattern(search);
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        if let Some(channel) = &query.channel {
            clauses.push("channel = ?");
            values.push(Value::Text(channel.clone()));
        }

        for tag in query.tags.iter().filter(|t| !t.is_empty()) {
            clauses.push(r"ai_tags LIKE ? ESCAPE '\'");
            values.push(Value::Text(like_pattern(tag)));
        }

        if query.missing_enrichment {
            clauses.push(
                "((ai_summary IS NULL AND COALESCE(description, '') != '') \
                 OR (ai_tags IS NULL AND (COALESCE(title, '') != '' OR COALESCE(description, '') != '')))",
            );
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM videos {} ORDER BY {}, video_id ASC LIMIT ? OFFSET ?",
            VIDEO_COLUMNS,
            where_clause,
            query.sort.as_sql()
        );
        values.push(Value::Integer(to_sql_int(query.limit)));
        values.push(Value::Integer(to_sql_int(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let videos = stmt
            .query_map(params_from_iter(values), row_to_video)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(videos)
    }

    fn get_video(&self, video_id: &str) -> StorageResult<Option<VideoRecord>> {
        self.ensure_schema()?;

        let video = self
            .conn
            .query_row(
                &format!("SELECT {} FROM videos WHERE video_id = ?1", VIDEO_COLUMNS),
                params![video_id],
                row_to_video,
            )
            .optional()?;

        Ok(video)
    }

    fn distinct_channels(&self) -> StorageResult<Vec<String>> {
        self.ensure_schema()?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT channel FROM videos WHERE channel IS NOT NULL ORDER BY channel",
        )?;
        let channels = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(channels)
    }

    fn latest_crawl_timestamp(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.ensure_schema()?;

        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(crawled_at) FROM videos", [], |row| row.get(0))?;

        latest
            .map(|value| parse_timestamp(&value, 0))
            .transpose()
            .map_err(Into::into)
    }

    fn count_videos(&self) -> StorageResult<u64> {
        self.ensure_schema()?;
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_enriched(&self) -> StorageResult<u64> {
        self.ensure_schema()?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE ai_summary IS NOT NULL OR ai_tags IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Enrichment Writes =====

    fn save_enrichment(
        &mut self,
        video_id: &str,
        summary: Option<&str>,
        tags: &[String],
    ) -> StorageResult<bool> {
        self.ensure_schema()?;

        let tags = if tags.is_empty() {
            None
        } else {
            Some(tags.join(", "))
        };

        let changed = self.conn.execute(
            "UPDATE videos SET ai_summary = ?1, ai_tags = ?2 WHERE video_id = ?3",
            params![summary, tags, video_id],
        )?;

        Ok(changed > 0)
    }
}

/// Maps a row selected with `VIDEO_COLUMNS`
fn row_to_video(row: &Row<'_>) -> rusqlite::Result<VideoRecord> {
    let video_id: String = row.get(0)?;
    let crawled_at: String = row.get(9)?;

    Ok(VideoRecord {
        watch_url: watch_url(&video_id),
        title: row.get(1)?,
        channel: row.get(2)?,
        description: row.get(3)?,
        published_at: row.get(4)?,
        duration_seconds: row.get(5)?,
        thumbnail_url: row.get(6)?,
        search_query: row.get(8)?,
        crawled_at: parse_timestamp(&crawled_at, 9)?,
        ai_summary: row.get(10)?,
        ai_tags: row.get(11)?,
        video_id,
    })
}

/// RFC 3339 in UTC with fixed microsecond precision, so values sort as text
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_");
    format!("%{}%", escaped)
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
