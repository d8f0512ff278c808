//! Database schema definitions
//!
//! One table of videos keyed by the upstream video id, with two non-unique
//! lookup indexes for the channel and search query filters.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id TEXT NOT NULL UNIQUE,
    title TEXT,
    channel TEXT,
    description TEXT,
    published_at TEXT,
    duration_seconds INTEGER,
    thumbnail_url TEXT,
    watch_url TEXT NOT NULL,
    search_query TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    ai_summary TEXT,
    ai_tags TEXT
);

CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel);
CREATE INDEX IF NOT EXISTS idx_videos_search_query ON videos(search_query);
"#;

/// Initializes the database schema
///
/// Safe to run any number of times; every statement is create-if-absent.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
