//! Integration tests for the SQLite library
//!
//! These run against on-disk databases in temporary directories.

use chrono::{DateTime, Duration, TimeZone, Utc};
use reel_harvest::storage::{open_storage, SortOrder, SqliteStorage, Storage, VideoQuery, VideoRecord};
use tempfile::TempDir;

fn crawled_at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

fn record(id: &str, title: &str, channel: &str, published: &str) -> VideoRecord {
    let mut record = VideoRecord::new(id, "integration", crawled_at(9));
    record.title = Some(title.to_string());
    record.channel = Some(channel.to_string());
    record.description = Some(format!("All about {}.", title.to_lowercase()));
    record.published_at = Some(published.to_string());
    record.duration_seconds = Some(600);
    record.thumbnail_url = Some(format!("https://i.example/{}.jpg", id));
    record
}

fn open_temp() -> (TempDir, SqliteStorage) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = open_storage(&temp_dir.path().join("videos.db")).expect("Failed to open storage");
    (temp_dir, storage)
}

fn all(storage: &SqliteStorage) -> Vec<VideoRecord> {
    storage
        .query_videos(&VideoQuery {
            sort: SortOrder::TitleAsc,
            limit: 1000,
            ..VideoQuery::default()
        })
        .unwrap()
}

#[test]
fn test_applying_a_batch_twice_is_idempotent() {
    let (_dir, mut storage) = open_temp();
    let batch = vec![
        record("abc123", "Mars", "Space", "2023-05-14"),
        record("def456", "Saturn", "Space", "2022-01-01"),
    ];

    storage.upsert_videos(&batch).unwrap();
    let once = all(&storage);

    let mut again = batch.clone();
    for video in &mut again {
        video.crawled_at = crawled_at(10);
    }
    storage.upsert_videos(&again).unwrap();
    let twice = all(&storage);

    assert_eq!(once.len(), twice.len());
    for (before, after) in once.iter().zip(&twice) {
        let mut after = after.clone();
        assert_eq!(after.crawled_at, crawled_at(10));
        after.crawled_at = before.crawled_at;
        assert_eq!(before, &after);
    }
}

#[test]
fn test_duplicate_ids_in_one_batch_leave_one_row() {
    let (_dir, mut storage) = open_temp();
    let batch = vec![
        record("abc123", "Mars", "Space", "2023-05-14"),
        record("abc123", "Mars (remastered)", "Space", "2023-05-14"),
        record("def456", "Saturn", "Space", "2022-01-01"),
    ];

    storage.upsert_videos(&batch).unwrap();

    assert_eq!(storage.count_videos().unwrap(), 2);
    let mars = storage.get_video("abc123").unwrap().unwrap();
    assert_eq!(mars.title.as_deref(), Some("Mars (remastered)"));
}

#[test]
fn test_tag_filters_are_conjunctive() {
    let (_dir, mut storage) = open_temp();
    storage
        .upsert_videos(&[
            record("a", "Forest", "Wild", "2023-01-01"),
            record("b", "Reef", "Wild", "2023-01-02"),
            record("c", "Dunes", "Wild", "2023-01-03"),
        ])
        .unwrap();
    storage
        .save_enrichment("a", None, &["Nature".to_string(), "4k".to_string()])
        .unwrap();
    storage
        .save_enrichment("b", None, &["Nature".to_string()])
        .unwrap();
    storage
        .save_enrichment("c", None, &["4k Drone".to_string()])
        .unwrap();

    let query = VideoQuery {
        tags: vec!["nature".to_string(), "4k".to_string()],
        ..VideoQuery::default()
    };
    let found = storage.query_videos(&query).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].video_id, "a");
}

#[test]
fn test_filters_combine_with_paging() {
    let (_dir, mut storage) = open_temp();
    let mut batch = Vec::new();
    for i in 0..5 {
        batch.push(record(
            &format!("space{}", i),
            &format!("Space Walk {}", i),
            "Orbital",
            &format!("2023-0{}-01", i + 1),
        ));
    }
    batch.push(record("other", "Space Cooking", "Kitchen", "2024-01-01"));
    storage.upsert_videos(&batch).unwrap();

    let query = VideoQuery {
        search: Some("space walk".to_string()),
        channel: Some("Orbital".to_string()),
        sort: SortOrder::PublishedDesc,
        limit: 2,
        offset: 1,
        ..VideoQuery::default()
    };
    let ids: Vec<_> = storage
        .query_videos(&query)
        .unwrap()
        .into_iter()
        .map(|v| v.video_id)
        .collect();

    assert_eq!(ids, vec!["space3", "space2"]);
}

#[test]
fn test_data_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("videos.db");

    {
        let mut storage = SqliteStorage::new(&db_path).unwrap();
        let mut late = record("late", "Late", "B Channel", "2023-01-01");
        late.crawled_at = crawled_at(9) + Duration::minutes(30);
        storage
            .upsert_videos(&[record("early", "Early", "A Channel", "2022-01-01"), late])
            .unwrap();
    }

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_videos().unwrap(), 2);
    assert_eq!(
        storage.distinct_channels().unwrap(),
        vec!["A Channel", "B Channel"]
    );
    assert_eq!(
        storage.latest_crawl_timestamp().unwrap(),
        Some(crawled_at(9) + Duration::minutes(30))
    );
}

#[test]
fn test_fresh_database_reads_are_empty() {
    let (_dir, storage) = open_temp();

    assert_eq!(storage.count_videos().unwrap(), 0);
    assert!(all(&storage).is_empty());
    assert!(storage.distinct_channels().unwrap().is_empty());
    assert_eq!(storage.latest_crawl_timestamp().unwrap(), None);
    assert!(storage.get_video("missing").unwrap().is_none());
}
