//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock search and watch endpoints and
//! test the full crawl cycle end-to-end.

use reel_harvest::config::Config;
use reel_harvest::crawler::{CrawlError, Coordinator, Fetcher};
use reel_harvest::state::QueryState;
use reel_harvest::storage::{SortOrder, SqliteStorage, Storage, VideoQuery};
use reel_harvest::HarvestError;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server, without pacing
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.crawler.base_delay_ms = 0;
    config.crawler.request_timeout_secs = 1;
    config.user_agent.user_agent = "ReelHarvestTest/1.0".to_string();
    config.endpoints.search_url = format!("{}/results", server.uri());
    config.endpoints.watch_url = format!("{}/watch", server.uri());
    config
}

/// A search listing page embedding the given `(id, title, published)` items
fn search_page(items: &[(&str, &str, &str)]) -> String {
    let videos: Vec<Value> = items
        .iter()
        .map(|(id, title, published)| {
            json!({"videoRenderer": {
                "videoId": id,
                "title": {"runs": [{"text": title}]},
                "ownerText": {"runs": [{"text": "Orbital Films"}]},
                "publishedTimeText": {"simpleText": published},
                "lengthText": {"simpleText": "10:00"},
                "thumbnail": {"thumbnails": [
                    {"url": format!("https://i.example/{}/default.jpg", id)},
                    {"url": format!("https://i.example/{}/maxres.jpg", id)}
                ]}
            }})
        })
        .collect();

    let state = json!({"contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {
        "sectionListRenderer": {"contents": [
            {"itemSectionRenderer": {"contents": videos}}
        ]}
    }}}});

    format!(
        "<!DOCTYPE html><html><head><title>Results</title></head><body>\
         <script nonce=\"x\">var ytInitialData = {};</script>\
         <script>window.other = {{}};</script></body></html>",
        state
    )
}

/// A watch page embedding a player response
fn watch_page(description: &str, publish_date: &str, length_seconds: &str) -> String {
    let player = json!({
        "videoDetails": {
            "shortDescription": description,
            "lengthSeconds": length_seconds
        },
        "microformat": {"playerMicroformatRenderer": {
            "publishDate": publish_date,
            "uploadDate": "2000-01-01"
        }}
    });
    format!(
        "<html><body><script>var ytInitialPlayerResponse = {};var meta = 1;</script></body></html>",
        player
    )
}

async fn mount_search(server: &MockServer, query: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", query))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_watch(server: &MockServer, video_id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", video_id))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_with_one_timed_out_watch_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", "space exploration 4k"))
        .and(query_param("sp", "EgIQAQ%3D%3D"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[
            ("abc123", "Journey to Mars", "2 years ago"),
            ("def456", "Saturn Rings", "1 year ago"),
            ("ghi789", "Beyond the Limit", "3 days ago"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_watch(
        &mock_server,
        "abc123",
        ResponseTemplate::new(200).set_body_string(watch_page(
            "The full story of the red planet.",
            "2023-05-14",
            "734",
        )),
    )
    .await;

    // Slower than the one second request timeout
    mount_watch(
        &mock_server,
        "def456",
        ResponseTemplate::new(200)
            .set_body_string(watch_page("Never seen", "2022-01-01", "99"))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    // Beyond the limit, never requested
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", "ghi789"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server);
    config.crawler.max_videos_per_query = 2;

    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let mut storage = SqliteStorage::open_in_memory().expect("Failed to open storage");

    let queries = vec!["space exploration 4k".to_string()];
    let report = coordinator
        .run(&queries, &mut storage)
        .await
        .expect("Crawl should succeed");

    assert_eq!(report.rows_affected, 2);
    assert_eq!(report.videos_collected, 2);
    assert_eq!(report.videos_degraded, 1);
    assert_eq!(report.queries_completed, 1);
    assert_eq!(report.queries_failed, 0);

    let detailed = storage.get_video("abc123").unwrap().expect("abc123 stored");
    assert_eq!(
        detailed.description.as_deref(),
        Some("The full story of the red planet.")
    );
    assert_eq!(detailed.published_at.as_deref(), Some("2023-05-14"));
    assert_eq!(detailed.duration_seconds, Some(734));
    assert_eq!(detailed.search_query, "space exploration 4k");

    let degraded = storage.get_video("def456").unwrap().expect("def456 stored");
    assert_eq!(degraded.title.as_deref(), Some("Saturn Rings"));
    assert_eq!(degraded.channel.as_deref(), Some("Orbital Films"));
    assert_eq!(
        degraded.thumbnail_url.as_deref(),
        Some("https://i.example/def456/maxres.jpg")
    );
    assert_eq!(degraded.published_at.as_deref(), Some("1 year ago"));
    assert!(degraded.description.is_none());
    assert!(degraded.duration_seconds.is_none());
    assert_eq!(degraded.watch_url(), "https://www.youtube.com/watch?v=def456");

    assert!(storage.get_video("ghi789").unwrap().is_none());

    let newest = storage
        .query_videos(&VideoQuery {
            sort: SortOrder::PublishedDesc,
            limit: 1,
            ..VideoQuery::default()
        })
        .unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].video_id, "abc123");
}

#[tokio::test]
async fn test_failed_search_does_not_abort_other_queries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", "broken query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    mount_search(
        &mock_server,
        "deep ocean",
        search_page(&[("ocean01", "Into the Trench", "5 months ago")]),
    )
    .await;
    mount_watch(
        &mock_server,
        "ocean01",
        ResponseTemplate::new(200).set_body_string(watch_page(
            "Eleven kilometres down.",
            "2024-02-02",
            "1800",
        )),
    )
    .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config).unwrap();
    let mut storage = SqliteStorage::open_in_memory().unwrap();

    let queries = vec!["broken query".to_string(), "deep ocean".to_string()];
    let report = coordinator.run(&queries, &mut storage).await.unwrap();

    assert_eq!(report.queries_failed, 1);
    assert_eq!(report.queries_completed, 1);
    assert_eq!(report.rows_affected, 1);
    assert_eq!(storage.count_videos().unwrap(), 1);
}

#[tokio::test]
async fn test_listing_without_state_fails_query() {
    let mock_server = MockServer::start().await;

    mount_search(
        &mock_server,
        "space",
        "<html><body><p>Please enable JavaScript</p></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config).unwrap();

    let report = coordinator.crawl_query("space").await;

    assert_eq!(report.state, QueryState::Failed);
    assert!(report.records.is_empty());
    match report.error {
        Some(CrawlError::Decode { identifier, .. }) => assert_eq!(identifier, "ytInitialData"),
        other => panic!("expected a decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_watch_page_failures_degrade_items() {
    let mock_server = MockServer::start().await;

    mount_search(
        &mock_server,
        "nature",
        search_page(&[
            ("nat001", "Rainforest", "1 week ago"),
            ("nat002", "Tundra", "2 weeks ago"),
            ("nat003", "Savanna", "3 weeks ago"),
        ]),
    )
    .await;
    mount_watch(
        &mock_server,
        "nat001",
        ResponseTemplate::new(200).set_body_string("<html><body>consent wall</body></html>"),
    )
    .await;
    mount_watch(&mock_server, "nat002", ResponseTemplate::new(404)).await;
    mount_watch(
        &mock_server,
        "nat003",
        ResponseTemplate::new(200).set_body_string(watch_page("Grasslands.", "2021-07-07", "")),
    )
    .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config).unwrap();

    let report = coordinator.crawl_query("nature").await;

    assert_eq!(report.state, QueryState::Completed);
    assert_eq!(report.degraded, 2);

    let ids: Vec<_> = report.records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["nat001", "nat002", "nat003"]);

    assert_eq!(report.records[0].published_at.as_deref(), Some("1 week ago"));
    assert_eq!(report.records[1].title.as_deref(), Some("Tundra"));

    // empty lengthSeconds is absent, not an error
    assert_eq!(report.records[2].description.as_deref(), Some("Grasslands."));
    assert_eq!(report.records[2].published_at.as_deref(), Some("2021-07-07"));
    assert_eq!(report.records[2].duration_seconds, None);
}

#[tokio::test]
async fn test_nothing_collected_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config).unwrap();
    let mut storage = SqliteStorage::open_in_memory().unwrap();

    let queries = vec!["one".to_string(), "two".to_string()];
    let result = coordinator.run(&queries, &mut storage).await;

    assert!(matches!(
        result,
        Err(HarvestError::NothingCollected { queries: 2 })
    ));
}

#[tokio::test]
async fn test_recrawl_updates_in_place_and_keeps_enrichment() {
    let mock_server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("library").join("videos.db");

    mount_search(
        &mock_server,
        "space",
        search_page(&[("abc123", "Journey to Mars", "2 years ago")]),
    )
    .await;
    mount_watch(
        &mock_server,
        "abc123",
        ResponseTemplate::new(200).set_body_string(watch_page("Red planet.", "2023-05-14", "734")),
    )
    .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config).unwrap();
    let queries = vec!["space".to_string()];

    {
        let mut storage = SqliteStorage::new(&db_path).expect("Failed to create database");
        coordinator.run(&queries, &mut storage).await.unwrap();
        storage
            .save_enrichment("abc123", Some("About Mars."), &["Mars".to_string()])
            .unwrap();
    }

    let first_crawl = {
        let storage = SqliteStorage::new(&db_path).unwrap();
        storage.get_video("abc123").unwrap().unwrap().crawled_at
    };

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let report = coordinator.run(&queries, &mut storage).await.unwrap();
    assert_eq!(report.rows_affected, 1);

    assert_eq!(storage.count_videos().unwrap(), 1);
    let video = storage.get_video("abc123").unwrap().unwrap();
    assert!(video.crawled_at >= first_crawl);
    assert_eq!(video.ai_summary.as_deref(), Some("About Mars."));
    assert_eq!(video.ai_tags.as_deref(), Some("Mars"));
}

#[tokio::test]
async fn test_concurrent_queries_report_in_order() {
    let mock_server = MockServer::start().await;

    let queries: Vec<String> = ["alpha", "beta", "gamma"]
        .iter()
        .map(|q| q.to_string())
        .collect();
    for (i, query) in queries.iter().enumerate() {
        let id = format!("vid{:03}", i);
        mount_search(
            &mock_server,
            query,
            search_page(&[(id.as_str(), query.as_str(), "today")]),
        )
        .await;
        mount_watch(
            &mock_server,
            &id,
            ResponseTemplate::new(200).set_body_string(watch_page("Short.", "2024-01-01", "60")),
        )
        .await;
    }

    let mut config = create_test_config(&mock_server);
    config.crawler.max_concurrent_queries = 3;
    let coordinator = Coordinator::new(&config).unwrap();

    let reports = coordinator.collect(&queries).await;

    let order: Vec<_> = reports.iter().map(|r| r.query.as_str()).collect();
    assert_eq!(order, vec!["alpha", "beta", "gamma"]);
    assert!(reports.iter().all(|r| r.state == QueryState::Completed));
    assert_eq!(reports[1].records[0].video_id, "vid001");
}

#[tokio::test]
async fn test_requests_are_paced() {
    let mock_server = MockServer::start().await;

    mount_search(
        &mock_server,
        "space",
        search_page(&[("abc123", "Journey to Mars", "2 years ago")]),
    )
    .await;
    mount_watch(
        &mock_server,
        "abc123",
        ResponseTemplate::new(200).set_body_string(watch_page("Red.", "2023-05-14", "734")),
    )
    .await;

    let mut config = create_test_config(&mock_server);
    config.crawler.base_delay_ms = 200;
    let coordinator = Coordinator::new(&config).unwrap();

    let start = Instant::now();
    let report = coordinator.crawl_query("space").await;

    // two fetches, each followed by at least half the base delay
    assert_eq!(report.state, QueryState::Completed);
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_requests_carry_configured_identity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .and(header("user-agent", "ReelHarvestTest/1.0"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::new(&config).unwrap();

    let report = coordinator.crawl_query("anything").await;

    // an empty listing still completes
    assert_eq!(report.state, QueryState::Completed);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_crawl_with_caller_supplied_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("search_query", "mars"))
        .and(header("x-harvest-run", "nightly"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[(
            "abc123",
            "Journey to Mars",
            "2 years ago",
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", "abc123"))
        .and(header("x-harvest-run", "nightly"))
        .respond_with(ResponseTemplate::new(200).set_body_string(watch_page(
            "The full story of the red planet.",
            "2023-05-14",
            "734",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "x-harvest-run",
        reqwest::header::HeaderValue::from_static("nightly"),
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .expect("Failed to build client");

    let config = create_test_config(&mock_server);
    let coordinator = Coordinator::with_fetcher(&config, Fetcher::with_client(client));
    let mut storage = SqliteStorage::open_in_memory().expect("Failed to open storage");

    let report = coordinator
        .run(&["mars".to_string()], &mut storage)
        .await
        .expect("Crawl should succeed");

    assert_eq!(report.rows_affected, 1);
    assert_eq!(report.videos_degraded, 0);
    let stored = storage.get_video("abc123").unwrap().expect("abc123 stored");
    assert_eq!(stored.duration_seconds, Some(734));
}
