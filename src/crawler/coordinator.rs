//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives a crawl from queries to a persisted batch:
//! - Fetching and parsing the search listing of each query
//! - Fetching the watch page of every listed video, one after another
//! - Merging listing and watch page data into records
//! - Isolating failures (a bad listing fails its query, a bad watch page
//!   degrades its video to listing data)
//! - Writing everything collected in a single batch

use crate::config::{Config, EndpointConfig};
use crate::crawler::extract::{EmbeddedState, PLAYER_STATE, SEARCH_STATE};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::crawler::pacing::Pacer;
use crate::crawler::parser::{parse_detail, parse_search, DetailFields, ItemSummary};
use crate::crawler::CrawlError;
use crate::state::{ItemOutcome, QueryState};
use crate::storage::{Storage, VideoRecord};
use crate::HarvestError;
use chrono::{DateTime, SubsecRound, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::time::Duration;

/// Result of crawling one query
#[derive(Debug)]
pub struct QueryReport {
    pub query: String,

    /// Always terminal: `Completed` or `Failed`
    pub state: QueryState,

    /// Collected records, in listing order
    pub records: Vec<VideoRecord>,

    /// Records built from listing data only
    pub degraded: usize,

    /// Why the query failed, if it did
    pub error: Option<CrawlError>,
}

/// Totals for a whole crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub queries_completed: usize,
    pub queries_failed: usize,
    pub videos_collected: usize,
    pub videos_degraded: usize,

    /// Rows inserted or updated by the batch write
    pub rows_affected: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Fetcher,
    pacer: Pacer,
    endpoints: EndpointConfig,
    limit: usize,
    timeout: Duration,
    max_concurrent_queries: usize,
}

impl Coordinator {
    /// Creates a coordinator, building the HTTP client from `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.user_agent)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(config: &Config, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            pacer: Pacer::from_config(&config.crawler),
            endpoints: config.endpoints.clone(),
            limit: config.crawler.max_videos_per_query,
            timeout: Duration::from_secs(config.crawler.request_timeout_secs),
            max_concurrent_queries: config.crawler.max_concurrent_queries.max(1),
        }
    }

    /// Maximum number of videos kept from each listing
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Crawls every query and persists the results in one batch
    ///
    /// Query failures are logged and counted; they never stop the others.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The batch was written
    /// * `Err(HarvestError::NothingCollected)` - No query produced a video
    /// * `Err(HarvestError::Storage)` - The batch write failed; nothing was kept
    pub async fn run(
        &self,
        queries: &[String],
        storage: &mut dyn Storage,
    ) -> Result<CrawlReport, HarvestError> {
        tracing::info!(
            "Starting crawl of {} queries (limit {} per query)",
            queries.len(),
            self.limit
        );
        let start_time = std::time::Instant::now();

        let mut report = CrawlReport::default();
        let mut batch = Vec::new();

        for query_report in self.collect(queries).await {
            match query_report.state {
                QueryState::Completed => report.queries_completed += 1,
                _ => report.queries_failed += 1,
            }
            report.videos_degraded += query_report.degraded;
            batch.extend(query_report.records);
        }
        report.videos_collected = batch.len();

        if batch.is_empty() {
            tracing::error!("No videos collected from {} queries", queries.len());
            return Err(HarvestError::NothingCollected {
                queries: queries.len(),
            });
        }

        report.rows_affected = storage.upsert_videos(&batch)?;

        tracing::info!(
            "Crawl completed: {} videos ({} degraded) from {}/{} queries, {} rows written in {:?}",
            report.videos_collected,
            report.videos_degraded,
            report.queries_completed,
            queries.len(),
            report.rows_affected,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Crawls every query without persisting, reports in query order
    ///
    /// Up to `max_concurrent_queries` queries are in flight at once. Requests
    /// are still emitted one at a time through the pacer.
    pub async fn collect(&self, queries: &[String]) -> Vec<QueryReport> {
        stream::iter(queries)
            .map(|query| self.crawl_query(query))
            .buffered(self.max_concurrent_queries)
            .collect()
            .await
    }

    /// Crawls a single query to a terminal state
    pub async fn crawl_query(&self, query: &str) -> QueryReport {
        let mut state = QueryState::Pending;
        advance(query, &mut state, QueryState::FetchingListing);

        let mut summaries = match self.fetch_listing(query).await {
            Ok(summaries) => summaries,
            Err(e) => {
                tracing::warn!("Query '{}' failed: {}", query, e);
                advance(query, &mut state, QueryState::Failed);
                return QueryReport {
                    query: query.to_string(),
                    state,
                    records: Vec::new(),
                    degraded: 0,
                    error: Some(e),
                };
            }
        };
        summaries.truncate(self.limit);

        advance(query, &mut state, QueryState::CollectingDetails);
        tracing::info!("Query '{}': {} videos listed", query, summaries.len());

        let mut records = Vec::with_capacity(summaries.len());
        let mut degraded = 0;

        for summary in &summaries {
            let (detail, outcome) = match self.fetch_detail(&summary.video_id).await {
                Ok(detail) => (Some(detail), ItemOutcome::Detailed),
                Err(e) => {
                    tracing::warn!(
                        "Keeping listing data only for {}: {}",
                        summary.video_id,
                        e
                    );
                    (None, ItemOutcome::SummaryOnly)
                }
            };
            if outcome.is_degraded() {
                degraded += 1;
            }

            let crawled_at = Utc::now().trunc_subsecs(6);
            records.push(merge_record(summary, detail.as_ref(), query, crawled_at));
        }

        advance(query, &mut state, QueryState::Completed);
        tracing::info!(
            "Query '{}' completed: {} videos, {} without watch page data",
            query,
            records.len(),
            degraded
        );

        QueryReport {
            query: query.to_string(),
            state,
            records,
            degraded,
            error: None,
        }
    }

    /// Fetches and parses the search listing for `query`
    async fn fetch_listing(&self, query: &str) -> Result<Vec<ItemSummary>, CrawlError> {
        let params = [
            ("search_query", query),
            ("sp", self.endpoints.video_filter.as_str()),
        ];
        let page = self.paced_fetch(&self.endpoints.search_url, &params).await?;
        let state = decode_state(&SEARCH_STATE, &page)?;
        Ok(parse_search(&state))
    }

    /// Fetches and parses the watch page of one video
    async fn fetch_detail(&self, video_id: &str) -> Result<DetailFields, CrawlError> {
        let page = self
            .paced_fetch(&self.endpoints.watch_url, &[("v", video_id)])
            .await?;
        let player = decode_state(&PLAYER_STATE, &page)?;
        Ok(parse_detail(&player))
    }

    /// Emits one request, then pauses before anyone else may send
    ///
    /// The pause follows every fetch, successful or not.
    async fn paced_fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<FetchedPage, FetchError> {
        let _turn = self.pacer.turn().await;
        let result = self.fetcher.fetch(url, params, self.timeout).await;
        self.pacer.wait(1.0).await;
        result
    }
}

fn decode_state(pattern: &EmbeddedState, page: &FetchedPage) -> Result<Value, CrawlError> {
    pattern.extract(&page.body).ok_or_else(|| CrawlError::Decode {
        url: page.url.clone(),
        identifier: pattern.identifier().to_string(),
    })
}

fn advance(query: &str, state: &mut QueryState, next: QueryState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid query transition {} -> {}",
        state,
        next
    );
    tracing::debug!("Query '{}': {} -> {}", query, state, next);
    *state = next;
}

/// Builds a record from listing data and, when available, watch page data
///
/// Watch page values win wherever they are present and non-empty. The
/// description and numeric duration only ever come from the watch page; the
/// publish date falls back to the listing's relative label.
pub fn merge_record(
    summary: &ItemSummary,
    detail: Option<&DetailFields>,
    search_query: &str,
    crawled_at: DateTime<Utc>,
) -> VideoRecord {
    let detail = detail.cloned().unwrap_or_default();

    let mut record = VideoRecord::new(&summary.video_id, search_query, crawled_at);
    record.title = prefer(detail.title, &summary.title);
    record.channel = prefer(detail.channel, &summary.channel);
    record.description = prefer(detail.description, &None);
    record.published_at = prefer(detail.published_at, &summary.published_time_text);
    record.duration_seconds = detail.duration_seconds;
    record.thumbnail_url = summary.thumbnail_url.clone();
    record
}

/// The watch page value unless it is missing or empty
fn prefer(from_detail: Option<String>, from_summary: &Option<String>) -> Option<String> {
    from_detail
        .filter(|value| !value.is_empty())
        .or_else(|| from_summary.clone())
}
