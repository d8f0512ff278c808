//! Crawler module for collecting video metadata
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed browser identity
//! - Randomized pacing between requests
//! - Embedded page state extraction and parsing
//! - Overall crawl coordination

mod coordinator;
mod extract;
mod fetcher;
mod pacing;
mod parser;

pub use coordinator::{merge_record, Coordinator, CrawlReport, QueryReport};
pub use extract::{
    array_at, decode_fragment, str_at, value_at, EmbeddedState, Step, PLAYER_STATE,
    PLAYER_STATE_IDENTIFIER, SEARCH_STATE, SEARCH_STATE_IDENTIFIER,
};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use pacing::{Pacer, JITTER_MAX, JITTER_MIN, MAX_DELAY};
pub use parser::{parse_detail, parse_search, DetailFields, ItemSummary};

use crate::config::Config;
use crate::storage::Storage;
use crate::HarvestError;
use thiserror::Error;

/// Failure of one page within a crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error("No decodable {identifier} state in {url}")]
    Decode { url: String, identifier: String },
}

/// Runs a complete crawl of `queries` and persists the results
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the configured identity
/// 2. Crawl every query (listing, then watch pages)
/// 3. Write all collected videos to `storage` in one batch
///
/// # Returns
///
/// * `Ok(CrawlReport)` - At least one video was collected and persisted
/// * `Err(HarvestError)` - Nothing was collected, or the batch write failed
pub async fn crawl(
    config: &Config,
    queries: &[String],
    storage: &mut dyn Storage,
) -> Result<CrawlReport, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run(queries, storage).await
}
