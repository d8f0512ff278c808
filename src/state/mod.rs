//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `QueryState`: Where a single search query is in the crawl (pending, completed, failed)
//! - `ItemOutcome`: Whether a video came back with its watch page details or from the listing alone

mod query_state;

// Re-export main types
pub use query_state::{ItemOutcome, QueryState};
