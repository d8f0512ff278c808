/// Query and item state definitions for tracking crawl progress
use std::fmt;

/// Represents where a search query is in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    // ===== Active States =====
    /// Query has not been started
    Pending,

    /// Search listing is being fetched
    FetchingListing,

    /// Watch pages of the listed videos are being fetched
    CollectingDetails,

    // ===== Terminal States =====
    /// All listed videos (up to the limit) were collected
    Completed,

    /// The search listing could not be fetched or decoded
    Failed,
}

impl QueryState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the state may move to `next`
    ///
    /// The listing stage may fail outright; once details are being collected
    /// the query always completes, because item failures are absorbed.
    pub fn can_transition_to(&self, next: QueryState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::FetchingListing)
                | (Self::FetchingListing, Self::CollectingDetails)
                | (Self::FetchingListing, Self::Failed)
                | (Self::CollectingDetails, Self::Completed)
        )
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FetchingListing => "fetching_listing",
            Self::CollectingDetails => "collecting_details",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of a video's data was collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemOutcome {
    /// Listing summary merged with watch page details
    Detailed,

    /// Watch page failed; the record carries listing data only
    SummaryOnly,
}

impl ItemOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::SummaryOnly)
    }
}
