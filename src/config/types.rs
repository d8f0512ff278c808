use serde::Deserialize;

/// Default browser identity; upstream serves reduced markup to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Main configuration structure for Reel-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub endpoints: EndpointConfig,
    pub output: OutputConfig,
    /// Search queries crawled when none are given on the command line
    pub queries: Vec<String>,
}

impl Config {
    /// Returns the configured queries, or the built-in defaults if none are set
    pub fn default_queries(&self) -> Vec<String> {
        if self.queries.is_empty() {
            DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
        } else {
            self.queries.clone()
        }
    }
}

/// Queries crawled when neither the config nor the command line names any
pub const DEFAULT_QUERIES: [&str; 4] = [
    "technology documentaries",
    "nature documentary full",
    "space exploration 4k",
    "indie short film award winning",
];

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Base delay between requests (milliseconds), jittered by the pacer
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Maximum number of videos kept from each search listing
    #[serde(rename = "max-videos-per-query")]
    pub max_videos_per_query: usize,

    /// Wall-clock timeout for a single request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// How many queries may be in flight at once
    #[serde(rename = "max-concurrent-queries")]
    pub max_concurrent_queries: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1500,
            max_videos_per_query: 50,
            request_timeout_secs: 15,
            max_concurrent_queries: 1,
        }
    }
}

/// Outbound identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Optional proxy that all traffic is routed through
    pub proxy: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            proxy: None,
        }
    }
}

/// Upstream endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Search listing endpoint, queried with `search_query`
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Watch page endpoint, queried with `v`
    #[serde(rename = "watch-url")]
    pub watch_url: String,

    /// Value of the `sp` parameter restricting results to videos
    #[serde(rename = "video-filter")]
    pub video_filter: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.youtube.com/results".to_string(),
            watch_url: "https://www.youtube.com/watch".to_string(),
            video_filter: "EgIQAQ%3D%3D".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./data/videos.db".to_string(),
        }
    }
}
