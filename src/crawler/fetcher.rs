//! HTTP fetcher implementation
//!
//! This module is the only place the harvester talks to the network:
//! - Building the HTTP client with a fixed browser identity and optional proxy
//! - GET requests with query parameters and a per-request timeout
//! - Error classification (timeout, non-2xx status, network failure)
//!
//! There is no retry here. A failed fetch is reported once and the
//! coordinator decides what it means for the query or item.

use crate::config::UserAgentConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Returns true if the request ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Page body
    pub body: String,
}

/// Builds an HTTP client with the configured identity
///
/// Every request carries the configured User-Agent, Accept-Language and a
/// permissive Accept header. When a proxy is configured all traffic (HTTP and
/// HTTPS) is routed through it.
///
/// # Example
///
/// ```no_run
/// use reel_harvest::config::UserAgentConfig;
/// use reel_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Issues GET requests on behalf of the crawler
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a client built from the identity config
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Wraps an already-built client; its default headers, proxy and
    /// timeouts apply to every fetch
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches `url` with the given query parameters
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - The server answered 2xx and the body was read
    /// * `Err(FetchError)` - Timeout, non-2xx status, or network failure
    pub async fn fetch(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<FetchedPage, FetchError> {
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: final_url.clone(),
                }
            } else {
                FetchError::Body {
                    url: final_url.clone(),
                    source: e,
                }
            }
        })?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}
