use crate::config::types::{Config, CrawlerConfig, EndpointConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on query parallelism; request emission is serialized anyway.
const MAX_CONCURRENT_QUERIES: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_endpoint_config(&config.endpoints)?;
    validate_output_config(&config.output)?;
    validate_queries(&config.queries)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_videos_per_query < 1 {
        return Err(ConfigError::Validation(format!(
            "max_videos_per_query must be >= 1, got {}",
            config.max_videos_per_query
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_concurrent_queries < 1 || config.max_concurrent_queries > MAX_CONCURRENT_QUERIES
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_queries must be between 1 and {}, got {}",
            MAX_CONCURRENT_QUERIES, config.max_concurrent_queries
        )));
    }

    Ok(())
}

/// Validates outbound identity configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if reqwest::header::HeaderValue::from_str(&config.accept_language).is_err() {
        return Err(ConfigError::Validation(format!(
            "accept_language is not a valid header value: '{}'",
            config.accept_language
        )));
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates upstream endpoints
fn validate_endpoint_config(config: &EndpointConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("search_url", &config.search_url),
        ("watch_url", &config.watch_url),
    ] {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{} must use http or https, got '{}'",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the default query list
fn validate_queries(queries: &[String]) -> Result<(), ConfigError> {
    if queries.iter().any(|q| q.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "queries cannot contain blank entries".to_string(),
        ));
    }
    Ok(())
}
