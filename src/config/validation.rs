use crate::config::types::{Config, CrawlerConfig, HeadersConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Schemes a seed URL may use
const SEED_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_headers_config(&config.headers)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // budget = 0 is valid (unbounded), warned about at crawl start

    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1 second, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates request headers
fn validate_headers_config(config: &HeadersConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("user-agent", &config.user_agent),
        ("accept-language", &config.accept_language),
        ("accept-encoding", &config.accept_encoding),
        ("connection", &config.connection),
    ] {
        if value.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "{} contains control characters",
                name
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.graph_dir.is_empty() {
        return Err(ConfigError::Validation(
            "graph-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed URLs
pub fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        validate_seed(seed)?;
    }
    Ok(())
}

/// Validates a single seed URL: absolute, with a supported scheme and a host
pub fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if !SEED_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http, https or ftp",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}
