//! Spidy-Map: a web crawler that maps the link graph between pages
//!
//! Starting from a set of seed URLs, this crate visits pages with a bounded
//! pool of concurrent workers, extracts absolute links from parsable
//! content, and records which URL links to which. The resulting graph is
//! exported for visualization once the visit budget is spent.

pub mod config;
pub mod crawler;
pub mod output;
pub mod registry;
pub mod url;

use thiserror::Error;

/// Main error type for Spidy-Map operations
#[derive(Debug, Error)]
pub enum SpidyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unrecoverable fetch failure for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: crawler::FetchError,
    },

    #[error("Registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("Memory ceiling exceeded: {used} bytes in use, limit is {limit}")]
    MemoryCeiling { used: u64, limit: u64 },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Spidy-Map operations
pub type Result<T> = std::result::Result<T, SpidyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use registry::Registry;
pub use url::{extract_domain, UrlId};
