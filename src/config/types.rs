use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for spidy-map
///
/// Every section is optional; missing values fall back to the defaults
/// documented on each field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute URLs that prime the frontier
    pub seeds: Vec<String>,
    pub crawler: CrawlerConfig,
    pub headers: HeadersConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum completed units of work per run (0 = unbounded)
    pub budget: usize,

    /// Number of parallel workers
    pub workers: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout")]
    pub request_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Ceiling on the registry's estimated size in bytes (0 = none)
    #[serde(rename = "data-ceiling")]
    pub data_ceiling: u64,
}

impl CrawlerConfig {
    /// The per-request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The data ceiling, or `None` when disabled
    pub fn data_ceiling(&self) -> Option<u64> {
        (self.data_ceiling > 0).then_some(self.data_ceiling)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            budget: 100,
            workers: 8,
            request_timeout_secs: 10,
            max_redirects: 10,
            data_ceiling: 10_000_000_000,
        }
    }
}

/// Request headers sent with every fetch of a run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    #[serde(rename = "accept-encoding")]
    pub accept_encoding: String,

    /// Connection reuse preference
    pub connection: String,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            user_agent:
                "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:56.0) Gecko/20100101 Firefox/56.0"
                    .to_string(),
            accept_language: "en_US, en-US, en".to_string(),
            accept_encoding: "gzip".to_string(),
            connection: "keep-alive".to_string(),
        }
    }
}

/// Graph export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where graph files are written
    #[serde(rename = "graph-dir")]
    pub graph_dir: String,

    /// Graph file format
    pub format: GraphFormat,

    /// Nodes with more outbound links than this keep their URL as a label
    #[serde(rename = "label-threshold")]
    pub label_threshold: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            graph_dir: "./graphs".to_string(),
            format: GraphFormat::Dot,
            label_threshold: 10,
        }
    }
}

/// Supported graph file formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// JSON node/edge lists
    Json,
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dot => f.write_str("dot"),
            Self::Json => f.write_str("json"),
        }
    }
}
