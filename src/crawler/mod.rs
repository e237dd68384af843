//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier and global visit budget
//! - HTTP fetching behind the `Fetcher` trait
//! - Content classification and link extraction
//! - Overall crawl coordination across a worker pool

mod budget;
mod classifier;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use budget::Budget;
pub use classifier::{classify, is_parsable, MimeType, PARSABLE_TYPES};
pub use coordinator::{Coordinator, CrawlReport, Outcome, StopHandle};
pub use fetcher::{
    build_http_client, build_request_headers, FetchError, FetchErrorKind, FetchResponse, Fetcher,
    HttpFetcher,
};
pub use frontier::Frontier;
pub use parser::{extract_links, find_links};

use crate::config::Config;
use crate::SpidyError;
use std::sync::Arc;

/// Builds a coordinator for `config` backed by the HTTP fetcher and seeds it
///
/// This is the main entry point for starting a crawl. The caller runs the
/// returned coordinator and may take a stop handle from it first.
///
/// # Arguments
///
/// * `config` - The crawler configuration, including seeds
///
/// # Returns
///
/// * `Ok(Coordinator)` - A seeded coordinator ready to run
/// * `Err(SpidyError)` - The HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use spidy_map::config::Config;
/// use spidy_map::crawler::prepare_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.seeds.push("https://example.com/".to_string());
/// let coordinator = prepare_crawl(&config)?;
/// let report = coordinator.run().await?;
/// println!("{} pages crawled", report.units_completed);
/// # Ok(())
/// # }
/// ```
pub fn prepare_crawl(config: &Config) -> Result<Coordinator, SpidyError> {
    let fetcher = HttpFetcher::from_config(&config.headers, &config.crawler)?;
    let coordinator = Coordinator::new(&config.crawler, Arc::new(fetcher));
    let seeded = coordinator.seed(&config.seeds);
    tracing::info!("Seeded frontier with {} URLs", seeded);
    Ok(coordinator)
}
