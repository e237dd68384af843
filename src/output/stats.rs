//! Statistics generation from the URL registry
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics once a run has ended.

use crate::crawler::CrawlReport;
use crate::registry::Registry;
use crate::url::extract_domain;
use std::collections::HashSet;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of URLs registered
    pub total_urls: usize,

    /// URLs that were fetched (successfully or not)
    pub crawled: usize,

    /// Crawled URLs whose content was parsed for links
    pub parsable: usize,

    /// URLs marked unparsable
    pub unparsable: usize,

    /// Total number of distinct edges
    pub total_links: usize,

    /// Number of unique hosts encountered
    pub unique_domains: usize,
}

impl CrawlStatistics {
    /// Computes statistics from a registry snapshot
    pub fn from_registry(registry: &Registry) -> Self {
        let mut stats = Self::default();
        let mut domains = HashSet::new();

        for record in registry.records() {
            stats.total_urls += 1;
            stats.total_links += record.outbound.len();

            if record.crawled {
                stats.crawled += 1;
                if record.parsable {
                    stats.parsable += 1;
                }
            }
            if !record.parsable {
                stats.unparsable += 1;
            }

            if let Some(domain) = extract_domain(&record.url) {
                domains.insert(domain);
            }
        }

        stats.unique_domains = domains.len();
        stats
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `report` - The outcome of the run the statistics were taken from
pub fn print_statistics(stats: &CrawlStatistics, report: &CrawlReport) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Units completed: {}", report.units_completed);
    println!("  Frontier size: {}", report.frontier_size);
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    if report.budget_exhausted {
        println!("  Stopped: budget exhausted");
    } else if report.interrupted {
        println!("  Stopped: interrupted");
    }
    println!();

    println!("Registry:");
    println!("  URLs registered: {}", stats.total_urls);
    println!("  Unique domains: {}", stats.unique_domains);
    println!("  Total links found: {}", stats.total_links);
    println!("  Crawled: {}", stats.crawled);
    println!("  Parsed: {}", stats.parsable);
    println!("  Unparsable: {}", stats.unparsable);
    println!();

    let success_rate = if stats.crawled > 0 {
        (stats.parsable as f64 / stats.crawled as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Parse Rate: {:.1}% ({} / {} crawled pages parsed)",
        success_rate, stats.parsable, stats.crawled
    );
}
