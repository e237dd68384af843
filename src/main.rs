//! Spidy-Map main entry point
//!
//! This is the command-line interface for the Spidy-Map link graph crawler.

use anyhow::{bail, Context};
use clap::Parser;
use spidy_map::config::{self, load_config_with_hash, load_seeds_file, Config, GraphFormat};
use spidy_map::crawler::prepare_crawl;
use spidy_map::output::{export_graph, print_statistics, CrawlStatistics};
use spidy_map::SpidyError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spidy-Map: a link graph crawler
///
/// Spidy-Map crawls outward from a set of seed URLs with a pool of
/// concurrent workers, records which pages link to which, and exports the
/// resulting graph once its visit budget is spent.
#[derive(Parser, Debug)]
#[command(name = "spidy-map")]
#[command(version = "1.0.0")]
#[command(about = "A link graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed URL to start from (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// File with one seed URL per line
    #[arg(long, value_name = "PATH")]
    seeds_file: Option<PathBuf>,

    /// Maximum number of pages to crawl (0 = unbounded)
    #[arg(long)]
    budget: Option<usize>,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Graph output format
    #[arg(long, value_enum)]
    format: Option<GraphFormat>,

    /// Label nodes with more than this many outbound links
    #[arg(long)]
    label_threshold: Option<usize>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spidy_map=info,warn"),
            1 => EnvFilter::new("spidy_map=debug,info"),
            2 => EnvFilter::new("spidy_map=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    config.seeds.extend(cli.seeds.iter().cloned());
    if let Some(path) = &cli.seeds_file {
        let seeds = load_seeds_file(path)
            .with_context(|| format!("failed to load seeds from {}", path.display()))?;
        tracing::info!("Loaded {} seeds from {}", seeds.len(), path.display());
        config.seeds.extend(seeds);
    }

    if let Some(budget) = cli.budget {
        config.crawler.budget = budget;
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(threshold) = cli.label_threshold {
        config.output.label_threshold = threshold;
    }

    config::validate(&config).context("invalid configuration")?;
    if config.seeds.is_empty() {
        bail!("no seed URLs given; use --seed, --seeds-file or the config `seeds` list");
    }

    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Spidy-Map Dry Run ===\n");

    println!("Crawler Configuration:");
    match config.crawler.budget {
        0 => println!("  Budget: unbounded"),
        budget => println!("  Budget: {} pages", budget),
    }
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    match config.crawler.data_ceiling() {
        Some(limit) => println!("  Data ceiling: {} bytes", limit),
        None => println!("  Data ceiling: none"),
    }

    println!("\nRequest Headers:");
    println!("  User-Agent: {}", config.headers.user_agent);
    println!("  Accept-Language: {}", config.headers.accept_language);
    println!("  Accept-Encoding: {}", config.headers.accept_encoding);
    println!("  Connection: {}", config.headers.connection);

    println!("\nOutput:");
    println!("  Graph directory: {}", config.output.graph_dir);
    println!("  Format: {}", config.output.format);
    println!("  Label threshold: {}", config.output.label_threshold);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let coordinator = prepare_crawl(&config)?;

    let stop = coordinator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            stop.stop();
        }
    });

    let report = match coordinator.run().await {
        Ok(report) => report,
        Err(e @ SpidyError::MemoryCeiling { .. }) => {
            tracing::error!("{}; aborting without exporting the graph", e);
            return Err(e.into());
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let registry = coordinator.registry();
    let stats = CrawlStatistics::from_registry(&registry);
    print_statistics(&stats, &report);

    let path = export_graph(&registry, &config.output).context("failed to export graph")?;
    println!("\n✓ Graph exported to: {}", path.display());

    Ok(())
}
