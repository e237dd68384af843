//! Configuration module for spidy-map
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use spidy_map::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spidy.toml")).unwrap();
//! println!("Crawler will stop after {} pages", config.crawler.budget);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, GraphFormat, HeadersConfig, OutputConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_seeds_file, parse_config,
};
pub use validation::{validate, validate_seed};
