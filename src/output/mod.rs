//! Output module for exporting the link graph and run statistics
//!
//! This module handles:
//! - Projecting the registry into a node/edge graph
//! - Rendering that graph through a pluggable renderer
//! - Printing crawl statistics

mod dot;
mod graph;
mod json;
pub mod stats;
mod traits;

pub use dot::DotRenderer;
pub use graph::{crop, GraphSnapshot, Labels};
pub use json::JsonRenderer;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{GraphRenderer, OutputError, OutputResult};

use crate::config::{GraphFormat, OutputConfig};
use crate::registry::Registry;
use std::path::{Path, PathBuf};

/// Returns the renderer for an output format
pub fn renderer_for(format: GraphFormat) -> Box<dyn GraphRenderer> {
    match format {
        GraphFormat::Dot => Box::new(DotRenderer),
        GraphFormat::Json => Box::new(JsonRenderer),
    }
}

/// Builds the timestamped artifact path `<dir>/graph_<HHMMSS>.<ext>`
pub fn graph_file_path(dir: &Path, extension: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%H%M%S");
    dir.join(format!("graph_{}.{}", stamp, extension))
}

/// Exports the registry's graph to a new file in the configured directory
///
/// # Arguments
///
/// * `registry` - The registry to project; it is only read
/// * `config` - Output directory, format and label threshold
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written artifact
/// * `Err(OutputError)` - The directory or file could not be written
pub fn export_graph(registry: &Registry, config: &OutputConfig) -> OutputResult<PathBuf> {
    let dir = Path::new(&config.graph_dir);
    std::fs::create_dir_all(dir)?;

    let renderer = renderer_for(config.format);
    let path = graph_file_path(dir, renderer.extension());

    let graph = GraphSnapshot::from_registry(registry);
    let labels = crop(registry, config.label_threshold);
    tracing::info!(
        "Rendering graph with {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );

    renderer.render(&graph, &labels, &path)?;
    tracing::info!("Graph written to {}", path.display());
    Ok(path)
}
