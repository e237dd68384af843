//! Renderer trait and output error types
//!
//! A renderer turns a graph snapshot plus node labels into a file artifact.
//! The crawl core never depends on a particular rendering technology.

use crate::output::graph::{GraphSnapshot, Labels};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for graph renderers
pub trait GraphRenderer {
    /// File extension of the produced artifact, without the dot
    fn extension(&self) -> &'static str;

    /// Writes the rendered graph to `out`
    ///
    /// # Arguments
    ///
    /// * `graph` - The node and edge sets to render
    /// * `labels` - Optional per-node labels; empty or missing means unlabeled
    /// * `out` - Destination writer
    fn write_graph(
        &self,
        graph: &GraphSnapshot,
        labels: &Labels,
        out: &mut dyn Write,
    ) -> OutputResult<()>;

    /// Renders the graph into a file at `path`, replacing any existing file
    fn render(&self, graph: &GraphSnapshot, labels: &Labels, path: &Path) -> OutputResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_graph(graph, labels, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
