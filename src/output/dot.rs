//! Graphviz DOT rendering
//!
//! Nodes are drawn as small points; labeled hubs carry their URL as an
//! external label so the picture stays readable on large graphs.

use crate::output::graph::{GraphSnapshot, Labels};
use crate::output::traits::{GraphRenderer, OutputResult};
use std::io::Write;

/// Renders graphs as Graphviz `digraph` source
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl GraphRenderer for DotRenderer {
    fn extension(&self) -> &'static str {
        "dot"
    }

    fn write_graph(
        &self,
        graph: &GraphSnapshot,
        labels: &Labels,
        out: &mut dyn Write,
    ) -> OutputResult<()> {
        writeln!(out, "digraph spidy {{")?;
        writeln!(out, "    node [shape=point, width=0.1, color=blue, fontcolor=red];")?;
        writeln!(out, "    edge [arrowsize=0.3];")?;

        for node in graph.nodes.keys() {
            match labels.get(node).filter(|label| !label.is_empty()) {
                Some(label) => writeln!(out, "    \"{}\" [xlabel=\"{}\"];", node, escape(label))?,
                None => writeln!(out, "    \"{}\";", node)?,
            }
        }

        for (source, target) in &graph.edges {
            writeln!(out, "    \"{}\" -> \"{}\";", source, target)?;
        }

        writeln!(out, "}}")?;
        Ok(())
    }
}

/// Escapes a string for use inside a double-quoted DOT identifier
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
