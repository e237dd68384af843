//! JSON rendering of the connectivity graph

use crate::output::graph::{GraphSnapshot, Labels};
use crate::output::traits::{GraphRenderer, OutputResult};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct JsonNode<'a> {
    id: String,
    url: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    label: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonEdge {
    source: String,
    target: String,
}

#[derive(Debug, Serialize)]
struct JsonGraph<'a> {
    nodes: Vec<JsonNode<'a>>,
    edges: Vec<JsonEdge>,
}

/// Renders graphs as pretty-printed JSON node and edge lists
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl GraphRenderer for JsonRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_graph(
        &self,
        graph: &GraphSnapshot,
        labels: &Labels,
        out: &mut dyn Write,
    ) -> OutputResult<()> {
        let document = JsonGraph {
            nodes: graph
                .nodes
                .iter()
                .map(|(id, url)| JsonNode {
                    id: id.to_hex(),
                    url: url.as_str(),
                    label: labels.get(id).map(String::as_str).unwrap_or(""),
                })
                .collect(),
            edges: graph
                .edges
                .iter()
                .map(|(source, target)| JsonEdge {
                    source: source.to_hex(),
                    target: target.to_hex(),
                })
                .collect(),
        };

        serde_json::to_writer_pretty(&mut *out, &document)?;
        writeln!(out)?;
        Ok(())
    }
}
