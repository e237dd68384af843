//! Graph projection of the registry
//!
//! The graph is never maintained as a separate structure during the crawl;
//! it is computed from the registry on demand so the two cannot drift.

use crate::registry::Registry;
use crate::url::UrlId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-node labels, keyed by node id
pub type Labels = BTreeMap<UrlId, String>;

/// Point-in-time node and edge sets derived from the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    /// Seeds plus every id with at least one inbound or outbound edge,
    /// mapped to its URL
    pub nodes: BTreeMap<UrlId, String>,

    /// (source, target) pairs from each record's outbound set
    pub edges: BTreeSet<(UrlId, UrlId)>,
}

impl GraphSnapshot {
    /// Builds a snapshot by walking the registry once
    ///
    /// Pure read; safe to call while a crawl is still running.
    pub fn from_registry(registry: &Registry) -> Self {
        let records = registry.records();
        let seeds = registry.seeds();
        let urls: HashMap<UrlId, &str> = records
            .iter()
            .map(|record| (record.id, record.url.as_str()))
            .collect();

        let mut nodes = BTreeMap::new();
        let mut edges = BTreeSet::new();

        for record in &records {
            if seeds.contains(&record.id) || !record.outbound.is_empty() {
                nodes.insert(record.id, record.url.clone());
            }
            for target in &record.outbound {
                let url = urls.get(target).copied().unwrap_or_default();
                nodes
                    .entry(*target)
                    .or_insert_with(|| url.to_string());
                edges.insert((record.id, *target));
            }
        }

        Self { nodes, edges }
    }
}

/// Labels only well-connected hubs
///
/// Every registered URL whose outbound-edge count exceeds `threshold` keeps
/// its full URL as a label; every other URL gets an empty label.
pub fn crop(registry: &Registry, threshold: usize) -> Labels {
    registry
        .records()
        .into_iter()
        .map(|record| {
            let label = if record.outbound.len() > threshold {
                record.url
            } else {
                String::new()
            };
            (record.id, label)
        })
        .collect()
}
