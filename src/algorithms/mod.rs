//! Read-only graph analysis
//!
//! Each analysis lives in its own module as a free function over `&Graph`;
//! [`GraphAlgorithms`] bundles them behind one borrow.

mod centrality;
mod community;
mod path;
mod stats;

pub use centrality::{degree_centrality, page_rank, PageRankConfig};
pub use community::{connected_components, find_communities};
pub use path::shortest_path;
pub use stats::{compute_stats, GraphStats};

use crate::graph::{Graph, NodeId};
use std::collections::HashMap;

/// Analyses over a borrowed graph
pub struct GraphAlgorithms<'a> {
    graph: &'a Graph,
}

impl<'a> GraphAlgorithms<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// Lowest total edge weight path, endpoints included.
    pub fn shortest_path(&self, source: &str, target: &str) -> Option<Vec<NodeId>> {
        shortest_path(self.graph, source, target)
    }

    pub fn degree_centrality(&self) -> HashMap<NodeId, f64> {
        degree_centrality(self.graph)
    }

    pub fn pagerank(&self, config: &PageRankConfig) -> HashMap<NodeId, f64> {
        page_rank(self.graph, config)
    }

    /// Dense community label per node.
    pub fn find_communities(&self) -> HashMap<NodeId, usize> {
        find_communities(self.graph)
    }

    pub fn stats(&self) -> GraphStats {
        compute_stats(self.graph)
    }
}
