//! Structural summary of a graph

use crate::graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts and distributions describing a graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes per node type label.
    pub type_distribution: BTreeMap<String, usize>,
    /// Edges per relationship type.
    pub relationship_distribution: BTreeMap<String, usize>,
    /// Nodes without any incident edge.
    pub isolated_count: usize,
    /// Average incident edges per node (in + out).
    pub avg_degree: f64,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// Node with the most incoming edges; first inserted wins ties.
    pub most_referenced: Option<NodeId>,
    /// Node with the most outgoing edges; first inserted wins ties.
    pub most_connected: Option<NodeId>,
}

pub fn compute_stats(graph: &Graph) -> GraphStats {
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();

    let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *type_distribution
            .entry(node.node_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    let mut relationship_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for edge in graph.edges() {
        *relationship_distribution
            .entry(edge.relationship_type.clone())
            .or_insert(0) += 1;
    }

    let mut isolated_count = 0;
    let mut max_in: Option<(&NodeId, usize)> = None;
    let mut max_out: Option<(&NodeId, usize)> = None;
    for id in graph.node_ids() {
        let incoming = graph.in_degree(id);
        let outgoing = graph.out_degree(id);
        if incoming + outgoing == 0 {
            isolated_count += 1;
        }
        if max_in.map_or(true, |(_, best)| incoming > best) {
            max_in = Some((id, incoming));
        }
        if max_out.map_or(true, |(_, best)| outgoing > best) {
            max_out = Some((id, outgoing));
        }
    }

    // Every edge contributes one in and one out
    let avg_degree = if node_count > 0 {
        (2 * edge_count) as f64 / node_count as f64
    } else {
        0.0
    };

    let (most_referenced, max_in_degree) = split(max_in);
    let (most_connected, max_out_degree) = split(max_out);

    GraphStats {
        node_count,
        edge_count,
        type_distribution,
        relationship_distribution,
        isolated_count,
        avg_degree,
        max_in_degree,
        max_out_degree,
        most_referenced,
        most_connected,
    }
}

fn split(best: Option<(&NodeId, usize)>) -> (Option<NodeId>, usize) {
    match best {
        Some((id, degree)) if degree > 0 => (Some(id.clone()), degree),
        _ => (None, 0),
    }
}
