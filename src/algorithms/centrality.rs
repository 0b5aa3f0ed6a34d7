//! Node centrality: normalized degree and PageRank

use crate::graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// PageRank configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Damping factor (usually 0.85)
    pub damping_factor: f64,
    /// Upper bound on iterations
    pub max_iterations: usize,
    /// Stop once the L1 change between iterations drops below this
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Incident edge count (in + out) divided by `n - 1`
pub fn degree_centrality(graph: &Graph) -> HashMap<NodeId, f64> {
    let n = graph.node_count();
    let denominator = n.saturating_sub(1) as f64;

    graph
        .node_ids()
        .map(|id| {
            let score = if denominator > 0.0 {
                graph.degree(id) as f64 / denominator
            } else {
                0.0
            };
            (id.clone(), score)
        })
        .collect()
}

/// PageRank over the undirected view of the graph.
///
/// Every directed edge passes rank in both directions, so well-connected hubs
/// score highest whichever way their edges point. Only nodes with at least one
/// incident edge take part; isolated nodes score 0.0. Scores of participating
/// nodes sum to 1.
pub fn page_rank(graph: &Graph, config: &PageRankConfig) -> HashMap<NodeId, f64> {
    let mut result: HashMap<NodeId, f64> = graph.node_ids().map(|id| (id.clone(), 0.0)).collect();

    let index_to_node: Vec<&NodeId> = graph.node_ids().filter(|id| graph.degree(id) > 0).collect();
    let n = index_to_node.len();
    if n == 0 {
        return result;
    }
    let node_to_index: HashMap<&str, usize> = index_to_node
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in graph.edges() {
        let (Some(&s), Some(&t)) = (
            node_to_index.get(edge.source_id.as_str()),
            node_to_index.get(edge.target_id.as_str()),
        ) else {
            continue;
        };
        neighbors[s].push(t);
        neighbors[t].push(s);
    }

    let d = config.damping_factor;
    let base_score = (1.0 - d) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];
    let mut next_scores = vec![0.0; n];

    for _ in 0..config.max_iterations {
        next_scores.fill(base_score);
        for (u, adjacent) in neighbors.iter().enumerate() {
            let share = d * scores[u] / adjacent.len() as f64;
            for &v in adjacent {
                next_scores[v] += share;
            }
        }

        let total_diff: f64 = scores
            .iter()
            .zip(&next_scores)
            .map(|(a, b)| (a - b).abs())
            .sum();
        std::mem::swap(&mut scores, &mut next_scores);

        if total_diff < config.tolerance {
            break;
        }
    }

    for (idx, score) in scores.into_iter().enumerate() {
        result.insert(index_to_node[idx].clone(), score);
    }
    result
}
