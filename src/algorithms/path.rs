//! Weighted shortest path
//!
//! Dijkstra over outgoing edges with the edge weight as traversal cost.

use crate::graph::{Graph, NodeId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// State for the Dijkstra priority queue
#[derive(Debug, Clone, PartialEq)]
struct State {
    cost: f64,
    /// Discovery sequence, so equal costs pop in the order they were found
    seq: usize,
    node: NodeId,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: BinaryHeap is a max-heap
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lowest-cost path from `source` to `target`, both inclusive.
///
/// Negative and non-finite weights are not traversed. Returns `None` when
/// either node is missing or the target is unreachable.
pub fn shortest_path(graph: &Graph, source: &str, target: &str) -> Option<Vec<NodeId>> {
    let source_id = graph.get_node(source)?.id.clone();
    let target_id = graph.get_node(target)?.id.clone();
    if source_id == target_id {
        return Some(vec![source_id]);
    }

    let mut dist: HashMap<NodeId, f64> = HashMap::new();
    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut settled: HashSet<NodeId> = HashSet::new();
    let mut heap = BinaryHeap::new();
    let mut seq = 0;

    dist.insert(source_id.clone(), 0.0);
    heap.push(State {
        cost: 0.0,
        seq,
        node: source_id.clone(),
    });

    while let Some(State { cost, node, .. }) = heap.pop() {
        if node == target_id {
            return Some(reconstruct(&parent, &source_id, target_id));
        }
        if !settled.insert(node.clone()) {
            continue;
        }

        for edge in graph.get_edges_from_node(&node) {
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                continue;
            }
            if settled.contains(&edge.target_id) {
                continue;
            }
            let next_cost = cost + edge.weight;
            let best = dist.get(&edge.target_id).copied().unwrap_or(f64::INFINITY);
            if next_cost < best {
                dist.insert(edge.target_id.clone(), next_cost);
                parent.insert(edge.target_id.clone(), node.clone());
                seq += 1;
                heap.push(State {
                    cost: next_cost,
                    seq,
                    node: edge.target_id.clone(),
                });
            }
        }
    }

    None
}

fn reconstruct(parent: &HashMap<NodeId, NodeId>, source: &NodeId, target: NodeId) -> Vec<NodeId> {
    let mut path = vec![target];
    while let Some(prev) = path.last().and_then(|last| parent.get(last)) {
        path.push(prev.clone());
        if prev == source {
            break;
        }
    }
    path.reverse();
    path
}
