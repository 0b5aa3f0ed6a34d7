//! Community detection via weakly connected components

use crate::graph::{Graph, NodeId};
use std::collections::HashMap;

/// Union-Find data structure
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut current = i;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);
        if root_i == root_j {
            return;
        }
        match self.rank[root_i].cmp(&self.rank[root_j]) {
            std::cmp::Ordering::Less => self.parent[root_i] = root_j,
            std::cmp::Ordering::Greater => self.parent[root_j] = root_i,
            std::cmp::Ordering::Equal => {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }
}

/// Weakly connected components, ignoring edge direction.
///
/// Components are returned in the insertion order of their first node, and
/// members keep insertion order.
pub fn connected_components(graph: &Graph) -> Vec<Vec<NodeId>> {
    let ids: Vec<&NodeId> = graph.node_ids().collect();
    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut uf = UnionFind::new(ids.len());
    for edge in graph.edges() {
        if let (Some(&s), Some(&t)) = (
            index.get(edge.source_id.as_str()),
            index.get(edge.target_id.as_str()),
        ) {
            uf.union(s, t);
        }
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<NodeId>> = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let root = uf.find(i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push((*id).clone());
    }
    components
}

/// Map each node to a dense community label (0, 1, 2, ...)
pub fn find_communities(graph: &Graph) -> HashMap<NodeId, usize> {
    connected_components(graph)
        .into_iter()
        .enumerate()
        .flat_map(|(label, members)| members.into_iter().map(move |id| (id, label)))
        .collect()
}
