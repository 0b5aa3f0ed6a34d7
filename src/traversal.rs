//! Learning-oriented traversal
//!
//! Breadth-first exploration, weak components, prerequisite-first learning
//! paths and next-step suggestions. All walks follow edge insertion order,
//! so results are deterministic for a given graph.

use crate::graph::{Edge, Graph, Node, NodeId};
use crate::relationship::{
    BUILDS_ON, EXAMPLE_OF, EXPLAINS, LEARNING_RELATIONSHIPS, PART_OF, PREREQUISITE_OF,
    REFERENCES, RELATED_TO, TAGGED_WITH,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// A candidate node to study next
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextNodeSuggestion {
    pub node: Node,
    pub reason: String,
    pub score: f64,
}

/// How much a relationship type counts toward a next-step suggestion
pub fn relationship_importance(relationship_type: &str) -> f64 {
    match relationship_type {
        PREREQUISITE_OF => 1.0,
        BUILDS_ON => 0.9,
        EXPLAINS => 0.8,
        EXAMPLE_OF => 0.7,
        PART_OF => 0.6,
        RELATED_TO => 0.5,
        REFERENCES => 0.4,
        TAGGED_WITH => 0.2,
        _ => 0.3,
    }
}

fn reason_phrase(relationship_type: &str) -> &'static str {
    match relationship_type {
        PREREQUISITE_OF => "Unlocked by",
        BUILDS_ON => "Foundation of",
        EXPLAINS => "Explained in",
        EXAMPLE_OF => "Illustrated by",
        PART_OF => "Collection containing",
        RELATED_TO => "Related to",
        REFERENCES => "Referenced from",
        TAGGED_WITH => "Tag on",
        _ => "Linked from",
    }
}

/// Walks over a borrowed graph
pub struct GraphTraversal<'a> {
    graph: &'a Graph,
}

impl<'a> GraphTraversal<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// BFS over outgoing edges, visiting each node once.
    ///
    /// The start node comes first at depth 0; nodes deeper than `max_depth`
    /// are not visited. A missing start yields an empty list.
    pub fn breadth_first_search(&self, start: &str, max_depth: usize) -> Vec<(&'a Node, usize)> {
        let Some(origin) = self.graph.get_node(start) else {
            return Vec::new();
        };

        let mut visited: HashSet<&NodeId> = HashSet::from([&origin.id]);
        let mut queue: VecDeque<(&Node, usize)> = VecDeque::from([(origin, 0)]);
        let mut order = Vec::new();

        while let Some((node, depth)) = queue.pop_front() {
            order.push((node, depth));
            if depth == max_depth {
                continue;
            }
            for edge in self.graph.get_edges_from_node(&node.id) {
                if !visited.insert(&edge.target_id) {
                    continue;
                }
                if let Some(neighbor) = self.graph.get_node(&edge.target_id) {
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        order
    }

    /// Every node reachable from `id` ignoring edge direction, `id` included.
    pub fn find_connected_component(&self, id: &str) -> HashSet<NodeId> {
        let Some(origin) = self.graph.get_node(id) else {
            return HashSet::new();
        };

        let mut component = HashSet::from([origin.id.clone()]);
        let mut stack = vec![origin.id.clone()];
        while let Some(current) = stack.pop() {
            for neighbor in self.graph.undirected_neighbors(&current) {
                if component.insert(neighbor.clone()) {
                    stack.push(neighbor);
                }
            }
        }
        component
    }

    /// Path from `start` to `target`, both inclusive.
    ///
    /// Tries prerequisite and builds-on edges alone first, then any outgoing
    /// edge. Within each pass the path has the fewest hops.
    pub fn get_learning_path(&self, start: &str, target: &str) -> Option<Vec<NodeId>> {
        let start_id = &self.graph.get_node(start)?.id;
        let target_id = &self.graph.get_node(target)?.id;

        self.bfs_path(start_id, target_id, |edge| {
            LEARNING_RELATIONSHIPS.contains(&edge.relationship_type.as_str())
        })
        .or_else(|| self.bfs_path(start_id, target_id, |_| true))
    }

    fn bfs_path(
        &self,
        start: &NodeId,
        target: &NodeId,
        follow: impl Fn(&Edge) -> bool,
    ) -> Option<Vec<NodeId>> {
        if start == target {
            return Some(vec![start.clone()]);
        }

        let mut parent: HashMap<&NodeId, &NodeId> = HashMap::new();
        let mut visited: HashSet<&NodeId> = HashSet::from([start]);
        let mut queue: VecDeque<&NodeId> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for edge in self.graph.get_edges_from_node(current) {
                if !follow(edge) || !visited.insert(&edge.target_id) {
                    continue;
                }
                parent.insert(&edge.target_id, current);
                if &edge.target_id == target {
                    let mut path = vec![target.clone()];
                    let mut cursor = target;
                    while let Some(&prev) = parent.get(cursor) {
                        path.push(prev.clone());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(&edge.target_id);
            }
        }

        None
    }

    /// Outgoing neighbours of `id` not yet visited, best first.
    ///
    /// Score is edge weight times [`relationship_importance`]. Parallel edges
    /// to the same node keep the best score. Equal scores order by node id.
    pub fn suggest_next_nodes(&self, id: &str, visited: &HashSet<NodeId>) -> Vec<NextNodeSuggestion> {
        let Some(current) = self.graph.get_node(id) else {
            return Vec::new();
        };

        let mut best: HashMap<&NodeId, (f64, &str)> = HashMap::new();
        for edge in self.graph.get_edges_from_node(&current.id) {
            if edge.is_self_loop() || visited.contains(&edge.target_id) {
                continue;
            }
            let score = edge.weight * relationship_importance(&edge.relationship_type);
            let slot = best
                .entry(&edge.target_id)
                .or_insert((score, edge.relationship_type.as_str()));
            if score > slot.0 {
                *slot = (score, edge.relationship_type.as_str());
            }
        }

        let mut suggestions: Vec<NextNodeSuggestion> = best
            .into_iter()
            .filter_map(|(target, (score, relationship_type))| {
                let node = self.graph.get_node(target)?;
                Some(NextNodeSuggestion {
                    node: node.clone(),
                    reason: format!("{} '{}'", reason_phrase(relationship_type), current.title),
                    score,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.node.id.cmp(&b.node.id))
        });
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    fn node(graph: &mut Graph, id: &str, node_type: NodeType) {
        graph.add_node(Node::new(id, id.to_uppercase(), node_type));
    }

    fn link(graph: &mut Graph, source: &str, target: &str, relationship: &str, weight: f64) {
        graph.add_edge(Edge::new(source, target, relationship).with_weight(weight));
    }

    // root -> a, b; a -> c, d; b -> e, f
    fn tree() -> Graph {
        let mut graph = Graph::new();
        for id in ["root", "a", "b", "c", "d", "e", "f"] {
            node(&mut graph, id, NodeType::Concept);
        }
        for (s, t) in [("root", "a"), ("root", "b"), ("a", "c"), ("a", "d"), ("b", "e"), ("b", "f")] {
            link(&mut graph, s, t, BUILDS_ON, 1.0);
        }
        graph
    }

    #[test]
    fn bfs_visits_tree_within_depth() {
        let graph = tree();
        let visited = GraphTraversal::new(&graph).breadth_first_search("root", 2);
        assert_eq!(visited.len(), 7);
        assert_eq!(visited[0].0.id.as_str(), "root");
        assert_eq!(visited[0].1, 0);
        assert!(visited.iter().all(|(_, depth)| *depth <= 2));

        let ids: HashSet<&str> = visited.iter().map(|(n, _)| n.id.as_str()).collect();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn bfs_respects_depth_bound() {
        let graph = tree();
        let traversal = GraphTraversal::new(&graph);
        let shallow = traversal.breadth_first_search("root", 1);
        let ids: Vec<&str> = shallow.iter().map(|(n, _)| n.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "b"]);
        assert_eq!(traversal.breadth_first_search("root", 0).len(), 1);
        assert!(traversal.breadth_first_search("ghost", 3).is_empty());
    }

    #[test]
    fn bfs_visits_each_node_once_in_cycles() {
        let mut graph = Graph::new();
        for id in ["x", "y", "z"] {
            node(&mut graph, id, NodeType::Note);
        }
        link(&mut graph, "x", "y", RELATED_TO, 1.0);
        link(&mut graph, "y", "z", RELATED_TO, 1.0);
        link(&mut graph, "z", "x", RELATED_TO, 1.0);
        link(&mut graph, "x", "z", RELATED_TO, 1.0);

        let visited = GraphTraversal::new(&graph).breadth_first_search("x", 5);
        let depths: Vec<(&str, usize)> = visited.iter().map(|(n, d)| (n.id.as_str(), *d)).collect();
        assert_eq!(depths, vec![("x", 0), ("y", 1), ("z", 1)]);
    }

    #[test]
    fn component_ignores_direction() {
        let mut graph = tree();
        node(&mut graph, "island", NodeType::Note);
        let traversal = GraphTraversal::new(&graph);

        let from_leaf = traversal.find_connected_component("f");
        assert_eq!(from_leaf.len(), 7);
        assert!(from_leaf.contains("root"));
        assert!(!from_leaf.contains("island"));

        assert_eq!(traversal.find_connected_component("island").len(), 1);
        assert!(traversal.find_connected_component("ghost").is_empty());
    }

    #[test]
    fn learning_path_prefers_prerequisites() {
        let mut graph = Graph::new();
        for id in ["basics", "detour", "middle", "goal"] {
            node(&mut graph, id, NodeType::Concept);
        }
        // The direct RELATED_TO hop is shorter but not a learning edge
        link(&mut graph, "basics", "goal", RELATED_TO, 1.0);
        link(&mut graph, "basics", "middle", PREREQUISITE_OF, 1.0);
        link(&mut graph, "middle", "goal", BUILDS_ON, 1.0);

        let path = GraphTraversal::new(&graph)
            .get_learning_path("basics", "goal")
            .unwrap();
        let ids: Vec<&str> = path.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["basics", "middle", "goal"]);
    }

    #[test]
    fn learning_path_falls_back_to_any_edge() {
        let mut graph = Graph::new();
        for id in ["a", "b", "c"] {
            node(&mut graph, id, NodeType::Note);
        }
        link(&mut graph, "a", "b", PREREQUISITE_OF, 1.0);
        link(&mut graph, "b", "c", REFERENCES, 0.5);

        let traversal = GraphTraversal::new(&graph);
        let path = traversal.get_learning_path("a", "c").unwrap();
        assert_eq!(path.len(), 3);
        assert!(traversal.get_learning_path("c", "a").is_none());
        assert!(traversal.get_learning_path("a", "ghost").is_none());
        assert_eq!(traversal.get_learning_path("b", "b").unwrap(), vec![NodeId::from("b")]);
    }

    #[test]
    fn suggestions_sorted_with_reasons() {
        let mut graph = Graph::new();
        node(&mut graph, "here", NodeType::Note);
        for id in ["p", "r", "t", "seen", "twice"] {
            node(&mut graph, id, NodeType::Concept);
        }
        link(&mut graph, "here", "p", PREREQUISITE_OF, 0.8);
        link(&mut graph, "here", "r", RELATED_TO, 1.0);
        link(&mut graph, "here", "t", TAGGED_WITH, 1.0);
        link(&mut graph, "here", "seen", PREREQUISITE_OF, 1.0);
        link(&mut graph, "here", "twice", REFERENCES, 1.0);
        link(&mut graph, "here", "twice", BUILDS_ON, 1.0);
        link(&mut graph, "here", "here", RELATED_TO, 1.0);

        let visited = HashSet::from([NodeId::from("seen")]);
        let suggestions = GraphTraversal::new(&graph).suggest_next_nodes("here", &visited);

        let ids: Vec<&str> = suggestions.iter().map(|s| s.node.id.as_str()).collect();
        assert_eq!(ids, vec!["twice", "p", "r", "t"]);
        assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(suggestions.iter().all(|s| !s.reason.is_empty()));
        assert!(suggestions[0].reason.contains("HERE"));
        assert_eq!(suggestions[0].score, 0.9);
    }

    #[test]
    fn suggestions_break_ties_by_id() {
        let mut graph = Graph::new();
        for id in ["start", "zeta", "alpha"] {
            node(&mut graph, id, NodeType::Concept);
        }
        link(&mut graph, "start", "zeta", RELATED_TO, 0.5);
        link(&mut graph, "start", "alpha", RELATED_TO, 0.5);

        let suggestions = GraphTraversal::new(&graph).suggest_next_nodes("start", &HashSet::new());
        assert_eq!(suggestions[0].node.id.as_str(), "alpha");
        assert!(GraphTraversal::new(&graph)
            .suggest_next_nodes("ghost", &HashSet::new())
            .is_empty());
    }
}
