//! Shared fixtures for integration tests
//!
//! Small graphs with known shape, plus a catalog describing a tiny course.

#![allow(dead_code)]

use knowgraph::{CatalogItem, Edge, Graph, InMemoryCatalog, Node, NodeType};

/// Nodes `"0"..n` of the given type, no edges
pub fn nodes(n: usize, node_type: NodeType) -> Graph {
    let mut graph = Graph::new();
    for i in 0..n {
        graph.add_node(Node::new(i.to_string(), format!("Node {i}"), node_type));
    }
    graph
}

/// Add `source -> target` with the given type and weight; panics if rejected
pub fn link(graph: &mut Graph, source: &str, target: &str, relationship: &str, weight: f64) {
    assert!(
        graph.add_edge(Edge::new(source, target, relationship).with_weight(weight)),
        "edge {source} -> {target} rejected"
    );
}

/// Hub `"0"` connected to five leaves
pub fn star() -> Graph {
    let mut graph = nodes(6, NodeType::Concept);
    for leaf in 1..=5 {
        link(&mut graph, "0", &leaf.to_string(), "RELATED_TO", 1.0);
    }
    graph
}

/// `"0" -> "1" -> ... -> "n-1"`
pub fn chain(n: usize) -> Graph {
    let mut graph = nodes(n, NodeType::Concept);
    for i in 1..n {
        link(&mut graph, &(i - 1).to_string(), &i.to_string(), "BUILDS_ON", 1.0);
    }
    graph
}

/// Binary tree of seven nodes rooted at `"0"`, two levels deep
pub fn tree() -> Graph {
    let mut graph = nodes(7, NodeType::Concept);
    for (parent, child) in [(0, 1), (0, 2), (1, 3), (1, 4), (2, 5), (2, 6)] {
        link(&mut graph, &parent.to_string(), &child.to_string(), "PREREQUISITE_OF", 1.0);
    }
    graph
}

/// A tiny Rust course as the content catalog would describe it
pub fn course_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_item(
            CatalogItem::new("ownership", "Ownership", "concept")
                .with_tags(["rust", "memory"])
                .with_connections(["borrowing"]),
        )
        .with_item(
            CatalogItem::new("borrowing", "Borrowing", "concept")
                .with_tags(["Rust"])
                .with_connections(["lifetimes", "ownership"]),
        )
        .with_item(
            CatalogItem::new("lifetimes", "Lifetimes", "article")
                .with_tags(["rust", "advanced"])
                .with_connections(["missing-item"]),
        )
        .with_item(
            CatalogItem::new("drill", "Borrow checker drill", "exercise")
                .with_tags(["practice"])
                .with_connections(["borrowing"]),
        )
}
