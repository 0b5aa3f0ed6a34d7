//! Graph: the node/edge arenas and their adjacency indexes
//!
//! Nodes and edges live in insertion-ordered maps keyed by id and by
//! `(source, target, type)` triple. Adjacency is a pair of index maps from
//! node id to the keys of its outgoing/incoming edges. All primitives keep
//! these structures consistent: an edge is never stored unless both endpoints
//! exist, and removing a node removes every edge that touches it.
//!
//! A `Graph` has no internal locking. Callers sharing one between threads
//! must synchronize externally (see `KnowledgeEngine`).

use super::edge::{Edge, EdgeKey};
use super::error::GraphError;
use super::node::{Node, NodeId, Properties};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Interchange representation of a graph: flat node and edge arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// An in-memory, single-owner knowledge graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeKey, Edge>,
    outgoing: HashMap<NodeId, IndexSet<EdgeKey>>,
    incoming: HashMap<NodeId, IndexSet<EdgeKey>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // === Nodes ===

    /// Insert a node. Returns `false` if a node with the same id exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(node.id.as_str()) {
            return false;
        }
        self.outgoing.insert(node.id.clone(), IndexSet::new());
        self.incoming.insert(node.id.clone(), IndexSet::new());
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Remove a node and every edge touching it. Returns `false` if absent.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.shift_remove(id) else {
            return false;
        };

        let mut touching: IndexSet<EdgeKey> = self.outgoing.remove(id).unwrap_or_default();
        touching.extend(self.incoming.remove(id).unwrap_or_default());

        for key in touching {
            self.unlink_edge(&key, &node.id);
        }
        true
    }

    /// Look up a node by id
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// True if a node with this id exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Mutable access to a node's title
    pub fn set_node_title(&mut self, id: &str, title: impl Into<String>) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Mutable access to a node's properties
    ///
    /// The id and category are not reachable through this handle, so the
    /// graph's indexes stay valid.
    pub fn node_properties_mut(&mut self, id: &str) -> Option<&mut Properties> {
        self.nodes.get_mut(id).map(|node| &mut node.properties)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Edges ===

    /// Insert an edge.
    ///
    /// Returns `false` if either endpoint is missing or the
    /// `(source, target, type)` triple is already present. An existing edge is
    /// never overwritten.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if !self.contains_node(&edge.source_id) || !self.contains_node(&edge.target_id) {
            return false;
        }
        let key = edge.key();
        if self.edges.contains_key(&key) {
            return false;
        }

        if let Some(out) = self.outgoing.get_mut(edge.source_id.as_str()) {
            out.insert(key.clone());
        }
        if let Some(inc) = self.incoming.get_mut(edge.target_id.as_str()) {
            inc.insert(key.clone());
        }
        self.edges.insert(key, edge);
        true
    }

    /// Remove a single edge by its identity triple. Returns `false` if absent.
    pub fn remove_edge(&mut self, key: &EdgeKey) -> bool {
        let Some(edge) = self.edges.shift_remove(key) else {
            return false;
        };
        if let Some(out) = self.outgoing.get_mut(edge.source_id.as_str()) {
            out.shift_remove(key);
        }
        if let Some(inc) = self.incoming.get_mut(edge.target_id.as_str()) {
            inc.shift_remove(key);
        }
        true
    }

    /// Look up an edge by its triple
    pub fn get_edge(&self, source: &str, target: &str, relationship_type: &str) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(source, target, relationship_type))
    }

    /// Look up an edge by key
    pub fn get_edge_by_key(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn contains_edge(&self, key: &EdgeKey) -> bool {
        self.edges.contains_key(key)
    }

    /// Update the weight of an existing edge
    pub fn set_edge_weight(&mut self, key: &EdgeKey, weight: f64) -> bool {
        match self.edges.get_mut(key) {
            Some(edge) => {
                edge.weight = weight;
                true
            }
            None => false,
        }
    }

    /// Mutable access to an edge's properties
    pub fn edge_properties_mut(&mut self, key: &EdgeKey) -> Option<&mut Properties> {
        self.edges.get_mut(key).map(|edge| &mut edge.properties)
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges whose source is `id`, in insertion order
    pub fn get_edges_from_node(&self, id: &str) -> Vec<&Edge> {
        self.resolve(self.outgoing.get(id))
    }

    /// Edges whose target is `id`, in insertion order
    pub fn get_edges_to_node(&self, id: &str) -> Vec<&Edge> {
        self.resolve(self.incoming.get(id))
    }

    // === Neighborhoods ===

    /// Targets of outgoing edges
    pub fn get_neighbors(&self, id: &str) -> HashSet<NodeId> {
        self.get_edges_from_node(id)
            .into_iter()
            .map(|e| e.target_id.clone())
            .collect()
    }

    /// Sources of incoming edges
    pub fn get_incoming_neighbors(&self, id: &str) -> HashSet<NodeId> {
        self.get_edges_to_node(id)
            .into_iter()
            .map(|e| e.source_id.clone())
            .collect()
    }

    /// Neighbors over both directions, deduplicated, outgoing first
    pub fn undirected_neighbors(&self, id: &str) -> IndexSet<NodeId> {
        let mut neighbors = IndexSet::new();
        for edge in self.get_edges_from_node(id) {
            neighbors.insert(edge.target_id.clone());
        }
        for edge in self.get_edges_to_node(id) {
            neighbors.insert(edge.source_id.clone());
        }
        neighbors
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.outgoing.get(id).map_or(0, IndexSet::len)
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.incoming.get(id).map_or(0, IndexSet::len)
    }

    /// Number of incident edges, in plus out
    pub fn degree(&self, id: &str) -> usize {
        self.out_degree(id) + self.in_degree(id)
    }

    /// A new graph holding the given nodes (those present) and only the
    /// edges whose both endpoints are among them.
    pub fn get_subgraph(&self, ids: &[impl AsRef<str>]) -> Graph {
        let mut sub = Graph::new();
        for id in ids {
            if let Some(node) = self.get_node(id.as_ref()) {
                sub.add_node(node.clone());
            }
        }
        for edge in self.edges.values() {
            if sub.contains_node(&edge.source_id) && sub.contains_node(&edge.target_id) {
                sub.add_edge(edge.clone());
            }
        }
        sub
    }

    // === Interchange ===

    /// Flatten into node and edge arrays, preserving insertion order
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Build a graph from a document, rejecting anything that would violate
    /// the graph invariants instead of silently dropping it.
    pub fn from_document(document: GraphDocument) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();
        for node in document.nodes {
            let id = node.id.clone();
            if !graph.add_node(node) {
                return Err(GraphError::DuplicateNode(id));
            }
        }
        for edge in document.edges {
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !graph.contains_node(endpoint) {
                    return Err(GraphError::MissingEndpoint {
                        edge: edge.key(),
                        node: endpoint.clone(),
                    });
                }
            }
            let key = edge.key();
            if !graph.add_edge(edge) {
                return Err(GraphError::DuplicateEdge(key));
            }
        }
        Ok(graph)
    }

    // === Internals ===

    fn resolve(&self, keys: Option<&IndexSet<EdgeKey>>) -> Vec<&Edge> {
        keys.map(|keys| keys.iter().filter_map(|k| self.edges.get(k)).collect())
            .unwrap_or_default()
    }

    /// Drop an edge whose endpoint `removed` is already gone, cleaning the
    /// surviving endpoint's index.
    fn unlink_edge(&mut self, key: &EdgeKey, removed: &NodeId) {
        if self.edges.shift_remove(key).is_none() {
            return;
        }
        if &key.source_id != removed {
            if let Some(out) = self.outgoing.get_mut(key.source_id.as_str()) {
                out.shift_remove(key);
            }
        }
        if &key.target_id != removed {
            if let Some(inc) = self.incoming.get_mut(key.target_id.as_str()) {
                inc.shift_remove(key);
            }
        }
    }
}
