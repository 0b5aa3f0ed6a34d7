//! Graph mutation façade
//!
//! `GraphOperations` borrows a `Graph` and a `RelationshipManager` and layers
//! validation on top of the graph primitives. It holds no state of its own.
//! Every operation reports an unmet precondition as `false` (or an empty
//! result) rather than an error, so callers may invoke them speculatively.

use crate::graph::{Edge, EdgeKey, Graph, Node, NodeId, NodeType, Properties, PropertyValue};
use crate::relationship::RelationshipManager;
use indexmap::IndexMap;
use tracing::debug;

/// Property key listing the ids a node has absorbed through merges
pub const MERGED_FROM: &str = "merged_from";

/// How the absorbed node's properties are folded into the survivor on merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyMerge {
    /// Keep the survivor's properties untouched
    #[default]
    Keep,
    /// Copy only keys the survivor does not have
    FillMissing,
    /// Absorbed values replace the survivor's on conflict
    Overwrite,
}

/// Validated mutations over one graph
pub struct GraphOperations<'a> {
    graph: &'a mut Graph,
    relationships: &'a RelationshipManager,
}

impl<'a> GraphOperations<'a> {
    pub fn new(graph: &'a mut Graph, relationships: &'a RelationshipManager) -> Self {
        Self {
            graph,
            relationships,
        }
    }

    /// Read access to the underlying graph
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Create a node for a content item (or tag)
    pub fn add_content_node(
        &mut self,
        id: impl Into<NodeId>,
        title: impl Into<String>,
        node_type: NodeType,
        properties: Properties,
    ) -> bool {
        let node = Node::new(id, title, node_type).with_properties(properties);
        let id = node.id.clone();
        let added = self.graph.add_node(node);
        if !added {
            debug!(node = %id, "node already exists");
        }
        added
    }

    /// Create an edge after checking the relationship type's category
    /// constraints and weight range. `None` uses the type's default weight.
    pub fn create_relationship(
        &mut self,
        source: &str,
        target: &str,
        relationship_type: &str,
        weight: Option<f64>,
    ) -> bool {
        let (Some(source_node), Some(target_node)) =
            (self.graph.get_node(source), self.graph.get_node(target))
        else {
            debug!(source, target, relationship_type, "relationship endpoint missing");
            return false;
        };

        if !self.relationships.validate_relationship(
            source_node.node_type,
            target_node.node_type,
            relationship_type,
        ) {
            debug!(
                source,
                target,
                relationship_type,
                source_type = %source_node.node_type,
                target_type = %target_node.node_type,
                "relationship rejected by constraints"
            );
            return false;
        }

        let weight = weight.unwrap_or_else(|| self.relationships.default_weight(relationship_type));
        if !self.relationships.accepts_weight(relationship_type, weight) {
            debug!(relationship_type, weight, "weight outside accepted range");
            return false;
        }

        self.graph
            .add_edge(Edge::new(source, target, relationship_type).with_weight(weight))
    }

    /// Merge `absorbed` into `surviving`.
    ///
    /// Edges touching the absorbed node are redirected to the survivor with
    /// direction and type preserved. Redirected edges that collide with an
    /// existing triple, or that would become self-loops, are dropped. The
    /// absorbed node is then gone.
    pub fn merge_nodes(&mut self, surviving: &str, absorbed: &str, merge: PropertyMerge) -> bool {
        if surviving == absorbed {
            return false;
        }
        let Some(absorbed_node) = self.graph.get_node(absorbed).cloned() else {
            return false;
        };
        if !self.graph.contains_node(surviving) {
            return false;
        }

        let outgoing: Vec<Edge> = self
            .graph
            .get_edges_from_node(absorbed)
            .into_iter()
            .cloned()
            .collect();
        let incoming: Vec<Edge> = self
            .graph
            .get_edges_to_node(absorbed)
            .into_iter()
            .filter(|e| !e.is_self_loop())
            .cloned()
            .collect();

        self.graph.remove_node(absorbed);

        let survivor = NodeId::from(surviving);
        let (mut redirected, mut dropped) = (0usize, 0usize);
        for mut edge in outgoing.into_iter().chain(incoming) {
            if edge.source_id.as_str() == absorbed {
                edge.source_id = survivor.clone();
            }
            if edge.target_id.as_str() == absorbed {
                edge.target_id = survivor.clone();
            }
            if !edge.is_self_loop() && self.graph.add_edge(edge) {
                redirected += 1;
            } else {
                dropped += 1;
            }
        }

        if let Some(properties) = self.graph.node_properties_mut(surviving) {
            let prior = merge_history(properties.get(MERGED_FROM));
            let inherited = merge_history(absorbed_node.properties.get(MERGED_FROM));
            fold_properties(properties, absorbed_node.properties, merge);
            record_merge(properties, prior, inherited, &absorbed_node.id);
        }

        debug!(surviving, absorbed, redirected, dropped, "merged nodes");
        true
    }

    /// Rank nodes two hops away that are not yet adjacent to `id`.
    ///
    /// Adjacency ignores direction. A candidate's score is the sum, over each
    /// intermediate node, of the product of the two link weights, so several
    /// strong paths outrank a single weak one.
    pub fn suggest_connections(&self, id: &str, limit: usize) -> Vec<(NodeId, f64)> {
        if limit == 0 || !self.graph.contains_node(id) {
            return Vec::new();
        }

        let direct = self.graph.undirected_neighbors(id);
        let mut scores: IndexMap<NodeId, f64> = IndexMap::new();

        for middle in &direct {
            let first_hop = link_weight(self.graph, id, middle);
            for candidate in self.graph.undirected_neighbors(middle) {
                if candidate.as_str() == id || direct.contains(&candidate) {
                    continue;
                }
                let second_hop = link_weight(self.graph, middle, &candidate);
                *scores.entry(candidate).or_insert(0.0) += first_hop * second_hop;
            }
        }

        let mut ranked: Vec<(NodeId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Insert or replace properties on a node
    pub fn update_node_properties(&mut self, id: &str, properties: Properties) -> bool {
        match self.graph.node_properties_mut(id) {
            Some(existing) => {
                existing.extend(properties);
                true
            }
            None => false,
        }
    }

    /// Change an edge's weight, subject to its type's weight range
    pub fn set_edge_weight(&mut self, key: &EdgeKey, weight: f64) -> bool {
        if !self.relationships.accepts_weight(&key.relationship_type, weight) {
            debug!(edge = %key, weight, "weight outside accepted range");
            return false;
        }
        self.graph.set_edge_weight(key, weight)
    }

    pub fn remove_relationship(&mut self, key: &EdgeKey) -> bool {
        self.graph.remove_edge(key)
    }

    pub fn remove_node(&mut self, id: &str) -> bool {
        self.graph.remove_node(id)
    }
}

/// Strongest weight over the edges linking `a` and `b` in either direction
fn link_weight(graph: &Graph, a: &str, b: &str) -> f64 {
    graph
        .get_edges_from_node(a)
        .into_iter()
        .filter(|e| e.target_id.as_str() == b)
        .chain(
            graph
                .get_edges_to_node(a)
                .into_iter()
                .filter(|e| e.source_id.as_str() == b),
        )
        .map(|e| e.weight)
        .fold(0.0, f64::max)
}

fn fold_properties(target: &mut Properties, incoming: Properties, merge: PropertyMerge) {
    match merge {
        PropertyMerge::Keep => {}
        PropertyMerge::FillMissing => {
            for (key, value) in incoming {
                target.entry(key).or_insert(value);
            }
        }
        PropertyMerge::Overwrite => target.extend(incoming),
    }
}

/// The ids in a `merged_from` value, or `None` for a non-list value
fn merge_history(value: Option<&PropertyValue>) -> Option<Vec<String>> {
    match value {
        None => Some(Vec::new()),
        Some(PropertyValue::List(ids)) => Some(ids.clone()),
        Some(_) => None,
    }
}

/// Write `merged_from` as survivor history, then the absorbed node's history,
/// then the absorbed id. A non-list value under the key belongs to the caller
/// and is left alone.
fn record_merge(
    properties: &mut Properties,
    prior: Option<Vec<String>>,
    inherited: Option<Vec<String>>,
    absorbed: &NodeId,
) {
    if merge_history(properties.get(MERGED_FROM)).is_none() {
        debug!(absorbed = %absorbed, "merged_from holds a caller value; history not recorded");
        return;
    }
    let mut ids = prior.unwrap_or_default();
    for id in inherited
        .unwrap_or_default()
        .into_iter()
        .chain(std::iter::once(absorbed.to_string()))
    {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    properties.insert(MERGED_FROM.to_string(), PropertyValue::List(ids));
}
