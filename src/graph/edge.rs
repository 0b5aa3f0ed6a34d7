//! Typed, weighted, directed edges

use super::node::{NodeId, Properties, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of an edge: at most one edge per `(source, target, type)` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub relationship_type: String,
}

impl EdgeKey {
    pub fn new(
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
        }
    }
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.source_id, self.relationship_type, self.target_id
        )
    }
}

/// Default weight of a freshly constructed edge
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub source_id: NodeId,
    /// Target node
    pub target_id: NodeId,
    /// Relationship label (e.g. "PREREQUISITE_OF", "TAGGED_WITH")
    pub relationship_type: String,
    /// Relationship strength, conventionally 0.0 - 1.0
    pub weight: f64,
    /// Additional properties
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    /// Create a new edge with the default weight
    pub fn new(
        source_id: impl Into<NodeId>,
        target_id: impl Into<NodeId>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            weight: DEFAULT_WEIGHT,
            properties: HashMap::new(),
        }
    }

    /// Set the weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Add a property to the edge
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The identity triple of this edge
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source_id: self.source_id.clone(),
            target_id: self.target_id.clone(),
            relationship_type: self.relationship_type.clone(),
        }
    }

    /// True if the edge starts and ends at the same node
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }

    /// The endpoint opposite to `id`, if `id` is one of the endpoints
    pub fn other_end(&self, id: &NodeId) -> Option<&NodeId> {
        if &self.source_id == id {
            Some(&self.target_id)
        } else if &self.target_id == id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}
