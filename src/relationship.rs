//! Relationship-type registry
//!
//! Holds the constraint table for relationship labels: which category pairs a
//! label may connect, whether it is symmetric or transitive, and which weight
//! range it accepts. The table starts with the built-in types and is open to
//! runtime registration; registration order is kept because it breaks ties
//! when suggesting a type for a category pair.

use crate::config::RelationshipSettings;
use crate::graph::NodeType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const PREREQUISITE_OF: &str = "PREREQUISITE_OF";
pub const BUILDS_ON: &str = "BUILDS_ON";
pub const EXPLAINS: &str = "EXPLAINS";
pub const EXAMPLE_OF: &str = "EXAMPLE_OF";
pub const PART_OF: &str = "PART_OF";
pub const REFERENCES: &str = "REFERENCES";
pub const TAGGED_WITH: &str = "TAGGED_WITH";
pub const RELATED_TO: &str = "RELATED_TO";

/// Relationship types that express learning order
pub const LEARNING_RELATIONSHIPS: [&str; 2] = [PREREQUISITE_OF, BUILDS_ON];

/// Errors raised when registering a relationship type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelationshipError {
    #[error("relationship type name must not be empty")]
    EmptyName,

    #[error("invalid weight range for {name}: ({min}, {max})")]
    InvalidWeightRange { name: String, min: f64, max: f64 },
}

fn full_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Configuration of one relationship type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    /// Symmetric: a legal pair is legal in either orientation
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub transitive: bool,
    /// Accepted weights, inclusive
    #[serde(default = "full_range")]
    pub weight_range: (f64, f64),
    #[serde(default)]
    pub description: String,
    /// Label of the same relation read from target to source
    #[serde(default)]
    pub reverse_name: Option<String>,
    /// Allowed source categories; `None` allows any
    #[serde(default)]
    pub source_types: Option<Vec<NodeType>>,
    /// Allowed target categories; `None` allows any
    #[serde(default)]
    pub target_types: Option<Vec<NodeType>>,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            bidirectional: false,
            transitive: false,
            weight_range: full_range(),
            description: String::new(),
            reverse_name: None,
            source_types: None,
            target_types: None,
        }
    }
}

impl RelationshipConfig {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    pub fn with_weight_range(mut self, min: f64, max: f64) -> Self {
        self.weight_range = (min, max);
        self
    }

    pub fn with_reverse_name(mut self, reverse: impl Into<String>) -> Self {
        self.reverse_name = Some(reverse.into());
        self
    }

    pub fn with_sources(mut self, types: &[NodeType]) -> Self {
        self.source_types = Some(types.to_vec());
        self
    }

    pub fn with_targets(mut self, types: &[NodeType]) -> Self {
        self.target_types = Some(types.to_vec());
        self
    }

    /// Whether this type may connect `source` to `target`
    pub fn allows(&self, source: NodeType, target: NodeType) -> bool {
        self.allows_directed(source, target)
            || (self.bidirectional && self.allows_directed(target, source))
    }

    fn allows_directed(&self, source: NodeType, target: NodeType) -> bool {
        let source_ok = self
            .source_types
            .as_ref()
            .map_or(true, |types| types.contains(&source));
        let target_ok = self
            .target_types
            .as_ref()
            .map_or(true, |types| types.contains(&target));
        source_ok && target_ok
    }

    /// Whether `weight` is inside both this type's range and [0, 1]
    pub fn accepts_weight(&self, weight: f64) -> bool {
        let (min, max) = self.weight_range;
        weight.is_finite() && (0.0..=1.0).contains(&weight) && weight >= min && weight <= max
    }

    /// Weight used when a caller does not supply one
    pub fn default_weight(&self) -> f64 {
        self.weight_range.1
    }

    /// Number of (source, target) category pairs this rule admits
    fn pair_count(&self) -> usize {
        let all = NodeType::ALL.len();
        let sources = self.source_types.as_ref().map_or(all, Vec::len);
        let targets = self.target_types.as_ref().map_or(all, Vec::len);
        (sources * targets).max(1)
    }

    fn validate(&self, name: &str) -> Result<(), RelationshipError> {
        let (min, max) = self.weight_range;
        let in_unit = |w: f64| w.is_finite() && (0.0..=1.0).contains(&w);
        if !in_unit(min) || !in_unit(max) || min > max {
            return Err(RelationshipError::InvalidWeightRange {
                name: name.to_string(),
                min,
                max,
            });
        }
        Ok(())
    }
}

/// Registry of relationship types and their constraints
#[derive(Debug, Clone)]
pub struct RelationshipManager {
    rules: IndexMap<String, RelationshipConfig>,
    restricted: HashSet<String>,
    strict: bool,
}

impl Default for RelationshipManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipManager {
    /// Create a registry holding the built-in relationship types
    pub fn new() -> Self {
        let content = &NodeType::CONTENT;
        let mut rules = IndexMap::new();

        rules.insert(
            PREREQUISITE_OF.to_string(),
            RelationshipConfig::new("source must be learned before target")
                .transitive()
                .with_weight_range(0.5, 1.0)
                .with_reverse_name("REQUIRES")
                .with_sources(content)
                .with_targets(content),
        );
        rules.insert(
            BUILDS_ON.to_string(),
            RelationshipConfig::new("source extends ideas introduced by target")
                .transitive()
                .with_weight_range(0.3, 1.0)
                .with_reverse_name("FOUNDATION_FOR")
                .with_sources(content)
                .with_targets(content),
        );
        rules.insert(
            EXPLAINS.to_string(),
            RelationshipConfig::new("source explains the target")
                .with_weight_range(0.3, 1.0)
                .with_reverse_name("EXPLAINED_BY")
                .with_sources(&[NodeType::Note, NodeType::Article, NodeType::Resource])
                .with_targets(&[NodeType::Concept, NodeType::Flashcard, NodeType::Exercise]),
        );
        rules.insert(
            EXAMPLE_OF.to_string(),
            RelationshipConfig::new("source is a worked example of the target concept")
                .with_weight_range(0.3, 1.0)
                .with_reverse_name("HAS_EXAMPLE")
                .with_sources(&[NodeType::Exercise, NodeType::Note, NodeType::Flashcard])
                .with_targets(&[NodeType::Concept]),
        );
        rules.insert(
            PART_OF.to_string(),
            RelationshipConfig::new("source belongs to the target collection")
                .transitive()
                .with_weight_range(0.5, 1.0)
                .with_reverse_name("CONTAINS")
                .with_sources(content)
                .with_targets(&[NodeType::Collection]),
        );
        rules.insert(
            REFERENCES.to_string(),
            RelationshipConfig::new("source cites the target")
                .with_weight_range(0.1, 1.0)
                .with_reverse_name("REFERENCED_BY")
                .with_sources(content)
                .with_targets(&[NodeType::Article, NodeType::Resource]),
        );
        rules.insert(
            TAGGED_WITH.to_string(),
            RelationshipConfig::new("source carries the target tag")
                .with_reverse_name("TAGS")
                .with_sources(content)
                .with_targets(&[NodeType::Tag]),
        );
        rules.insert(
            RELATED_TO.to_string(),
            RelationshipConfig::new("loosely related content")
                .bidirectional()
                .with_reverse_name(RELATED_TO),
        );

        Self {
            rules,
            restricted: HashSet::new(),
            strict: false,
        }
    }

    /// Build a registry from configuration: built-ins plus custom types
    pub fn from_settings(settings: &RelationshipSettings) -> Result<Self, RelationshipError> {
        let mut manager = Self::new().with_strict(settings.strict);
        for name in &settings.restricted {
            manager.restrict(name.clone());
        }
        for (name, config) in &settings.custom {
            manager.register_custom_relationship(name.clone(), config.clone())?;
        }
        Ok(manager)
    }

    /// In strict mode unknown relationship types are rejected
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Forbid a relationship label outright, known or not
    pub fn restrict(&mut self, name: impl Into<String>) {
        self.restricted.insert(name.into());
    }

    /// Check a relationship type against its category constraints
    pub fn validate_relationship(
        &self,
        source_type: NodeType,
        target_type: NodeType,
        relationship_type: &str,
    ) -> bool {
        if self.restricted.contains(relationship_type) {
            return false;
        }
        match self.rules.get(relationship_type) {
            Some(rule) => rule.allows(source_type, target_type),
            None => !self.strict,
        }
    }

    /// Rank the registered types that accept this category pair
    ///
    /// Confidence blends how specific a rule is (fewer admitted pairs scores
    /// higher) with how many rules accept the pair. Sorted descending; ties
    /// keep registration order.
    pub fn suggest_relationship_type(
        &self,
        source_type: NodeType,
        target_type: NodeType,
    ) -> Vec<(String, f64)> {
        let candidates: Vec<(&String, &RelationshipConfig)> = self
            .rules
            .iter()
            .filter(|(name, rule)| {
                !self.restricted.contains(name.as_str()) && rule.allows(source_type, target_type)
            })
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let max_specificity = self
            .rules
            .values()
            .map(|rule| 1.0 / rule.pair_count() as f64)
            .fold(0.0_f64, f64::max);
        let commonness = candidates.len() as f64 / self.rules.len() as f64;

        let mut ranked: Vec<(String, f64)> = candidates
            .into_iter()
            .map(|(name, rule)| {
                let specificity = (1.0 / rule.pair_count() as f64) / max_specificity;
                (name.clone(), 0.6 * specificity + 0.4 * commonness)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Add or replace a relationship type
    pub fn register_custom_relationship(
        &mut self,
        name: impl Into<String>,
        config: RelationshipConfig,
    ) -> Result<(), RelationshipError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RelationshipError::EmptyName);
        }
        config.validate(&name)?;
        tracing::debug!(relationship = %name, "registered relationship type");
        self.rules.insert(name, config);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RelationshipConfig> {
        self.rules.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn is_bidirectional(&self, name: &str) -> bool {
        self.rules.get(name).is_some_and(|r| r.bidirectional)
    }

    pub fn is_transitive(&self, name: &str) -> bool {
        self.rules.get(name).is_some_and(|r| r.transitive)
    }

    pub fn reverse_name(&self, name: &str) -> Option<&str> {
        self.rules.get(name).and_then(|r| r.reverse_name.as_deref())
    }

    /// Default weight for a type; 1.0 for unregistered types
    pub fn default_weight(&self, name: &str) -> f64 {
        self.rules
            .get(name)
            .map_or(crate::graph::DEFAULT_WEIGHT, RelationshipConfig::default_weight)
    }

    /// Whether a weight is acceptable for this type
    pub fn accepts_weight(&self, name: &str, weight: f64) -> bool {
        match self.rules.get(name) {
            Some(rule) => rule.accepts_weight(weight),
            None => weight.is_finite() && (0.0..=1.0).contains(&weight),
        }
    }

    /// Registered type names in registration order
    pub fn relationship_types(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}
