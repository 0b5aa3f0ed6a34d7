//! Node representation in the knowledge graph

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::ops::Deref;
use std::str::FromStr;

/// Unique identifier for a node
///
/// Serializes as a plain string (e.g. "note:ownership" or "tag:rust")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets id-keyed maps be queried with a plain `&str`.
impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

/// Category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Note,
    Article,
    Flashcard,
    Concept,
    Exercise,
    Resource,
    Collection,
    /// Generic tag category, one node per distinct tag value
    Tag,
}

impl NodeType {
    /// Every category, in declaration order
    pub const ALL: [NodeType; 8] = [
        NodeType::Note,
        NodeType::Article,
        NodeType::Flashcard,
        NodeType::Concept,
        NodeType::Exercise,
        NodeType::Resource,
        NodeType::Collection,
        NodeType::Tag,
    ];

    /// Every category that represents a content item (everything but tags)
    pub const CONTENT: [NodeType; 7] = [
        NodeType::Note,
        NodeType::Article,
        NodeType::Flashcard,
        NodeType::Concept,
        NodeType::Exercise,
        NodeType::Resource,
        NodeType::Collection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Note => "NOTE",
            NodeType::Article => "ARTICLE",
            NodeType::Flashcard => "FLASHCARD",
            NodeType::Concept => "CONCEPT",
            NodeType::Exercise => "EXERCISE",
            NodeType::Resource => "RESOURCE",
            NodeType::Collection => "COLLECTION",
            NodeType::Tag => "TAG",
        }
    }

    /// True for content-item categories
    pub fn is_content(&self) -> bool {
        !matches!(self, NodeType::Tag)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category label is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node type: {0}")]
pub struct UnknownNodeType(pub String);

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownNodeType(s.to_string()))
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Float(n)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        PropertyValue::List(items)
    }
}

/// Properties collection
pub type Properties = HashMap<String, PropertyValue>;

/// A node in the knowledge graph
///
/// Identity is by `id` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, immutable once the node is in a graph
    pub id: NodeId,
    /// Display title
    pub title: String,
    /// Category tag
    pub node_type: NodeType,
    /// Open attribute map
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create a new node with no properties
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_type,
            properties: HashMap::new(),
        }
    }

    /// Add a property to the node
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace the whole property map
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// True when every given key/value pair is present on this node
    pub fn matches_properties(&self, wanted: &Properties) -> bool {
        wanted
            .iter()
            .all(|(key, value)| self.properties.get(key) == Some(value))
    }
}
