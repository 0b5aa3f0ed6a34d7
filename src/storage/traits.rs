//! Storage trait definitions

use crate::catalog::CatalogError;
use crate::graph::{Graph, Node, NodeType, Properties, PropertyValue};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Stored or imported data does not form a valid graph
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Synchronization cancelled")]
    Cancelled,

    #[error("Synchronization timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for querying nodes
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Filter by category
    pub node_type: Option<NodeType>,
    /// Every pair must be present with an equal value
    pub properties: Properties,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.node_type.map_or(true, |t| node.node_type == t) && node.matches_properties(&self.properties)
    }
}

/// Trait for graph storage backends
///
/// Graphs are stored whole under a name. Implementations must be thread-safe
/// (Send + Sync) so an engine can share one store across threads.
pub trait GraphStore: Send + Sync {
    /// Replace everything stored under `name` with `graph`, atomically
    fn save_graph(&self, name: &str, graph: &Graph) -> StorageResult<()>;

    /// Load a graph; `None` if it was never saved
    fn load_graph(&self, name: &str) -> StorageResult<Option<Graph>>;

    /// Nodes of a stored graph matching the filter, in insertion order
    fn find_nodes(&self, name: &str, filter: &NodeFilter) -> StorageResult<Vec<Node>>;

    /// Delete a graph and all its nodes/edges
    fn delete_graph(&self, name: &str) -> StorageResult<bool>;

    /// Names of all stored graphs
    fn list_graphs(&self) -> StorageResult<Vec<String>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
