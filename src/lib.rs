//! Knowgraph: typed, weighted knowledge graph engine
//!
//! Models curated learning content (notes, articles, flashcards, concepts,
//! exercises, resources, collections and tags) as a directed, weighted graph
//! and provides the operations a study tool needs on top of it.
//!
//! # Core Concepts
//!
//! - **Graph**: insertion-ordered nodes and `(source, target, type)`-keyed edges
//! - **RelationshipManager**: which relationship types may join which node types
//! - **GraphOperations**: validated mutations, node merging, link suggestions
//! - **GraphAlgorithms** / **GraphTraversal**: analytics and learning paths
//! - **GraphStorage**: SQLite persistence, catalog sync, JSON/YAML interchange
//! - **KnowledgeEngine**: named graphs shared across threads
//!
//! # Example
//!
//! ```
//! use knowgraph::{Graph, GraphOperations, GraphTraversal, NodeType, Properties, RelationshipManager};
//!
//! let mut graph = Graph::new();
//! let relationships = RelationshipManager::new();
//! let mut ops = GraphOperations::new(&mut graph, &relationships);
//! ops.add_content_node("basics", "Ownership", NodeType::Concept, Properties::new());
//! ops.add_content_node("next", "Borrowing", NodeType::Concept, Properties::new());
//! assert!(ops.create_relationship("basics", "next", "PREREQUISITE_OF", None));
//!
//! let path = GraphTraversal::new(&graph).get_learning_path("basics", "next").unwrap();
//! assert_eq!(path.len(), 2);
//! ```

pub mod algorithms;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod engine;
mod graph;
pub mod operations;
pub mod relationship;
pub mod storage;
pub mod traversal;

pub use algorithms::{GraphAlgorithms, GraphStats, PageRankConfig};
pub use cancel::{CancellationToken, StopReason};
pub use catalog::{CatalogError, CatalogItem, ContentCatalog, InMemoryCatalog, JsonFileCatalog, SyncReport};
pub use config::{ConfigError, EngineConfig, RelationshipSettings, SyncConfig};
pub use engine::{EngineError, EngineResult, KnowledgeEngine};
pub use graph::{
    Edge, EdgeKey, Graph, GraphDocument, GraphError, Node, NodeId, NodeType, Properties,
    PropertyValue, UnknownNodeType, DEFAULT_WEIGHT,
};
pub use operations::{GraphOperations, PropertyMerge};
pub use relationship::{RelationshipConfig, RelationshipError, RelationshipManager};
pub use storage::{
    ExportFormat, GraphStorage, GraphStore, ImportSummary, NodeFilter, OpenStore, SqliteStore,
    StorageError, StorageResult,
};
pub use traversal::{GraphTraversal, NextNodeSuggestion};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
