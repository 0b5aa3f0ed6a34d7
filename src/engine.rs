//! KnowledgeEngine: shared access to named graphs
//!
//! A `Graph` is single-owner. The engine is the layer that lets many threads
//! work with many graphs: graphs sit in a sharded map (one writer per graph
//! at a time, readers of other graphs unaffected), writes go through to the
//! store when one is attached, and the relationship registry is shared
//! behind a reader-writer lock.

use crate::cancel::CancellationToken;
use crate::catalog::{ContentCatalog, SyncReport};
use crate::config::{ConfigError, EngineConfig, SyncConfig};
use crate::graph::Graph;
use crate::operations::GraphOperations;
use crate::relationship::{RelationshipConfig, RelationshipError, RelationshipManager};
use crate::storage::{build_from_catalog, GraphStore, OpenStore, SqliteStore, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur in engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Relationship error: {0}")]
    Relationship(#[from] RelationshipError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Relationship registry lock poisoned")]
    LockPoisoned,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Named graphs, an optional backing store and the relationship registry
pub struct KnowledgeEngine {
    graphs: DashMap<String, Graph>,
    store: Option<Arc<dyn GraphStore>>,
    relationships: RwLock<RelationshipManager>,
}

impl Default for KnowledgeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeEngine {
    /// In-memory engine with the built-in relationship types
    pub fn new() -> Self {
        Self {
            graphs: DashMap::new(),
            store: None,
            relationships: RwLock::new(RelationshipManager::new()),
        }
    }

    /// Engine whose writes persist to `store`
    pub fn with_store(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new()
        }
    }

    pub fn with_relationships(self, relationships: RelationshipManager) -> Self {
        Self {
            relationships: RwLock::new(relationships),
            ..self
        }
    }

    /// SQLite-backed engine with the configured relationship registry
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let store = SqliteStore::open(config.database_path())?;
        let relationships = RelationshipManager::from_settings(&config.relationships)?;
        Ok(Self::with_store(Arc::new(store)).with_relationships(relationships))
    }

    /// Pull every stored graph into memory. Returns how many were loaded.
    pub fn load_all(&self) -> EngineResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let mut loaded = 0;
        for name in store.list_graphs()? {
            if let Some(graph) = store.load_graph(&name)? {
                self.graphs.insert(name, graph);
                loaded += 1;
            }
        }
        info!(graphs = loaded, "loaded stored graphs");
        Ok(loaded)
    }

    /// Snapshot of a graph
    pub fn get_graph(&self, name: &str) -> Option<Graph> {
        self.graphs.get(name).map(|r| r.clone())
    }

    /// Create or replace a graph, persisting it first when a store is attached.
    ///
    /// The graph's map entry stays locked across the save and the swap, so
    /// store and memory see writers to one graph in the same order.
    pub fn upsert_graph(&self, name: impl Into<String>, graph: Graph) -> EngineResult<()> {
        let entry = self.graphs.entry(name.into());
        if let Some(store) = &self.store {
            store.save_graph(entry.key(), &graph)?;
        }
        entry.insert(graph);
        Ok(())
    }

    /// Remove a graph from memory and from the store
    pub fn remove_graph(&self, name: &str) -> EngineResult<Option<Graph>> {
        let entry = self.graphs.entry(name.to_string());
        if let Some(store) = &self.store {
            store.delete_graph(name)?;
        }
        Ok(match entry {
            Entry::Occupied(occupied) => Some(occupied.remove()),
            Entry::Vacant(_) => None,
        })
    }

    /// Names of graphs held in memory, sorted
    pub fn list_graphs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.graphs.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn has_graph(&self, name: &str) -> bool {
        self.graphs.contains_key(name)
    }

    /// Run a read-only closure against a graph without cloning it
    pub fn read<R>(&self, name: &str, f: impl FnOnce(&Graph) -> R) -> EngineResult<R> {
        let graph = self
            .graphs
            .get(name)
            .ok_or_else(|| EngineError::GraphNotFound(name.to_string()))?;
        Ok(f(&graph))
    }

    /// Run validated mutations against a graph.
    ///
    /// The closure works on a copy. The copy is persisted and then swapped
    /// in, so if saving fails neither memory nor store changes. Other
    /// writers to the same graph wait for the swap.
    pub fn mutate<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut GraphOperations<'_>) -> R,
    ) -> EngineResult<R> {
        let mut entry = self
            .graphs
            .get_mut(name)
            .ok_or_else(|| EngineError::GraphNotFound(name.to_string()))?;
        let relationships = self
            .relationships
            .read()
            .map_err(|_| EngineError::LockPoisoned)?;

        let mut working = entry.clone();
        let result = {
            let mut ops = GraphOperations::new(&mut working, &relationships);
            f(&mut ops)
        };

        if let Some(store) = &self.store {
            store.save_graph(name, &working)?;
        }
        *entry = working;
        debug!(graph = name, "graph mutated");
        Ok(result)
    }

    /// Register (or replace) a relationship type for every graph
    pub fn register_relationship(
        &self,
        name: impl Into<String>,
        config: RelationshipConfig,
    ) -> EngineResult<()> {
        let mut relationships = self
            .relationships
            .write()
            .map_err(|_| EngineError::LockPoisoned)?;
        relationships.register_custom_relationship(name, config)?;
        Ok(())
    }

    /// Read access to the relationship registry
    pub fn relationships<R>(&self, f: impl FnOnce(&RelationshipManager) -> R) -> EngineResult<R> {
        let relationships = self
            .relationships
            .read()
            .map_err(|_| EngineError::LockPoisoned)?;
        Ok(f(&relationships))
    }

    /// Rebuild a graph from a catalog and swap it in.
    ///
    /// Nothing changes if the run is cancelled or times out.
    pub fn sync_with_catalog(
        &self,
        name: &str,
        catalog: &dyn ContentCatalog,
        config: &SyncConfig,
        cancel: &CancellationToken,
    ) -> EngineResult<SyncReport> {
        let cancel = cancel.clone().with_optional_timeout(config.timeout());
        let (graph, report) = build_from_catalog(catalog, config, &cancel)?;
        self.upsert_graph(name, graph)?;
        Ok(report)
    }
}
