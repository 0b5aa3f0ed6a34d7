//! One named graph bound to a store

use super::interchange::{self, ExportFormat, ImportSummary};
use super::sqlite::SqliteStore;
use super::sync::build_from_catalog;
use super::traits::{GraphStore, NodeFilter, OpenStore, StorageResult};
use crate::cancel::CancellationToken;
use crate::catalog::{ContentCatalog, SyncReport};
use crate::config::SyncConfig;
use crate::graph::{Graph, Node, NodeType, Properties};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Persistence adapter for a single graph.
///
/// Every write replaces the stored graph atomically; a failure at any point
/// leaves the previously stored state in place.
#[derive(Clone)]
pub struct GraphStorage {
    store: Arc<dyn GraphStore>,
    graph_name: String,
    sync: SyncConfig,
}

impl GraphStorage {
    pub fn new(store: Arc<dyn GraphStore>, graph_name: impl Into<String>) -> Self {
        Self {
            store,
            graph_name: graph_name.into(),
            sync: SyncConfig::default(),
        }
    }

    /// Open (or create) a SQLite database at `path`
    pub fn open(path: impl AsRef<Path>, graph_name: impl Into<String>) -> StorageResult<Self> {
        Ok(Self::new(Arc::new(SqliteStore::open(path)?), graph_name))
    }

    pub fn with_sync_config(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn save_graph(&self, graph: &Graph) -> StorageResult<()> {
        self.store.save_graph(&self.graph_name, graph)
    }

    /// The stored graph, or an empty graph if none was saved yet
    pub fn load_graph(&self) -> StorageResult<Graph> {
        Ok(self.store.load_graph(&self.graph_name)?.unwrap_or_default())
    }

    /// Rebuild the stored graph from the catalog.
    ///
    /// The new graph replaces the old one only after the whole catalog has
    /// been read; cancellation or timeout returns an error with nothing
    /// written.
    pub fn sync_with_catalog(
        &self,
        catalog: &dyn ContentCatalog,
        cancel: &CancellationToken,
    ) -> StorageResult<SyncReport> {
        let cancel = cancel.clone().with_optional_timeout(self.sync.timeout());
        let (graph, report) = build_from_catalog(catalog, &self.sync, &cancel)?;
        self.save_graph(&graph)?;
        info!(
            graph = %self.graph_name,
            items = report.items_synced,
            complete = report.is_complete(),
            "synchronized with catalog"
        );
        Ok(report)
    }

    /// Stored nodes with the given category and/or exact property values
    pub fn query_nodes(
        &self,
        node_type: Option<NodeType>,
        properties: Option<&Properties>,
    ) -> StorageResult<Vec<Node>> {
        let mut filter = NodeFilter::new();
        filter.node_type = node_type;
        if let Some(properties) = properties {
            filter = filter.with_properties(properties.clone());
        }
        self.store.find_nodes(&self.graph_name, &filter)
    }

    pub fn export_graph(&self, format: ExportFormat) -> StorageResult<String> {
        format.render(&self.load_graph()?)
    }

    /// Import a document.
    ///
    /// With `merge` the document is folded into the stored graph (existing
    /// data wins); otherwise it replaces the stored graph and must be valid
    /// on its own.
    pub fn import_graph(
        &self,
        data: &str,
        format: ExportFormat,
        merge: bool,
    ) -> StorageResult<ImportSummary> {
        let document = format.parse(data)?;
        let (graph, summary) = if merge {
            interchange::merge_into(&self.load_graph()?, document)?
        } else {
            interchange::replace_with(document)?
        };
        self.save_graph(&graph)?;
        info!(
            graph = %self.graph_name,
            merge,
            nodes_added = summary.nodes_added,
            edges_added = summary.edges_added,
            "imported graph"
        );
        Ok(summary)
    }
}
