//! Export/import of whole graphs as interchange documents
//!
//! A document is `{"nodes": [...], "edges": [...]}`, rendered as JSON or YAML.

use super::traits::{StorageError, StorageResult};
use crate::graph::{Graph, GraphDocument};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Interchange encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }

    pub fn render(&self, graph: &Graph) -> StorageResult<String> {
        let document = graph.to_document();
        Ok(match self {
            ExportFormat::Json => serde_json::to_string_pretty(&document)?,
            ExportFormat::Yaml => serde_yaml::to_string(&document)?,
        })
    }

    /// Parse a document without checking graph invariants.
    ///
    /// Syntax errors and missing or mistyped fields are all reported as
    /// [`StorageError::Deserialization`], like structurally invalid graphs.
    pub fn parse(&self, data: &str) -> StorageResult<GraphDocument> {
        let parsed = match self {
            ExportFormat::Json => serde_json::from_str(data).map_err(|e| e.to_string()),
            ExportFormat::Yaml => serde_yaml::from_str(data).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| StorageError::Deserialization(format!("{self} document: {reason}")))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(StorageError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// What an import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub nodes_added: usize,
    pub edges_added: usize,
    /// Nodes whose id already existed (merge mode)
    pub nodes_skipped: usize,
    /// Edges whose triple already existed (merge mode)
    pub edges_skipped: usize,
}

/// Build a graph from a document, failing on anything invalid
pub fn replace_with(document: GraphDocument) -> StorageResult<(Graph, ImportSummary)> {
    let graph = Graph::from_document(document)
        .map_err(|e| StorageError::Deserialization(e.to_string()))?;
    let summary = ImportSummary {
        nodes_added: graph.node_count(),
        edges_added: graph.edge_count(),
        ..ImportSummary::default()
    };
    Ok((graph, summary))
}

/// Merge a document into a copy of `base`.
///
/// Existing nodes and edges win on conflict. An edge whose endpoint is in
/// neither graph fails the whole import and `base` is left as it was.
pub fn merge_into(base: &Graph, document: GraphDocument) -> StorageResult<(Graph, ImportSummary)> {
    let mut graph = base.clone();
    let mut summary = ImportSummary::default();

    for node in document.nodes {
        if graph.add_node(node) {
            summary.nodes_added += 1;
        } else {
            summary.nodes_skipped += 1;
        }
    }

    for edge in document.edges {
        for endpoint in [&edge.source_id, &edge.target_id] {
            if !graph.contains_node(endpoint) {
                return Err(StorageError::Deserialization(format!(
                    "edge {} references missing node {endpoint}",
                    edge.key()
                )));
            }
        }
        if graph.add_edge(edge) {
            summary.edges_added += 1;
        } else {
            summary.edges_skipped += 1;
        }
    }

    Ok((graph, summary))
}
