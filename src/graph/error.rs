//! Errors raised when graph input would violate the graph invariants

use super::edge::EdgeKey;
use super::node::NodeId;
use thiserror::Error;

/// Structural errors found while building a graph from external data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("duplicate edge: {0}")]
    DuplicateEdge(EdgeKey),

    #[error("edge {edge} references unknown node {node}")]
    MissingEndpoint { edge: EdgeKey, node: NodeId },
}
