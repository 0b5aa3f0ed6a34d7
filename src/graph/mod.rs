//! Core graph data structures

mod knowledge;
mod edge;
mod error;
mod node;


pub use knowledge::{Graph, GraphDocument};
pub use edge::{Edge, EdgeKey, DEFAULT_WEIGHT};
pub use error::GraphError;
pub use node::{Node, NodeId, NodeType, Properties, PropertyValue, UnknownNodeType};
