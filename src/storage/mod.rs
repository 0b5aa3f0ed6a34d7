//! Storage backends and the catalog sync adapter
//!
//! Graphs persist through the `GraphStore` trait. The primary implementation
//! is `SqliteStore`; `GraphStorage` binds a store to one named graph and adds
//! catalog synchronization and interchange export/import on top.

mod graph_storage;
mod interchange;
mod sqlite;
mod sync;
mod traits;

pub use graph_storage::GraphStorage;
pub use interchange::{merge_into, replace_with, ExportFormat, ImportSummary};
pub use sqlite::SqliteStore;
pub use sync::{build_from_catalog, tag_node_id};
pub use traits::{GraphStore, NodeFilter, OpenStore, StorageError, StorageResult};
