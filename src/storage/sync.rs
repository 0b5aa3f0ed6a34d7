//! Rebuilding a graph from the content catalog
//!
//! The graph is built from scratch off to the side. Nothing is written until
//! the whole catalog has been walked, so a cancelled or timed-out run leaves
//! the stored graph untouched.

use super::traits::{StorageError, StorageResult};
use crate::cancel::{CancellationToken, StopReason};
use crate::catalog::{CatalogItem, ContentCatalog, SyncReport};
use crate::config::SyncConfig;
use crate::graph::{Edge, Graph, Node, NodeType};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Node id for a tag label: `tag:` plus the lowercased, trimmed label
pub fn tag_node_id(tag: &str) -> String {
    format!("tag:{}", tag.trim().to_lowercase())
}

/// Build a fresh graph from every readable catalog item.
///
/// Content nodes come first in catalog order, then tag nodes, then edges.
/// The token is asked before each item whether to stop; a token whose
/// deadline already passed aborts before the first fetch.
///
/// A content item whose id is also some tag's node id wins the id. That tag
/// gets no node and no edges, and the clash is recorded as a failure.
pub fn build_from_catalog(
    catalog: &dyn ContentCatalog,
    config: &SyncConfig,
    cancel: &CancellationToken,
) -> StorageResult<(Graph, SyncReport)> {
    config.validate().map_err(StorageError::InvalidConfig)?;

    let started = Instant::now();
    let ids = catalog.item_ids()?;
    debug!(items = ids.len(), "catalog enumerated");

    let mut graph = Graph::new();
    let mut report = SyncReport::default();
    let mut synced: Vec<CatalogItem> = Vec::new();

    for id in ids {
        if let Some(reason) = cancel.stop_reason() {
            info!(processed = synced.len(), ?reason, "sync stopped early");
            return Err(match reason {
                StopReason::Cancelled => StorageError::Cancelled,
                StopReason::TimedOut(budget) => StorageError::Timeout(budget),
            });
        }

        let item = match catalog.fetch_item(&id) {
            Ok(item) => item,
            Err(e) => {
                warn!(item = %id, error = %e, "skipping unreadable catalog item");
                report.failures.push((id, e.to_string()));
                continue;
            }
        };

        let node_type: NodeType = match item.content_type.parse() {
            Ok(t) => t,
            Err(e) => {
                warn!(item = %id, error = %e, "skipping catalog item");
                report.failures.push((id, format!("{e}")));
                continue;
            }
        };

        let node = Node::new(item.id.as_str(), item.title.as_str(), node_type)
            .with_properties(item.properties.clone());
        if !graph.add_node(node) {
            warn!(item = %item.id, "skipping duplicate catalog item");
            report.failures.push((id, format!("duplicate item id {}", item.id)));
            continue;
        }
        synced.push(item);
    }
    report.items_synced = synced.len();

    let mut clashing_tags: HashSet<String> = HashSet::new();
    for item in &synced {
        for tag in &item.tags {
            let label = tag.trim();
            if label.is_empty() {
                continue;
            }
            let tag_id = tag_node_id(label);
            match graph.get_node(&tag_id).map(|node| node.node_type) {
                Some(NodeType::Tag) => {}
                Some(other) => {
                    if clashing_tags.insert(tag_id.clone()) {
                        warn!(tag = %tag_id, node_type = %other, "tag id taken by a content item");
                        report.failures.push((
                            tag_id.clone(),
                            format!("tag '{label}' collides with a {other} item of the same id"),
                        ));
                    }
                    continue;
                }
                None => {
                    graph.add_node(Node::new(tag_id.as_str(), label, NodeType::Tag));
                    report.tags_created += 1;
                }
            }
            let edge = Edge::new(item.id.as_str(), tag_id, config.tag_relationship.as_str())
                .with_weight(config.tag_weight);
            if graph.add_edge(edge) {
                report.edges_created += 1;
            }
        }
    }

    let synced_ids: HashSet<&str> = synced.iter().map(|item| item.id.as_str()).collect();
    for item in &synced {
        for target in &item.connections {
            if target == &item.id || !synced_ids.contains(target.as_str()) {
                debug!(item = %item.id, connection = %target, "skipping connection");
                report.skipped_connections += 1;
                continue;
            }
            let edge = Edge::new(
                item.id.as_str(),
                target.as_str(),
                config.connection_relationship.as_str(),
            )
            .with_weight(config.connection_weight);
            if graph.add_edge(edge) {
                report.edges_created += 1;
            }
        }
    }

    info!(
        items = report.items_synced,
        tags = report.tags_created,
        edges = report.edges_created,
        failures = report.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "catalog graph built"
    );
    Ok((graph, report))
}
