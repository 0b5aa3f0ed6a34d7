//! External content catalog
//!
//! The catalog is the authoritative source of content items. The engine only
//! reads from it: synchronization enumerates item ids, fetches each item and
//! rebuilds the graph from what it finds.

use crate::graph::Properties;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog item not found: {0}")]
    NotFound(String),

    #[error("catalog item {id} is unreadable: {reason}")]
    Unreadable { id: String, reason: String },

    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One content item as the catalog describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    /// Category label, e.g. `"note"` or `"Concept"`.
    pub content_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of other items this one connects to.
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content_type: content_type.into(),
            tags: Vec::new(),
            connections: Vec::new(),
            properties: Properties::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_connections<I, S>(mut self, connections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connections.extend(connections.into_iter().map(Into::into));
        self
    }
}

/// Outcome of one synchronization run.
///
/// Partial success is normal: unreadable items are recorded in `failures`
/// and the rest of the catalog is still synced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub items_synced: usize,
    pub tags_created: usize,
    pub edges_created: usize,
    /// Connections naming an item that was not synced
    pub skipped_connections: usize,
    /// `(item id, reason)` for every item that was skipped
    pub failures: Vec<(String, String)>,
}

impl SyncReport {
    /// True if every catalog item made it into the graph
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read access to the authoritative content store.
///
/// `item_ids` failing aborts a sync; `fetch_item` failing skips that item.
pub trait ContentCatalog {
    fn item_ids(&self) -> Result<Vec<String>, CatalogError>;
    fn fetch_item(&self, id: &str) -> Result<CatalogItem, CatalogError>;
}

/// Catalog held in memory, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: IndexMap<String, Result<CatalogItem, String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: CatalogItem) {
        self.entries.insert(item.id.clone(), Ok(item));
    }

    pub fn with_item(mut self, item: CatalogItem) -> Self {
        self.insert(item);
        self
    }

    /// Register an id whose fetch fails with `reason`
    pub fn insert_unreadable(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        self.entries.insert(id.into(), Err(reason.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentCatalog for InMemoryCatalog {
    fn item_ids(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn fetch_item(&self, id: &str) -> Result<CatalogItem, CatalogError> {
        match self.entries.get(id) {
            Some(Ok(item)) => Ok(item.clone()),
            Some(Err(reason)) => Err(CatalogError::Unreadable {
                id: id.to_string(),
                reason: reason.clone(),
            }),
            None => Err(CatalogError::NotFound(id.to_string())),
        }
    }
}

/// Catalog backed by a JSON array of items.
///
/// Entries are decoded lazily, so one malformed record only fails its own
/// fetch. An entry without a string `id` is listed as `#<index>`. A repeated
/// id is listed again, in file order, and fetches the first entry with that
/// id; sync then reports the repeat as a duplicate.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    listing: Vec<String>,
    entries: IndexMap<String, serde_json::Value>,
}

impl JsonFileCatalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(text)?;
        let mut listing = Vec::with_capacity(values.len());
        let mut entries = IndexMap::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let id = value
                .get("id")
                .and_then(|id| id.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{index}"));
            listing.push(id.clone());
            entries.entry(id).or_insert(value);
        }
        Ok(Self { listing, entries })
    }
}

impl ContentCatalog for JsonFileCatalog {
    fn item_ids(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.listing.clone())
    }

    fn fetch_item(&self, id: &str) -> Result<CatalogItem, CatalogError> {
        let value = self
            .entries
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|e| CatalogError::Unreadable {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}
