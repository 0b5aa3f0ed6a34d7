//! Engine configuration
//!
//! [`EngineConfig`] loads from a YAML file; every section has defaults, so an
//! empty file (or no file) is a valid configuration.
//!
//! # Loading priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `KNOWGRAPH_CONFIG` env var
//! 3. `<config dir>/knowgraph/config.yaml`, when it exists
//! 4. Built-in defaults

use crate::algorithms::PageRankConfig;
use crate::relationship::{RelationshipConfig, RELATED_TO, TAGGED_WITH};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "KNOWGRAPH_CONFIG";
pub const DEFAULT_GRAPH_NAME: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database file; `None` means [`default_db_path`].
    pub database_path: Option<PathBuf>,
    /// Graph the CLI operates on unless `--graph` says otherwise.
    pub graph_name: String,
    pub pagerank: PageRankConfig,
    pub sync: SyncConfig,
    pub relationships: RelationshipSettings,
}

/// How a catalog is turned into graph edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Abort a sync that runs longer than this.
    pub timeout_secs: Option<u64>,
    pub tag_relationship: String,
    pub tag_weight: f64,
    pub connection_relationship: String,
    pub connection_weight: f64,
}

/// Relationship registry settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipSettings {
    /// Reject relationship types that are not registered.
    pub strict: bool,
    /// Types that never validate.
    pub restricted: Vec<String>,
    /// Extra types, registered after the built-ins in file order.
    pub custom: IndexMap<String, RelationshipConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            graph_name: DEFAULT_GRAPH_NAME.to_string(),
            pagerank: PageRankConfig::default(),
            sync: SyncConfig::default(),
            relationships: RelationshipSettings::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            tag_relationship: TAGGED_WITH.to_string(),
            tag_weight: 1.0,
            connection_relationship: RELATED_TO.to_string(),
            connection_weight: 1.0,
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Both edge weights must lie in [0, 1] and the relationship names must
    /// be non-blank. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        for (field, weight) in [
            ("tag_weight", self.tag_weight),
            ("connection_weight", self.connection_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("{field} must be within [0, 1], got {weight}"));
            }
        }
        for (field, name) in [
            ("tag_relationship", &self.tag_relationship),
            ("connection_relationship", &self.connection_relationship),
        ] {
            if name.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load configuration following the loading priority above.
    ///
    /// An explicit path must exist; the env var and default locations are
    /// skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::resolve_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Env var, then the per-user config directory.
    pub fn resolve_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("knowgraph").join("config.yaml"))
    }

    /// Configured database path, or the per-user default.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_db_path)
    }
}

/// `<data dir>/knowgraph/knowgraph.db`
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("knowgraph").join("knowgraph.db")
}
