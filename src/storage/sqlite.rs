//! SQLite storage backend

use super::traits::{GraphStore, NodeFilter, OpenStore, StorageError, StorageResult};
use crate::graph::{Edge, EdgeKey, Graph, GraphDocument, Node, NodeId, NodeType, Properties};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite-backed graph store
///
/// Uses a single SQLite database file with tables for graphs, nodes, and edges.
/// Thread-safe via internal mutex on the connection. A `position` column
/// keeps insertion order across a save/load cycle.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS graphs (
                name TEXT PRIMARY KEY,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS nodes (
                graph TEXT NOT NULL,
                id TEXT NOT NULL,
                position INTEGER NOT NULL,
                title TEXT NOT NULL,
                node_type TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                PRIMARY KEY (graph, id),
                FOREIGN KEY (graph) REFERENCES graphs(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_type
                ON nodes(graph, node_type);

            CREATE TABLE IF NOT EXISTS edges (
                graph TEXT NOT NULL,
                position INTEGER NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                weight REAL NOT NULL,
                properties_json TEXT NOT NULL,
                PRIMARY KEY (graph, source_id, target_id, relationship_type),
                FOREIGN KEY (graph) REFERENCES graphs(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_edges_source
                ON edges(graph, source_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target
                ON edges(graph, target_id);

            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// When the named graph was last saved
    pub fn updated_at(&self, name: &str) -> StorageResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let stamp: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM graphs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        stamp
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| StorageError::Deserialization(format!("updated_at for {name}: {e}")))
            })
            .transpose()
    }

    fn row_to_node(
        id: String,
        title: String,
        node_type: String,
        properties_json: String,
    ) -> StorageResult<Node> {
        let node_type: NodeType = node_type
            .parse()
            .map_err(|e| StorageError::Deserialization(format!("node {id}: {e}")))?;
        let properties: Properties = serde_json::from_str(&properties_json)
            .map_err(|e| StorageError::Deserialization(format!("node {id} properties: {e}")))?;

        Ok(Node {
            id: NodeId::from_string(id),
            title,
            node_type,
            properties,
        })
    }

    fn row_to_edge(
        source_id: String,
        target_id: String,
        relationship_type: String,
        weight: f64,
        properties_json: String,
    ) -> StorageResult<Edge> {
        let properties: Properties = serde_json::from_str(&properties_json).map_err(|e| {
            let key = EdgeKey::new(source_id.as_str(), target_id.as_str(), relationship_type.as_str());
            StorageError::Deserialization(format!("edge {key} properties: {e}"))
        })?;

        Ok(Edge {
            source_id: NodeId::from_string(source_id),
            target_id: NodeId::from_string(target_id),
            relationship_type,
            weight,
            properties,
        })
    }

    fn load_nodes(conn: &Connection, name: &str, node_type: Option<NodeType>) -> StorageResult<Vec<Node>> {
        let mut sql = String::from(
            "SELECT id, title, node_type, properties_json FROM nodes WHERE graph = ?1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(name.to_string())];

        if let Some(node_type) = node_type {
            sql.push_str(" AND node_type = ?2");
            params_vec.push(Box::new(node_type.as_str()));
        }
        sql.push_str(" ORDER BY position");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut nodes = Vec::new();
        for row in rows {
            let (id, title, node_type, properties) = row?;
            nodes.push(Self::row_to_node(id, title, node_type, properties)?);
        }
        Ok(nodes)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    fn save_graph(&self, name: &str, graph: &Graph) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Whole-graph replace: the previous rows survive unless commit succeeds
        tx.execute("DELETE FROM edges WHERE graph = ?1", params![name])?;
        tx.execute("DELETE FROM nodes WHERE graph = ?1", params![name])?;
        tx.execute(
            r#"
            INSERT INTO graphs (name, updated_at) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at
            "#,
            params![name, Utc::now().to_rfc3339()],
        )?;

        {
            let mut insert_node = tx.prepare(
                "INSERT INTO nodes (graph, id, position, title, node_type, properties_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, node) in graph.nodes().enumerate() {
                insert_node.execute(params![
                    name,
                    node.id.as_str(),
                    position as i64,
                    node.title,
                    node.node_type.as_str(),
                    serde_json::to_string(&node.properties)?,
                ])?;
            }

            let mut insert_edge = tx.prepare(
                "INSERT INTO edges (graph, position, source_id, target_id, relationship_type, weight, properties_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, edge) in graph.edges().enumerate() {
                insert_edge.execute(params![
                    name,
                    position as i64,
                    edge.source_id.as_str(),
                    edge.target_id.as_str(),
                    edge.relationship_type,
                    edge.weight,
                    serde_json::to_string(&edge.properties)?,
                ])?;
            }
        }

        tx.commit()?;
        info!(
            graph = name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "saved graph"
        );
        Ok(())
    }

    fn load_graph(&self, name: &str) -> StorageResult<Option<Graph>> {
        let conn = self.conn()?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM graphs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            debug!(graph = name, "graph not found");
            return Ok(None);
        }

        let nodes = Self::load_nodes(&conn, name, None)?;

        let mut stmt = conn.prepare(
            "SELECT source_id, target_id, relationship_type, weight, properties_json
             FROM edges WHERE graph = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            let (source, target, relationship_type, weight, properties) = row?;
            edges.push(Self::row_to_edge(source, target, relationship_type, weight, properties)?);
        }

        let graph = Graph::from_document(GraphDocument { nodes, edges })
            .map_err(|e| StorageError::Deserialization(format!("graph {name}: {e}")))?;
        info!(
            graph = name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded graph"
        );
        Ok(Some(graph))
    }

    fn find_nodes(&self, name: &str, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let conn = self.conn()?;

        // Category filters in SQL; properties are JSON, so they filter after decoding
        let nodes = Self::load_nodes(&conn, name, filter.node_type)?
            .into_iter()
            .filter(|node| node.matches_properties(&filter.properties))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(nodes)
    }

    fn delete_graph(&self, name: &str) -> StorageResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM edges WHERE graph = ?1", params![name])?;
        tx.execute("DELETE FROM nodes WHERE graph = ?1", params![name])?;
        let rows = tx.execute("DELETE FROM graphs WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    fn list_graphs(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM graphs ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;
    use tempfile::tempdir;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(
            Node::new("n2", "Borrowing", NodeType::Note)
                .with_property("difficulty", 2i64)
                .with_property("aliases", vec!["borrowck".to_string()]),
        );
        graph.add_node(Node::new("n1", "Ownership", NodeType::Concept).with_property("core", true));
        graph.add_node(Node::new("tag:rust", "Rust", NodeType::Tag));
        graph.add_edge(Edge::new("n1", "n2", "PREREQUISITE_OF").with_weight(0.8));
        graph.add_edge(Edge::new("n2", "tag:rust", "TAGGED_WITH").with_property("source", "catalog"));
        graph.add_edge(Edge::new("n1", "tag:rust", "TAGGED_WITH"));
        graph
    }

    #[test]
    fn test_save_and_load_graph() {
        let store = SqliteStore::open_in_memory().unwrap();
        let graph = sample_graph();
        store.save_graph("rust", &graph).unwrap();

        let loaded = store.load_graph("rust").unwrap().unwrap();
        assert_eq!(loaded.to_document(), graph.to_document());
        let ids: Vec<&str> = loaded.node_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1", "tag:rust"]);
        assert_eq!(loaded.get_edge("n1", "n2", "PREREQUISITE_OF").unwrap().weight, 0.8);
    }

    #[test]
    fn test_load_missing_graph() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_graph("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_graph("g", &sample_graph()).unwrap();

        let mut smaller = sample_graph();
        smaller.remove_node("n1");
        store.save_graph("g", &smaller).unwrap();

        let loaded = store.load_graph("g").unwrap().unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edge_count(), 1);
        assert!(!loaded.contains_node("n1"));
    }

    #[test]
    fn test_failed_save_keeps_previous_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_graph("g", &sample_graph()).unwrap();

        // SQLite stores NaN as NULL, which violates NOT NULL on weight
        let mut broken = Graph::new();
        broken.add_node(Node::new("a", "A", NodeType::Note));
        broken.add_node(Node::new("b", "B", NodeType::Note));
        broken.add_edge(Edge::new("a", "b", "RELATED_TO").with_weight(f64::NAN));
        assert!(store.save_graph("g", &broken).is_err());

        let loaded = store.load_graph("g").unwrap().unwrap();
        assert_eq!(loaded.to_document(), sample_graph().to_document());
    }

    #[test]
    fn test_graphs_are_isolated() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_graph("a", &sample_graph()).unwrap();
        store.save_graph("b", &Graph::new()).unwrap();

        assert_eq!(store.list_graphs().unwrap(), vec!["a", "b"]);
        assert!(store.load_graph("b").unwrap().unwrap().is_empty());

        assert!(store.delete_graph("a").unwrap());
        assert!(!store.delete_graph("a").unwrap());
        assert_eq!(store.list_graphs().unwrap(), vec!["b"]);
        assert!(store.load_graph("a").unwrap().is_none());
    }

    #[test]
    fn test_find_nodes_by_type_and_properties() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_graph("g", &sample_graph()).unwrap();

        let notes = store
            .find_nodes("g", &NodeFilter::new().with_type(NodeType::Note))
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.as_str(), "n2");

        let core = store
            .find_nodes("g", &NodeFilter::new().with_property("core", true))
            .unwrap();
        assert_eq!(core.len(), 1);
        assert_eq!(core[0].properties["core"], PropertyValue::Bool(true));

        let none = store
            .find_nodes(
                "g",
                &NodeFilter::new()
                    .with_type(NodeType::Note)
                    .with_property("difficulty", 5i64),
            )
            .unwrap();
        assert!(none.is_empty());

        let limited = store.find_nodes("g", &NodeFilter::new().with_limit(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_corrupt_rows_raise_deserialization() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_graph("g", &sample_graph()).unwrap();
        store
            .conn()
            .unwrap()
            .execute("UPDATE nodes SET node_type = 'WIDGET' WHERE id = 'n1'", [])
            .unwrap();

        assert!(matches!(
            store.load_graph("g"),
            Err(StorageError::Deserialization(_))
        ));
    }

    #[test]
    fn test_dangling_edge_rows_raise_deserialization() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_graph("g", &sample_graph()).unwrap();
        store
            .conn()
            .unwrap()
            .execute("DELETE FROM nodes WHERE id = 'n1'", [])
            .unwrap();

        assert!(matches!(
            store.load_graph("g"),
            Err(StorageError::Deserialization(_))
        ));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("kg.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_graph("g", &sample_graph()).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_graph("g").unwrap().unwrap().edge_count(), 3);
        assert!(store.updated_at("g").unwrap().is_some());
        assert!(store.updated_at("other").unwrap().is_none());
    }
}
