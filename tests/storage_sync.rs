//! Persistence, catalog synchronization and import/export against a real
//! SQLite file.
//!
//! Run with: `cargo test --test storage_sync`

mod common;

use common::{course_catalog, link, nodes};
use knowgraph::storage::tag_node_id;
use knowgraph::{
    CancellationToken, CatalogItem, EngineConfig, ExportFormat, GraphStorage, InMemoryCatalog,
    JsonFileCatalog, KnowledgeEngine, NodeType, OpenStore, Properties, PropertyValue, SqliteStore,
    StorageError, SyncConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn storage(dir: &TempDir, name: &str) -> GraphStorage {
    GraphStorage::open(dir.path().join("graphs.db"), name).unwrap()
}

#[test]
fn sync_builds_content_tags_and_connections() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "course");

    let report = storage
        .sync_with_catalog(&course_catalog(), &CancellationToken::new())
        .unwrap();

    assert_eq!(report.items_synced, 4);
    assert_eq!(report.tags_created, 4);
    assert_eq!(report.edges_created, 10);
    assert_eq!(report.skipped_connections, 1);
    assert!(report.is_complete());

    let graph = storage.load_graph().unwrap();
    assert_eq!(graph.node_count(), 8);
    assert_eq!(graph.edge_count(), 10);
    assert!(graph.contains_node(&tag_node_id("Rust")));
    assert!(!graph.contains_node("missing-item"));
    assert_eq!(graph.get_incoming_neighbors(&tag_node_id("rust")).len(), 3);
    assert!(graph.get_edge("borrowing", "ownership", "RELATED_TO").is_some());
}

#[test]
fn sync_uses_configured_relationships() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        connection_relationship: "BUILDS_ON".to_string(),
        connection_weight: 0.7,
        ..SyncConfig::default()
    };
    let storage = storage(&dir, "course").with_sync_config(config);
    storage
        .sync_with_catalog(&course_catalog(), &CancellationToken::new())
        .unwrap();

    let graph = storage.load_graph().unwrap();
    let edge = graph.get_edge("drill", "borrowing", "BUILDS_ON").unwrap();
    assert_eq!(edge.weight, 0.7);
    assert!(graph.get_edge("drill", "borrowing", "RELATED_TO").is_none());
}

#[test]
fn unreadable_items_are_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "course");
    let mut catalog = course_catalog();
    catalog.insert_unreadable("broken", "truncated record");
    catalog.insert(CatalogItem::new("odd", "Odd one", "podcast"));

    let report = storage
        .sync_with_catalog(&catalog, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.items_synced, 4);
    assert_eq!(report.failures.len(), 2);
    assert!(!report.is_complete());
    let failed: Vec<&str> = report.failures.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(failed, vec!["broken", "odd"]);
}

#[test]
fn cancelled_sync_leaves_stored_graph_untouched() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "course");
    storage.save_graph(&nodes(2, NodeType::Note)).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = storage.sync_with_catalog(&course_catalog(), &cancel);

    assert!(matches!(result, Err(StorageError::Cancelled)));
    assert_eq!(storage.load_graph().unwrap().node_count(), 2);
}

#[test]
fn timed_out_sync_leaves_stored_graph_untouched() {
    let dir = TempDir::new().unwrap();
    let config = SyncConfig {
        timeout_secs: Some(0),
        ..SyncConfig::default()
    };
    let storage = storage(&dir, "course").with_sync_config(config);

    let result = storage.sync_with_catalog(&course_catalog(), &CancellationToken::new());

    assert!(matches!(result, Err(StorageError::Timeout(d)) if d == Duration::ZERO));
    assert!(storage.load_graph().unwrap().is_empty());
}

#[test]
fn json_file_catalog_syncs_like_in_memory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(
        &path,
        r#"[
            {"id": "a", "title": "Traits", "content_type": "concept", "tags": ["rust"], "connections": ["b"]},
            {"id": "b", "title": "Generics", "content_type": "Concept"},
            {"title": "no id here", "content_type": "note"}
        ]"#,
    )
    .unwrap();

    let catalog = JsonFileCatalog::open(&path).unwrap();
    let storage = storage(&dir, "json");
    let report = storage
        .sync_with_catalog(&catalog, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.items_synced, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.edges_created, 2);
}

#[test]
fn repeated_ids_in_catalog_file_are_reported() {
    let catalog = JsonFileCatalog::from_json(
        r#"[
            {"id": "a", "title": "Traits", "content_type": "concept"},
            {"id": "a", "title": "Traits again", "content_type": "note"}
        ]"#,
    )
    .unwrap();
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "dupes");
    let report = storage
        .sync_with_catalog(&catalog, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.items_synced, 1);
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "a");
    let graph = storage.load_graph().unwrap();
    assert_eq!(graph.get_node("a").unwrap().title, "Traits");
}

#[test]
fn tag_clashing_with_content_id_is_reported() {
    let catalog = InMemoryCatalog::new()
        .with_item(CatalogItem::new("tag:rust", "Rust notes", "note"))
        .with_item(CatalogItem::new("n1", "Traits", "concept").with_tags(["rust"]));
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "clash");
    let report = storage
        .sync_with_catalog(&catalog, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.tags_created, 0);
    assert!(!report.is_complete());
    let graph = storage.load_graph().unwrap();
    assert!(storage.query_nodes(Some(NodeType::Tag), None).unwrap().is_empty());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn query_filters_by_type_and_property() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "course");
    let mut drill = CatalogItem::new("drill2", "Lifetimes drill", "exercise");
    drill
        .properties
        .insert("difficulty".to_string(), PropertyValue::from("hard"));
    let mut catalog = course_catalog();
    catalog.insert(drill);
    storage
        .sync_with_catalog(&catalog, &CancellationToken::new())
        .unwrap();

    let concepts = storage.query_nodes(Some(NodeType::Concept), None).unwrap();
    let mut ids: Vec<&str> = concepts.iter().map(|n| n.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["borrowing", "ownership"]);

    let tags = storage.query_nodes(Some(NodeType::Tag), None).unwrap();
    assert_eq!(tags.len(), 4);

    let mut wanted = Properties::new();
    wanted.insert("difficulty".to_string(), PropertyValue::from("hard"));
    let hard = storage.query_nodes(None, Some(&wanted)).unwrap();
    assert_eq!(hard.len(), 1);
    assert_eq!(hard[0].id.as_str(), "drill2");

    let hard_concepts = storage
        .query_nodes(Some(NodeType::Concept), Some(&wanted))
        .unwrap();
    assert!(hard_concepts.is_empty());
}

#[test]
fn export_then_import_preserves_graph() {
    let dir = TempDir::new().unwrap();
    let source = storage(&dir, "course");
    source
        .sync_with_catalog(&course_catalog(), &CancellationToken::new())
        .unwrap();
    let original = source.load_graph().unwrap();

    for format in [ExportFormat::Json, ExportFormat::Yaml] {
        let exported = source.export_graph(format).unwrap();
        let target = storage(&dir, &format!("copy-{format}"));
        let summary = target.import_graph(&exported, format, false).unwrap();

        assert_eq!(summary.nodes_added, original.node_count());
        assert_eq!(summary.edges_added, original.edge_count());
        assert_eq!(target.load_graph().unwrap().to_document(), original.to_document());
    }
}

#[test]
fn merge_import_keeps_existing_data() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "notes");
    let mut base = nodes(2, NodeType::Note);
    link(&mut base, "0", "1", "RELATED_TO", 0.4);
    storage.save_graph(&base).unwrap();

    let mut incoming = nodes(3, NodeType::Note);
    link(&mut incoming, "0", "1", "RELATED_TO", 0.9);
    link(&mut incoming, "1", "2", "RELATED_TO", 1.0);
    let data = ExportFormat::Json.render(&incoming).unwrap();

    let summary = storage.import_graph(&data, ExportFormat::Json, true).unwrap();
    assert_eq!(summary.nodes_added, 1);
    assert_eq!(summary.nodes_skipped, 2);
    assert_eq!(summary.edges_added, 1);
    assert_eq!(summary.edges_skipped, 1);

    let merged = storage.load_graph().unwrap();
    assert_eq!(merged.node_count(), 3);
    assert_eq!(merged.get_edge("0", "1", "RELATED_TO").unwrap().weight, 0.4);
}

#[test]
fn malformed_import_is_rejected_without_writing() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "notes");
    storage.save_graph(&nodes(1, NodeType::Note)).unwrap();

    let untyped = r#"{"nodes": [{"id": "x", "title": "X"}], "edges": []}"#;
    let dangling = r#"{"nodes": [], "edges": [{"source_id": "x", "target_id": "y", "relationship_type": "RELATED_TO", "weight": 1.0}]}"#;
    for (data, format) in [
        ("{ not json", ExportFormat::Json),
        (untyped, ExportFormat::Json),
        ("nodes: [", ExportFormat::Yaml),
        (dangling, ExportFormat::Json),
    ] {
        for merge in [false, true] {
            let result = storage.import_graph(data, format, merge);
            assert!(
                matches!(result, Err(StorageError::Deserialization(_))),
                "{format} merge={merge}: {result:?}"
            );
        }
    }
    assert_eq!(storage.load_graph().unwrap().node_count(), 1);
}

#[test]
fn format_names_parse_case_insensitively() {
    assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
    assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
    assert!(matches!(
        "XML".parse::<ExportFormat>(),
        Err(StorageError::UnsupportedFormat(f)) if f == "xml"
    ));
}

#[test]
fn graphs_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reopen.db");
    {
        let storage = GraphStorage::open(&path, "course").unwrap();
        storage
            .sync_with_catalog(&course_catalog(), &CancellationToken::new())
            .unwrap();
    }

    let engine = KnowledgeEngine::with_store(Arc::new(SqliteStore::open(&path).unwrap()));
    assert_eq!(engine.load_all().unwrap(), 1);
    let edges = engine.read("course", |graph| graph.edge_count()).unwrap();
    assert_eq!(edges, 10);
}

#[test]
fn engine_from_config_writes_through_to_disk() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        database_path: Some(dir.path().join("engine.db")),
        ..EngineConfig::default()
    };

    let engine = KnowledgeEngine::from_config(&config).unwrap();
    let report = engine
        .sync_with_catalog("course", &course_catalog(), &config.sync, &CancellationToken::new())
        .unwrap();
    assert_eq!(report.items_synced, 4);

    let reopened = GraphStorage::open(config.database_path(), "course").unwrap();
    assert_eq!(reopened.load_graph().unwrap().node_count(), 8);
}

#[test]
fn empty_catalog_syncs_to_empty_graph() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir, "empty");
    storage.save_graph(&nodes(3, NodeType::Note)).unwrap();

    let report = storage
        .sync_with_catalog(&InMemoryCatalog::new(), &CancellationToken::new())
        .unwrap();

    assert_eq!(report, Default::default());
    assert!(storage.load_graph().unwrap().is_empty());
}
