//! Knowgraph CLI: build, inspect and exchange knowledge graphs.
//!
//! Usage:
//!   knowgraph [--db path] [--config path] [--graph name] [-v] <command>
//!
//! Commands operate on one named graph in a SQLite database.

use clap::{Parser, Subcommand};
use knowgraph::{
    CancellationToken, EngineConfig, ExportFormat, GraphAlgorithms, GraphOperations, GraphStorage,
    GraphTraversal, JsonFileCatalog, NodeId, NodeType, Properties, PropertyValue,
    RelationshipManager,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "knowgraph",
    version,
    about = "Typed, weighted knowledge graph for learning content"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Graph to operate on (default from config)
    #[arg(long, global = true)]
    graph: Option<String>,
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the graph from a JSON catalog of content items
    Sync {
        /// JSON array of catalog items
        catalog: PathBuf,
    },
    /// Write the graph as an interchange document
    Export {
        /// json or yaml
        #[arg(long, default_value = "json")]
        format: String,
        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load an interchange document into the graph
    Import {
        file: PathBuf,
        /// json or yaml (guessed from the extension if omitted)
        #[arg(long)]
        format: Option<String>,
        /// Fold into the existing graph instead of replacing it
        #[arg(long)]
        merge: bool,
    },
    /// List nodes by type and property values
    Query {
        /// Node type, e.g. concept
        #[arg(long = "type")]
        node_type: Option<String>,
        /// key=value property filter (repeatable)
        #[arg(long = "prop")]
        props: Vec<String>,
    },
    /// Print graph statistics
    Stats,
    /// Lowest-weight path between two nodes
    Path { from: String, to: String },
    /// Learning path, preferring prerequisite chains
    Learn { from: String, to: String },
    /// Rank nodes by PageRank
    Rank {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Suggest new connections for a node
    Suggest {
        id: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Suggest what to study next instead
        #[arg(long)]
        next: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn open_storage(config: &EngineConfig, graph_name: &str) -> Result<GraphStorage, String> {
    let db_path = config.database_path();
    GraphStorage::open(&db_path, graph_name)
        .map(|storage| storage.with_sync_config(config.sync.clone()))
        .map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))
}

/// `true`/`false`, integers and floats are typed; anything else is a string
fn parse_property(pair: &str) -> Result<(String, PropertyValue), String> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
    let value = if let Ok(b) = raw.parse::<bool>() {
        PropertyValue::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        PropertyValue::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        PropertyValue::Float(f)
    } else {
        PropertyValue::String(raw.to_string())
    };
    Ok((key.trim().to_string(), value))
}

fn format_from_path(path: &Path) -> ExportFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ExportFormat::Yaml,
        _ => ExportFormat::Json,
    }
}

fn print_path(graph: &knowgraph::Graph, path: &[NodeId]) {
    let labels: Vec<String> = path
        .iter()
        .map(|id| match graph.get_node(id) {
            Some(node) => format!("{} ({})", node.title, id),
            None => id.to_string(),
        })
        .collect();
    println!("{}", labels.join(" -> "));
}

/// Load the stored graph and hand it to a read-only command
fn with_graph(storage: &GraphStorage, run: impl FnOnce(knowgraph::Graph) -> i32) -> i32 {
    match storage.load_graph() {
        Ok(graph) => run(graph),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_sync(storage: &GraphStorage, catalog_path: &Path) -> i32 {
    let catalog = match JsonFileCatalog::open(catalog_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: cannot read catalog '{}': {}", catalog_path.display(), e);
            return 1;
        }
    };
    match storage.sync_with_catalog(&catalog, &CancellationToken::new()) {
        Ok(report) => {
            println!(
                "Synced {} items into '{}': {} tags, {} edges, {} skipped connections",
                report.items_synced,
                storage.graph_name(),
                report.tags_created,
                report.edges_created,
                report.skipped_connections
            );
            for (id, reason) in &report.failures {
                eprintln!("Warning: skipped '{}': {}", id, reason);
            }
            if report.is_complete() {
                0
            } else {
                2
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_export(storage: &GraphStorage, format: &str, out: Option<&Path>) -> i32 {
    let format: ExportFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let text = match storage.export_graph(format) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match out {
        Some(path) => match std::fs::write(path, text) {
            Ok(()) => {
                println!("Exported '{}' to {}", storage.graph_name(), path.display());
                0
            }
            Err(e) => {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                1
            }
        },
        None => {
            println!("{}", text);
            0
        }
    }
}

fn cmd_import(storage: &GraphStorage, file: &Path, format: Option<&str>, merge: bool) -> i32 {
    let format = match format {
        Some(name) => match name.parse::<ExportFormat>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => format_from_path(file),
    };
    let data = match std::fs::read_to_string(file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };
    match storage.import_graph(&data, format, merge) {
        Ok(summary) => {
            println!(
                "Imported into '{}': {} nodes, {} edges added; {} nodes, {} edges already present",
                storage.graph_name(),
                summary.nodes_added,
                summary.edges_added,
                summary.nodes_skipped,
                summary.edges_skipped
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_query(storage: &GraphStorage, node_type: Option<&str>, props: &[String]) -> i32 {
    let node_type = match node_type.map(str::parse::<NodeType>).transpose() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut properties = Properties::new();
    for pair in props {
        match parse_property(pair) {
            Ok((key, value)) => {
                properties.insert(key, value);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    let filter = (!properties.is_empty()).then_some(&properties);
    match storage.query_nodes(node_type, filter) {
        Ok(nodes) => {
            for node in &nodes {
                println!("{}\t{}\t{}", node.id, node.node_type, node.title);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stats(graph: &knowgraph::Graph) -> i32 {
    let algorithms = GraphAlgorithms::new(graph);
    let stats = algorithms.stats();
    let communities: HashSet<usize> = algorithms.find_communities().into_values().collect();
    match serde_json::to_string_pretty(&stats) {
        Ok(text) => {
            println!("{}", text);
            println!("communities: {}", communities.len());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_path(graph: &knowgraph::Graph, from: &str, to: &str) -> i32 {
    match GraphAlgorithms::new(graph).shortest_path(from, to) {
        Some(path) => {
            print_path(graph, &path);
            0
        }
        None => {
            eprintln!("No path from '{}' to '{}'", from, to);
            1
        }
    }
}

fn cmd_learn(graph: &knowgraph::Graph, from: &str, to: &str) -> i32 {
    match GraphTraversal::new(graph).get_learning_path(from, to) {
        Some(path) => {
            for (step, id) in path.iter().enumerate() {
                let title = graph.get_node(id).map(|n| n.title.as_str()).unwrap_or("");
                println!("{:>3}. {} ({})", step + 1, title, id);
            }
            0
        }
        None => {
            eprintln!("No learning path from '{}' to '{}'", from, to);
            1
        }
    }
}

fn cmd_rank(graph: &knowgraph::Graph, config: &EngineConfig, top: usize) -> i32 {
    let scores = GraphAlgorithms::new(graph).pagerank(&config.pagerank);
    let mut ranked: Vec<(NodeId, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (id, score) in ranked.into_iter().take(top) {
        let title = graph.get_node(&id).map(|n| n.title.as_str()).unwrap_or("");
        println!("{:.6}\t{}\t{}", score, id, title);
    }
    0
}

fn cmd_suggest(
    mut graph: knowgraph::Graph,
    config: &EngineConfig,
    id: &str,
    limit: usize,
    next: bool,
) -> i32 {
    let relationships = match RelationshipManager::from_settings(&config.relationships) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if !graph.contains_node(id) {
        eprintln!("Error: node '{}' not found", id);
        return 1;
    }
    if next {
        let suggestions = GraphTraversal::new(&graph).suggest_next_nodes(id, &HashSet::new());
        for s in suggestions.into_iter().take(limit) {
            println!("{:.3}\t{}\t{}", s.score, s.node.id, s.reason);
        }
        return 0;
    }
    let ops = GraphOperations::new(&mut graph, &relationships);
    for (candidate, score) in ops.suggest_connections(id, limit) {
        let title = ops.graph().get_node(&candidate).map(|n| n.title.clone()).unwrap_or_default();
        println!("{:.3}\t{}\t{}", score, candidate, title);
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match EngineConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if cli.db.is_some() {
        config.database_path = cli.db;
    }
    let graph_name = cli.graph.unwrap_or_else(|| config.graph_name.clone());

    let storage = match open_storage(&config, &graph_name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Sync { catalog } => cmd_sync(&storage, &catalog),
        Commands::Export { format, out } => cmd_export(&storage, &format, out.as_deref()),
        Commands::Import { file, format, merge } => {
            cmd_import(&storage, &file, format.as_deref(), merge)
        }
        Commands::Query { node_type, props } => cmd_query(&storage, node_type.as_deref(), &props),
        Commands::Stats => with_graph(&storage, |g| cmd_stats(&g)),
        Commands::Path { from, to } => with_graph(&storage, |g| cmd_path(&g, &from, &to)),
        Commands::Learn { from, to } => with_graph(&storage, |g| cmd_learn(&g, &from, &to)),
        Commands::Rank { top } => with_graph(&storage, |g| cmd_rank(&g, &config, top)),
        Commands::Suggest { id, limit, next } => {
            with_graph(&storage, |g| cmd_suggest(g, &config, &id, limit, next))
        }
    };
    std::process::exit(code);
}
