//! AEDRA CLI - Command line interface for building and traversing graphs

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use aedra_core::{EventRecorder, GraphEvent, GraphStore};
use aedra_storage::{RedbStorage, StorageBackend};
use commands::{completions, edge, graph, node, script, traverse};
use config::Config;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "aedra")]
#[command(author, version, about = "Graph engine for data structure visualization")]
pub struct Cli {
    /// Graph to operate on
    #[arg(short, long, env = "AEDRA_GRAPH", global = true)]
    pub graph: Option<String>,

    /// Data directory
    #[arg(short, long, env = "AEDRA_DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, env = "AEDRA_FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the data directory path
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.clone())
    }

    pub fn graph_name(&self, config: &Config) -> String {
        self.graph
            .clone()
            .unwrap_or_else(|| config.default_graph.clone())
    }

    pub fn output_format(&self, config: &Config) -> OutputFormat {
        self.format.unwrap_or(config.format)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add, delete, update and inspect nodes
    Node(node::NodeArgs),
    /// Connect nodes and list edges
    Edge(edge::EdgeArgs),
    /// Traverse the graph from a start node
    Traverse(traverse::TraverseArgs),
    /// Find the shortest path between two nodes
    Path(traverse::PathArgs),
    /// Re-emit the whole graph as creation events
    Replay,
    /// Apply a JSON-lines command script
    Run(script::RunArgs),
    /// Manage stored graphs
    Graph(graph::GraphArgs),
    /// Manage CLI configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with storage backend
pub struct AppContext {
    pub storage: Arc<RedbStorage>,
    pub graph: String,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl AppContext {
    pub async fn new(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let data_dir = cli.data_dir(config);
        std::fs::create_dir_all(&data_dir)?;

        let db_path = data_dir.join("aedra.redb");
        tracing::debug!("Using database at: {:?}", db_path);

        let storage = RedbStorage::open(&db_path)?;
        storage.initialize().await?;

        let graph = cli.graph_name(config);
        aedra_storage::validate_graph_name(&graph)?;

        Ok(Self {
            storage: Arc::new(storage),
            graph,
            format: cli.output_format(config),
            quiet: cli.quiet,
        })
    }

    /// Load the current graph with a recorder subscribed to its events
    pub async fn open_graph(&self) -> anyhow::Result<(GraphStore, EventRecorder)> {
        let mut store = self.storage.open_store(&self.graph).await?;
        let events = EventRecorder::new();
        store.subscribe(events.clone());
        Ok((store, events))
    }

    pub async fn save_graph(&self, store: &GraphStore) -> anyhow::Result<()> {
        let stored = self.storage.save_graph(&self.graph, &store.snapshot()).await?;
        tracing::info!(
            "Saved graph '{}' ({} nodes, {} edges)",
            stored.name,
            stored.snapshot.node_count(),
            stored.snapshot.edge_count()
        );
        Ok(())
    }

    pub fn print_events(&self, events: &[GraphEvent]) -> anyhow::Result<()> {
        if self.quiet {
            return Ok(());
        }
        output::print_events(events, self.format)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting aedra CLI");

    // Commands that don't need storage
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args),
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let config = Config::load();
    let ctx = AppContext::new(&cli, &config).await?;

    match &cli.command {
        Commands::Node(args) => node::run(args, &ctx).await?,
        Commands::Edge(args) => edge::run(args, &ctx).await?,
        Commands::Traverse(args) => traverse::run(args, &ctx).await?,
        Commands::Path(args) => traverse::run_path(args, &ctx).await?,
        Commands::Replay => traverse::run_replay(&ctx).await?,
        Commands::Run(args) => script::run(args, &ctx).await?,
        Commands::Graph(args) => graph::run(args, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => unreachable!("handled above"),
    }

    Ok(())
}
