//! Stored graph management: list, show, delete, export, import

use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use crate::AppContext;
use aedra_core::{GraphSnapshot, GraphStore};
use aedra_storage::StorageBackend;

#[derive(Args)]
pub struct GraphArgs {
    #[command(subcommand)]
    pub command: GraphCommands,
}

#[derive(Subcommand)]
pub enum GraphCommands {
    /// List stored graphs
    List,
    /// Show statistics for a graph (default: current graph)
    Show {
        /// Graph name
        name: Option<String>,
    },
    /// Delete a stored graph
    Delete {
        /// Graph name
        name: String,
        /// Confirm deletion
        #[arg(long)]
        force: bool,
    },
    /// Export the current graph as a JSON snapshot
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a JSON snapshot as the current graph
    Import {
        /// Snapshot file
        file: PathBuf,
        /// Replace an existing graph of the same name
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(args: &GraphArgs, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::debug!("Running graph command");

    match &args.command {
        GraphCommands::List => {
            let graphs = ctx.storage.list_graphs().await?;
            tracing::info!("Found {} graphs", graphs.len());

            match ctx.format {
                OutputFormat::Json => println!("{}", output::to_json(&graphs)?),
                OutputFormat::Table if graphs.is_empty() => {
                    println!("No graphs found. Add a node with 'aedra node add <value>'");
                }
                OutputFormat::Table => {
                    println!("Graphs ({} found):", graphs.len());
                    for graph in &graphs {
                        let current = if graph.name == ctx.graph { " (current)" } else { "" };
                        println!(
                            "  {}{} - {} nodes, {} edges, saved {}",
                            graph.name,
                            current,
                            graph.node_count,
                            graph.edge_count,
                            graph.saved_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
        }
        GraphCommands::Show { name } => {
            let name = name.as_deref().unwrap_or(&ctx.graph);
            let stored = ctx
                .storage
                .load_graph(name)
                .await?
                .ok_or_else(|| aedra_storage::StorageError::GraphNotFound(name.to_string()))?;
            let summary = stored.summary();

            match ctx.format {
                OutputFormat::Json => println!("{}", output::to_json(&summary)?),
                OutputFormat::Table => {
                    println!("Graph: {}", summary.name);
                    println!("  Nodes: {}", summary.node_count);
                    println!("  Edges: {}", summary.edge_count);
                    println!("  Next node id: {}", stored.snapshot.next_node_id);
                    println!("  Next edge id: {}", stored.snapshot.next_edge_id);
                    println!("  Schema version: {}", stored.schema_version);
                    println!("  Saved: {}", summary.saved_at);
                }
            }
        }
        GraphCommands::Delete { name, force } => {
            if !force {
                if ctx.storage.load_graph(name).await?.is_none() {
                    println!("Graph '{}' not found", name);
                    return Ok(());
                }
                println!("Use --force to confirm deletion of graph '{}'", name);
                return Ok(());
            }

            if ctx.storage.delete_graph(name).await? {
                tracing::info!("Deleted graph: {}", name);
                println!("Deleted graph: {}", name);
            } else {
                println!("Graph '{}' not found", name);
            }
        }
        GraphCommands::Export { output } => {
            let (store, _) = ctx.open_graph().await?;
            let content = store.snapshot().to_json()?;

            match output {
                Some(path) => {
                    write_private(path, &content)?;
                    tracing::info!("Exported graph '{}' to {}", ctx.graph, path.display());
                    super::note(
                        ctx,
                        format!("Exported graph '{}' to {}", ctx.graph, path.display()),
                    );
                }
                None => println!("{}", content),
            }
        }
        GraphCommands::Import { file, force } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("reading snapshot {}", file.display()))?;
            let snapshot = GraphSnapshot::from_json(&content)?;

            if !force && ctx.storage.load_graph(&ctx.graph).await?.is_some() {
                anyhow::bail!(
                    "Graph '{}' already exists. Use --force to replace it.",
                    ctx.graph
                );
            }

            // Restoring validates the snapshot before anything is written
            let store = GraphStore::from_snapshot(snapshot)?;
            ctx.save_graph(&store).await?;
            tracing::info!("Imported {} into graph '{}'", file.display(), ctx.graph);
            super::note(
                ctx,
                format!(
                    "Imported graph '{}' ({} nodes, {} edges)",
                    ctx.graph,
                    store.node_count(),
                    store.edge_count()
                ),
            );
        }
    }

    Ok(())
}

/// Write `content` to `path`, readable only by the owner on unix
fn write_private(path: &std::path::Path, content: &str) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
    }
    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }
    Ok(())
}
