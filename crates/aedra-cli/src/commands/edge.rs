//! Edge commands

use clap::{Args, Subcommand};

use super::{mutate, note, parse_payload};
use crate::output::{self, OutputFormat};
use crate::AppContext;
use aedra_core::{NewEdge, NodeId};

#[derive(Args)]
pub struct EdgeArgs {
    #[command(subcommand)]
    pub command: EdgeCommands,
}

#[derive(Subcommand)]
pub enum EdgeCommands {
    /// Connect two existing nodes
    Connect {
        /// First endpoint
        start: u64,
        /// Second endpoint
        end: u64,
        /// Edge value (JSON, or taken as a string)
        #[arg(long)]
        value: Option<String>,
    },
    /// List all edges
    List,
}

pub async fn run(args: &EdgeArgs, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::debug!("Running edge command on graph: {}", ctx.graph);

    match &args.command {
        EdgeCommands::Connect { start, end, value } => {
            let mut edge = NewEdge::new(NodeId(*start), NodeId(*end));
            if let Some(value) = value {
                edge = edge.with_value(parse_payload(value));
            }

            if let Some(id) = mutate(ctx, |store| store.connect(edge)).await? {
                tracing::info!("Created edge {} between {} and {}", id, start, end);
                note(ctx, format!("Created edge {}", id));
            }
        }
        EdgeCommands::List => {
            let (store, _) = ctx.open_graph().await?;
            let edges = store.edges();

            match ctx.format {
                OutputFormat::Json => println!("{}", output::to_json(&edges)?),
                OutputFormat::Table if edges.is_empty() => {
                    println!("No edges in graph '{}'", ctx.graph);
                }
                OutputFormat::Table => {
                    println!("Edges in graph '{}' ({} found):", ctx.graph, edges.len());
                    for edge in &edges {
                        println!("  {}", output::edge_line(edge));
                    }
                }
            }
        }
    }

    Ok(())
}
