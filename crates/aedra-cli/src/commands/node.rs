//! Node commands

use clap::{Args, Subcommand};

use super::{mutate, note, parse_coordinates, parse_payload};
use crate::output::{self, OutputFormat};
use crate::AppContext;
use aedra_core::{Coordinates, NewNode, NodeId};

#[derive(Args)]
pub struct NodeArgs {
    #[command(subcommand)]
    pub command: NodeCommands,
}

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Add a new node
    Add {
        /// Node value (JSON, or taken as a string)
        value: Option<String>,
        /// Connect the new node to this existing node
        #[arg(short, long)]
        link_to: Option<u64>,
        /// Position hint as x,y or x,y,z
        #[arg(long, value_parser = parse_coordinates)]
        at: Option<Coordinates>,
    },
    /// Delete a node and every edge touching it
    Delete {
        /// Node id
        id: u64,
    },
    /// Replace a node's value and position
    Update {
        /// Node id
        id: u64,
        /// New value (JSON, or taken as a string)
        value: String,
        /// Position hint as x,y or x,y,z
        #[arg(long, value_parser = parse_coordinates)]
        at: Option<Coordinates>,
    },
    /// Show a node with its neighbors
    Show {
        /// Node id
        id: u64,
    },
    /// List a node's neighbors in adjacency order
    Neighbors {
        /// Node id
        id: u64,
    },
    /// List all nodes
    List,
}

pub async fn run(args: &NodeArgs, ctx: &AppContext) -> anyhow::Result<()> {
    tracing::debug!("Running node command on graph: {}", ctx.graph);

    match &args.command {
        NodeCommands::Add { value, link_to, at } => {
            let mut new = NewNode::new(value.as_deref().map(parse_payload).unwrap_or_default());
            if let Some(target) = link_to {
                new = new.linked_to(NodeId(*target));
            }
            if let Some(coordinates) = at {
                new = new.at(*coordinates);
            }

            if let Some(id) = mutate(ctx, |store| store.add_node(new)).await? {
                tracing::info!("Created node {}", id);
                note(ctx, format!("Created node {}", id));
            }
        }
        NodeCommands::Delete { id } => {
            let id = NodeId(*id);
            if let Some(node) = mutate(ctx, |store| store.delete_node(id)).await? {
                tracing::info!("Deleted node {}", node.id);
                note(ctx, format!("Deleted node {}", node.id));
            }
        }
        NodeCommands::Update { id, value, at } => {
            let id = NodeId(*id);
            let value = parse_payload(value);
            let applied = mutate(ctx, |store| Ok(store.update_node(id, value, *at))).await?;
            if applied == Some(false) {
                note(ctx, format!("Node {} not found, nothing updated", id));
            }
        }
        NodeCommands::Show { id } => {
            let (store, _) = ctx.open_graph().await?;
            let node = store
                .node_snapshot(NodeId(*id))
                .ok_or_else(|| aedra_core::Error::UnknownNode(NodeId(*id)))?;
            match ctx.format {
                OutputFormat::Json => println!("{}", output::to_json(&node)?),
                OutputFormat::Table => println!("{}", output::node_line(&node)),
            }
        }
        NodeCommands::Neighbors { id } => {
            let (store, _) = ctx.open_graph().await?;
            let neighbors = store.neighbors(NodeId(*id))?;
            match ctx.format {
                OutputFormat::Json => println!("{}", output::to_json(&neighbors)?),
                OutputFormat::Table => {
                    if neighbors.is_empty() {
                        println!("Node {} has no neighbors", id);
                    } else {
                        println!("{}", output::join_ids(&neighbors));
                    }
                }
            }
        }
        NodeCommands::List => {
            let (store, _) = ctx.open_graph().await?;
            let nodes: Vec<_> = store
                .nodes()
                .filter_map(|n| store.node_snapshot(n.id))
                .collect();
            tracing::info!("Found {} nodes", nodes.len());

            match ctx.format {
                OutputFormat::Json => println!("{}", output::to_json(&nodes)?),
                OutputFormat::Table if nodes.is_empty() => {
                    println!("No nodes in graph '{}'", ctx.graph);
                }
                OutputFormat::Table => {
                    println!("Nodes in graph '{}' ({} found):", ctx.graph, nodes.len());
                    for node in &nodes {
                        println!("  {}", output::node_line(node));
                    }
                }
            }
        }
    }

    Ok(())
}
