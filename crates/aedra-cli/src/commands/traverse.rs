//! Traversal, path and replay commands

use clap::Args;

use super::note;
use crate::output::{self, OutputFormat};
use crate::AppContext;
use aedra_core::{NodeId, TraversalKind};

#[derive(Args)]
pub struct TraverseArgs {
    /// Start node id
    pub start: u64,

    /// Strategy: bfs or dfs
    #[arg(short, long, default_value = "bfs")]
    pub kind: TraversalKind,
}

#[derive(Args)]
pub struct PathArgs {
    /// Start node id
    pub start: u64,

    /// Target node id
    pub target: u64,
}

/// Traversals only emit visit events; the stored graph is not rewritten.
pub async fn run(args: &TraverseArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let (mut store, events) = ctx.open_graph().await?;
    let result = store.traverse(args.kind, NodeId(args.start))?;
    tracing::info!(
        "{} from {} visited {} nodes, examined {} edges",
        result.kind,
        result.start,
        result.stats.nodes_visited,
        result.stats.edges_examined
    );

    ctx.print_events(&events.drain())?;
    note(
        ctx,
        format!(
            "Visited {} nodes: {}",
            result.order.len(),
            output::join_ids(&result.order)
        ),
    );
    Ok(())
}

pub async fn run_path(args: &PathArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let (store, _) = ctx.open_graph().await?;
    let (start, target) = (NodeId(args.start), NodeId(args.target));
    let path = store.shortest_path(start, target)?;

    match (ctx.format, &path) {
        (OutputFormat::Json, _) => println!("{}", output::to_json(&path)?),
        (OutputFormat::Table, Some(path)) => {
            let hops: Vec<_> = path.nodes.iter().map(ToString::to_string).collect();
            println!("{} ({} edges)", hops.join(" -> "), path.length);
        }
        (OutputFormat::Table, None) => println!("No path from {} to {}", start, target),
    }
    Ok(())
}

/// Emit the whole graph as creation events, for a consumer starting from scratch
pub async fn run_replay(ctx: &AppContext) -> anyhow::Result<()> {
    let (mut store, events) = ctx.open_graph().await?;
    store.materialize();
    let events = events.drain();
    tracing::info!("Replayed {} events from graph '{}'", events.len(), ctx.graph);
    ctx.print_events(&events)
}
