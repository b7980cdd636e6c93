//! Output formatting utilities

use std::fmt;
use std::str::FromStr;

use aedra_core::{Edge, GraphEvent, NodeId, NodeSnapshot};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => f.write_str("table"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown output format '{}' (expected table or json)", other),
        }
    }
}

/// Pretty JSON for a single value
pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Print events, one line each.
///
/// JSON output is one compact object per line so it can be piped into a
/// renderer as it arrives.
pub fn print_events(events: &[GraphEvent], format: OutputFormat) -> anyhow::Result<()> {
    for event in events {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
            OutputFormat::Table => println!("{}", event_line(event)),
        }
    }
    Ok(())
}

pub fn event_line(event: &GraphEvent) -> String {
    match event {
        GraphEvent::NodeCreated { node }
        | GraphEvent::NodeUpdated { node }
        | GraphEvent::NodeDeleted { node } => {
            format!("{:<13} {}", event.kind().to_string(), node_line(node))
        }
        GraphEvent::EdgeCreated { edge } | GraphEvent::EdgeDeleted { edge } => {
            format!("{:<13} {}", event.kind().to_string(), edge_line(edge))
        }
        GraphEvent::VisitOrder {
            traversal,
            step,
            node,
            via,
        } => {
            let via = via
                .as_ref()
                .map(|edge| format!(" via edge {}", edge.id))
                .unwrap_or_default();
            format!(
                "{:<13} {} step {:>3}: node {}{}",
                "visit", traversal, step, node.node.id, via
            )
        }
    }
}

pub fn node_line(node: &NodeSnapshot) -> String {
    let coordinates = node
        .node
        .coordinates
        .map(|c| format!(" at ({}, {}, {})", c.x, c.y, c.z))
        .unwrap_or_default();
    format!(
        "node {} value={}{} neighbors=[{}]",
        node.node.id,
        node.node.value,
        coordinates,
        join_ids(&node.neighbors)
    )
}

pub fn edge_line(edge: &Edge) -> String {
    format!(
        "edge {} {} -- {} value={}",
        edge.id, edge.start, edge.end, edge.value
    )
}

pub fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
