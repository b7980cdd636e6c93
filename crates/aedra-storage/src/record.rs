//! Stored graph records and name validation

use crate::error::{StorageError, StorageResult};
use crate::migration::CURRENT_VERSION;
use aedra_core::GraphSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum graph name length (64 chars)
pub const MAX_GRAPH_NAME_LEN: usize = 64;

/// A named snapshot as persisted by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGraph {
    pub name: String,
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub snapshot: GraphSnapshot,
}

impl StoredGraph {
    pub fn new(name: impl Into<String>, snapshot: GraphSnapshot) -> Self {
        Self {
            name: name.into(),
            schema_version: CURRENT_VERSION,
            saved_at: Utc::now(),
            snapshot,
        }
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            name: self.name.clone(),
            node_count: self.snapshot.node_count(),
            edge_count: self.snapshot.edge_count(),
            saved_at: self.saved_at,
        }
    }
}

/// Listing entry for a stored graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub saved_at: DateTime<Utc>,
}

/// Validate a graph name: non-empty, at most [`MAX_GRAPH_NAME_LEN`] chars,
/// ASCII alphanumerics plus `-`, `_` and `.`
pub fn validate_graph_name(name: &str) -> StorageResult<()> {
    let reject = |reason: String| {
        Err(StorageError::InvalidGraphName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("name cannot be empty".to_string());
    }
    if name.len() > MAX_GRAPH_NAME_LEN {
        return reject(format!(
            "{} chars (max {})",
            name.len(),
            MAX_GRAPH_NAME_LEN
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return reject(format!("unsupported character '{}'", c));
    }
    Ok(())
}
