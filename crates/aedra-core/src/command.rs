//! Inbound operations
//!
//! Commands carry only semantic payload (ids, values, coordinates) so a
//! command layer can queue, log or replay them without touching the store.

use crate::edge::NewEdge;
use crate::error::Result;
use crate::graph::GraphStore;
use crate::ids::{EdgeId, NodeId};
use crate::node::{Coordinates, NewNode, Node, Payload};
use crate::traversal::{TraversalKind, TraversalResult};
use serde::{Deserialize, Serialize};

/// Operation requested by the command layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    AddNode {
        #[serde(default)]
        value: Payload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinates: Option<Coordinates>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link_to: Option<NodeId>,
    },
    DeleteNode {
        id: NodeId,
    },
    Connect {
        start: NodeId,
        end: NodeId,
        #[serde(default)]
        value: Payload,
    },
    UpdateNode {
        id: NodeId,
        #[serde(default)]
        value: Payload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinates: Option<Coordinates>,
    },
    Traverse {
        kind: TraversalKind,
        start: NodeId,
    },
}

/// Result of applying a [`Command`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    NodeAdded { id: NodeId },
    NodeDeleted { node: Node },
    Connected { edge: EdgeId },
    NodeUpdated { applied: bool },
    Traversed { result: TraversalResult },
}

impl GraphStore {
    /// Apply one command, emitting its events through the store's notifier
    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!("Applying {:?}", command);
        match command {
            Command::AddNode {
                value,
                coordinates,
                link_to,
            } => {
                let new = NewNode {
                    value,
                    coordinates,
                    link_target: link_to,
                };
                let id = self.add_node(new)?;
                Ok(Outcome::NodeAdded { id })
            }
            Command::DeleteNode { id } => {
                let node = self.delete_node(id)?;
                Ok(Outcome::NodeDeleted { node })
            }
            Command::Connect { start, end, value } => {
                let edge = self.connect(NewEdge { start, end, value })?;
                Ok(Outcome::Connected { edge })
            }
            Command::UpdateNode {
                id,
                value,
                coordinates,
            } => {
                let applied = self.update_node(id, value, coordinates);
                Ok(Outcome::NodeUpdated { applied })
            }
            Command::Traverse { kind, start } => {
                let result = self.traverse(kind, start)?;
                Ok(Outcome::Traversed { result })
            }
        }
    }
}
