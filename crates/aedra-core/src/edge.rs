//! Edge types

use crate::ids::{EdgeId, NodeId};
use crate::node::Payload;
use serde::{Deserialize, Serialize};

/// An undirected edge as reported in events and snapshots.
///
/// `start`/`end` give the orientation the edge is reported in; the graph
/// itself stores both directions with the same id and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub start: NodeId,
    pub end: NodeId,
    #[serde(default)]
    pub value: Payload,
}

impl Edge {
    pub fn new(id: EdgeId, start: NodeId, end: NodeId, value: impl Into<Payload>) -> Self {
        Self {
            id,
            start,
            end,
            value: value.into(),
        }
    }
}

/// One direction of an edge inside an adjacency row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub id: EdgeId,
    pub value: Payload,
}

impl EdgeEntry {
    /// Orient this entry as `start -> end`
    pub fn to_edge(&self, start: NodeId, end: NodeId) -> Edge {
        Edge::new(self.id, start, end, self.value.clone())
    }
}

/// Data for connecting two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    pub start: NodeId,
    pub end: NodeId,
    #[serde(default)]
    pub value: Payload,
}

impl NewEdge {
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self {
            start,
            end,
            value: Payload::Null,
        }
    }

    pub fn with_value(mut self, value: impl Into<Payload>) -> Self {
        self.value = value.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_orientation() {
        let entry = EdgeEntry {
            id: EdgeId(0),
            value: json!(3),
        };

        let edge = Edge::new(EdgeId(0), NodeId(1), NodeId(2), 3);
        assert_eq!(entry.to_edge(NodeId(1), NodeId(2)), edge);
        assert_eq!(entry.to_edge(NodeId(2), NodeId(1)).start, NodeId(2));
    }

    #[test]
    fn test_new_edge_defaults_to_null_value() {
        let edge = NewEdge::new(NodeId(0), NodeId(1));
        assert_eq!(edge.value, json!(null));

        let weighted = edge.with_value(2.5);
        assert_eq!(weighted.value, json!(2.5));
    }
}
