//! Full-state snapshots for state transfer
//!
//! A snapshot restores into a fresh [`GraphStore`] silently; call
//! [`GraphStore::materialize`] afterwards to populate subscribers.

use crate::adjacency::Adjacency;
use crate::edge::{Edge, EdgeEntry};
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::ids::{IdAllocator, NodeId};
use crate::node::Node;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serializable picture of a graph, including allocator positions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub next_node_id: u64,
    pub next_edge_id: u64,
    pub nodes: Vec<Node>,
    /// Each undirected edge once
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GraphStore {
    /// Capture the current structure
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            next_node_id: self.allocator().peek_node(),
            next_edge_id: self.allocator().peek_edge(),
            nodes: self.nodes().cloned().collect(),
            edges: self.edges(),
        }
    }

    /// Rebuild a store from a snapshot without emitting events.
    ///
    /// The snapshot is validated first; anything that would break a
    /// structural invariant is rejected with [`Error::InvalidSnapshot`].
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let GraphSnapshot {
            next_node_id,
            next_edge_id,
            nodes: node_list,
            edges,
        } = snapshot;

        let mut nodes = IndexMap::with_capacity(node_list.len());
        let mut adjacency = Adjacency::new();
        for node in node_list {
            if node.id.0 >= next_node_id {
                return Err(invalid(format!(
                    "node {} is not below next_node_id {}",
                    node.id, next_node_id
                )));
            }
            let id = node.id;
            if nodes.insert(id, node).is_some() {
                return Err(invalid(format!("node {} appears twice", id)));
            }
            adjacency.insert_row(id);
        }

        // Rows only ever append, so every row lists its edges in creation
        // order. Relinking by ascending edge id reproduces neighbor order.
        let mut edges = edges;
        edges.sort_by_key(|edge| edge.id);

        let mut edge_ids = HashSet::with_capacity(edges.len());
        for edge in edges {
            check_edge(&edge, &nodes, next_edge_id)?;
            if adjacency.linked(edge.start, edge.end) {
                return Err(invalid(format!(
                    "duplicate edge {} <-> {}",
                    edge.start, edge.end
                )));
            }
            if !edge_ids.insert(edge.id) {
                return Err(invalid(format!("edge id {} appears twice", edge.id)));
            }
            adjacency.link(
                edge.start,
                edge.end,
                EdgeEntry {
                    id: edge.id,
                    value: edge.value,
                },
            );
        }

        let store = GraphStore::from_parts(
            IdAllocator::resume_at(next_node_id, next_edge_id),
            nodes,
            adjacency,
        );
        tracing::debug!(
            "Restored snapshot with {} nodes and {} edges",
            store.node_count(),
            store.edge_count()
        );
        Ok(store)
    }
}

fn check_edge(edge: &Edge, nodes: &IndexMap<NodeId, Node>, next_edge_id: u64) -> Result<()> {
    for end in [edge.start, edge.end] {
        if !nodes.contains_key(&end) {
            return Err(invalid(format!(
                "edge {} references unknown node {}",
                edge.id, end
            )));
        }
    }
    if edge.start == edge.end {
        return Err(invalid(format!("edge {} is a self-loop", edge.id)));
    }
    if edge.id.0 >= next_edge_id {
        return Err(invalid(format!(
            "edge {} is not below next_edge_id {}",
            edge.id, next_edge_id
        )));
    }
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::InvalidSnapshot(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::NewEdge;
    use crate::event::{EventKind, EventRecorder};
    use crate::ids::EdgeId;
    use crate::node::NewNode;
    use serde_json::json;

    fn sample() -> GraphStore {
        let mut graph = GraphStore::new();
        let a = graph.add_node(NewNode::new("A")).unwrap();
        let b = graph.add_node(NewNode::new("B").linked_to(a)).unwrap();
        let c = graph.add_node(NewNode::new("C")).unwrap();
        graph.connect(NewEdge::new(b, c).with_value(7)).unwrap();
        let d = graph.add_node(NewNode::new("D")).unwrap();
        graph.delete_node(d).unwrap();
        graph
    }

    #[test]
    fn test_snapshot_restore_preserves_structure() {
        let graph = sample();
        let snapshot = graph.snapshot();
        assert_eq!(snapshot.next_node_id, 4);
        assert_eq!(snapshot.next_edge_id, 2);

        let json = snapshot.to_json().unwrap();
        let restored = GraphStore::from_snapshot(GraphSnapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.neighbors(NodeId(1)).unwrap(), vec![NodeId(0), NodeId(2)]);
        assert_eq!(
            restored.edge_between(NodeId(2), NodeId(1)).unwrap().value,
            json!(7)
        );
        restored.check_invariants().unwrap();
    }

    #[test]
    fn test_restore_keeps_neighbor_order() {
        let mut graph = GraphStore::new();
        for value in ["A", "B", "C"] {
            graph.add_node(NewNode::new(value)).unwrap();
        }
        graph.connect(NewEdge::new(NodeId(1), NodeId(2))).unwrap();
        graph.connect(NewEdge::new(NodeId(0), NodeId(1))).unwrap();

        let restored = GraphStore::from_snapshot(graph.snapshot()).unwrap();
        assert_eq!(restored.neighbors(NodeId(1)).unwrap(), vec![NodeId(2), NodeId(0)]);
        assert_eq!(restored.adjacency(), graph.adjacency());
    }

    #[test]
    fn test_restored_store_continues_allocation() {
        let mut restored = GraphStore::from_snapshot(sample().snapshot()).unwrap();

        assert_eq!(restored.add_node(NewNode::new("E")).unwrap(), NodeId(4));
        assert_eq!(
            restored.connect(NewEdge::new(NodeId(0), NodeId(2))).unwrap(),
            EdgeId(2)
        );
    }

    #[test]
    fn test_restore_then_materialize() {
        let mut restored = GraphStore::from_snapshot(sample().snapshot()).unwrap();
        let events = EventRecorder::new();
        restored.subscribe(events.clone());

        restored.materialize();

        assert_eq!(events.count(EventKind::NodeCreated), 3);
        assert_eq!(events.count(EventKind::EdgeCreated), 2);
    }

    #[test]
    fn test_invalid_snapshots_rejected() {
        let good = sample().snapshot();

        let mut dangling = good.clone();
        dangling.edges.push(Edge::new(EdgeId(1), NodeId(0), NodeId(9), json!(null)));
        assert!(matches!(
            GraphStore::from_snapshot(dangling),
            Err(Error::InvalidSnapshot(_))
        ));

        let mut duplicate = good.clone();
        duplicate.edges.push(Edge::new(EdgeId(1), NodeId(1), NodeId(0), json!(null)));
        assert!(GraphStore::from_snapshot(duplicate).is_err());

        let mut stale_allocator = good.clone();
        stale_allocator.next_node_id = 1;
        assert!(GraphStore::from_snapshot(stale_allocator).is_err());

        let mut looped = good;
        looped.edges.push(Edge::new(EdgeId(1), NodeId(2), NodeId(2), json!(null)));
        assert!(GraphStore::from_snapshot(looped).is_err());
    }
}
