//! Symmetric adjacency model
//!
//! Each node owns a row mapping neighbor id to the shared edge entry. Rows
//! keep insertion order so neighbor queries, traversals and replays are
//! deterministic.

use crate::edge::{Edge, EdgeEntry};
use crate::ids::NodeId;
use indexmap::{IndexMap, IndexSet};

type Row = IndexMap<NodeId, EdgeEntry>;

/// Node id -> (neighbor id -> edge entry)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    rows: IndexMap<NodeId, Row>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.rows.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Neighbors of `node` in insertion order, `None` if the node has no row
    pub fn neighbors(&self, node: NodeId) -> Option<impl Iterator<Item = NodeId> + '_> {
        self.rows.get(&node).map(|row| row.keys().copied())
    }

    /// Neighbor ids paired with their edge entries
    pub fn entries(&self, node: NodeId) -> Option<impl Iterator<Item = (NodeId, &EdgeEntry)> + '_> {
        self.rows
            .get(&node)
            .map(|row| row.iter().map(|(id, entry)| (*id, entry)))
    }

    pub fn entry(&self, a: NodeId, b: NodeId) -> Option<&EdgeEntry> {
        self.rows.get(&a).and_then(|row| row.get(&b))
    }

    /// `true` if an edge exists in either direction
    pub fn linked(&self, a: NodeId, b: NodeId) -> bool {
        self.entry(a, b).is_some() || self.entry(b, a).is_some()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum::<usize>() / 2
    }

    /// Every undirected edge once, oriented from the node that comes first
    /// in row order.
    pub fn unique_edges(&self) -> Vec<Edge> {
        let mut visited: IndexSet<NodeId> = IndexSet::with_capacity(self.rows.len());
        let mut edges = Vec::with_capacity(self.edge_count());
        for (&node, row) in &self.rows {
            visited.insert(node);
            for (&neighbor, entry) in row {
                if !visited.contains(&neighbor) {
                    edges.push(entry.to_edge(node, neighbor));
                }
            }
        }
        edges
    }

    pub(crate) fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.rows.keys().copied()
    }

    pub(crate) fn insert_row(&mut self, node: NodeId) {
        let previous = self.rows.insert(node, Row::new());
        assert!(previous.is_none(), "adjacency row {} allocated twice", node);
    }

    /// Drop an (already emptied) row
    pub(crate) fn remove_row(&mut self, node: NodeId) {
        if let Some(row) = self.rows.shift_remove(&node) {
            assert!(row.is_empty(), "adjacency row {} removed with live edges", node);
        }
    }

    /// Write both directions of an edge. Both rows must exist and the pair
    /// must not be linked yet.
    pub(crate) fn link(&mut self, a: NodeId, b: NodeId, entry: EdgeEntry) {
        let forward = self
            .rows
            .get_mut(&a)
            .and_then(|row| row.insert(b, entry.clone()));
        let backward = self.rows.get_mut(&b).and_then(|row| row.insert(a, entry));
        assert!(
            forward.is_none() && backward.is_none(),
            "edge {} <-> {} written over an existing entry",
            a,
            b
        );
    }

    /// Remove both directions of an edge, returning the shared entry
    pub(crate) fn unlink(&mut self, a: NodeId, b: NodeId) -> Option<EdgeEntry> {
        let forward = self.rows.get_mut(&a).and_then(|row| row.shift_remove(&b));
        let backward = self.rows.get_mut(&b).and_then(|row| row.shift_remove(&a));
        match (forward, backward) {
            (Some(entry), Some(mirror)) => {
                assert_eq!(entry, mirror, "asymmetric edge {} <-> {}", a, b);
                Some(entry)
            }
            (None, None) => None,
            _ => panic!("asymmetric edge {} <-> {}", a, b),
        }
    }

    /// First symmetry violation, if any
    pub(crate) fn asymmetry(&self) -> Option<String> {
        for (&node, row) in &self.rows {
            for (&neighbor, entry) in row {
                if node == neighbor {
                    return Some(format!("self-loop on {}", node));
                }
                match self.entry(neighbor, node) {
                    Some(mirror) if mirror == entry => {}
                    Some(_) => {
                        return Some(format!("edge {} <-> {} differs by direction", node, neighbor))
                    }
                    None => return Some(format!("edge {} -> {} has no mirror", node, neighbor)),
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EdgeId;
    use serde_json::json;

    fn entry(id: u64) -> EdgeEntry {
        EdgeEntry {
            id: EdgeId(id),
            value: json!(null),
        }
    }

    #[test]
    fn test_link_is_symmetric() {
        let mut adj = Adjacency::new();
        adj.insert_row(NodeId(0));
        adj.insert_row(NodeId(1));
        adj.link(NodeId(0), NodeId(1), entry(0));

        assert!(adj.linked(NodeId(0), NodeId(1)));
        assert!(adj.linked(NodeId(1), NodeId(0)));
        assert_eq!(adj.edge_count(), 1);
        assert!(adj.asymmetry().is_none());
    }

    #[test]
    fn test_unlink_removes_both_directions() {
        let mut adj = Adjacency::new();
        for id in 0..3 {
            adj.insert_row(NodeId(id));
        }
        adj.link(NodeId(0), NodeId(1), entry(0));
        adj.link(NodeId(1), NodeId(2), entry(1));

        assert_eq!(adj.unlink(NodeId(1), NodeId(0)), Some(entry(0)));
        assert_eq!(adj.unlink(NodeId(1), NodeId(0)), None);
        assert_eq!(adj.neighbors(NodeId(1)).unwrap().collect::<Vec<_>>(), vec![NodeId(2)]);
        assert_eq!(adj.edge_count(), 1);
    }

    #[test]
    fn test_unique_edges_reports_each_edge_once() {
        let mut adj = Adjacency::new();
        for id in 0..3 {
            adj.insert_row(NodeId(id));
        }
        adj.link(NodeId(0), NodeId(1), entry(0));
        adj.link(NodeId(2), NodeId(0), entry(1));
        adj.link(NodeId(1), NodeId(2), entry(2));

        let edges = adj.unique_edges();
        let pairs: Vec<_> = edges.iter().map(|e| (e.start.0, e.end.0)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    #[should_panic(expected = "written over an existing entry")]
    fn test_double_link_panics() {
        let mut adj = Adjacency::new();
        adj.insert_row(NodeId(0));
        adj.insert_row(NodeId(1));
        adj.link(NodeId(0), NodeId(1), entry(0));
        adj.link(NodeId(1), NodeId(0), entry(1));
    }
}
