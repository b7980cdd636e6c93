//! Node and edge identifiers and their allocator

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Identifier attached to an edge's notification records.
///
/// Edges are looked up by their endpoint pair, never by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        EdgeId(id)
    }
}

/// Monotonic id source owned by a single graph instance.
///
/// Ids start at 0 and are never handed out twice, even after the entity
/// they named has been deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next_node: u64,
    next_edge: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume allocation at saved positions (used when restoring a snapshot).
    pub fn resume_at(next_node: u64, next_edge: u64) -> Self {
        Self {
            next_node,
            next_edge,
        }
    }

    /// Hand out the next node id, failing once the id space is used up.
    ///
    /// A failed call leaves the allocator unchanged.
    pub fn next_node_id(&mut self) -> Result<NodeId> {
        let id = NodeId(self.next_node);
        self.next_node = advance(self.next_node, "node")?;
        Ok(id)
    }

    pub fn next_edge_id(&mut self) -> Result<EdgeId> {
        let id = EdgeId(self.next_edge);
        self.next_edge = advance(self.next_edge, "edge")?;
        Ok(id)
    }

    /// Fail if `next_edge_id` would fail, without allocating
    pub fn ensure_edge_available(&self) -> Result<()> {
        advance(self.next_edge, "edge").map(|_| ())
    }

    /// The id the next `next_node_id` call will return
    pub fn peek_node(&self) -> u64 {
        self.next_node
    }

    /// The id the next `next_edge_id` call will return
    pub fn peek_edge(&self) -> u64 {
        self.next_edge
    }
}

fn advance(position: u64, kind: &'static str) -> Result<u64> {
    position.checked_add(1).ok_or(Error::IdsExhausted(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_starts_at_zero() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_node_id().unwrap(), NodeId(0));
        assert_eq!(ids.next_node_id().unwrap(), NodeId(1));
        assert_eq!(ids.next_edge_id().unwrap(), EdgeId(0));
        assert_eq!(ids.peek_node(), 2);
        assert_eq!(ids.peek_edge(), 1);
    }

    #[test]
    fn test_node_and_edge_counters_are_independent() {
        let mut ids = IdAllocator::new();
        ids.next_edge_id().unwrap();
        ids.next_edge_id().unwrap();
        assert_eq!(ids.next_node_id().unwrap(), NodeId(0));
        assert_eq!(ids.next_edge_id().unwrap(), EdgeId(2));
    }

    #[test]
    fn test_resume_at() {
        let mut ids = IdAllocator::resume_at(7, 3);
        assert_eq!(ids.next_node_id().unwrap(), NodeId(7));
        assert_eq!(ids.next_edge_id().unwrap(), EdgeId(3));
    }

    #[test]
    fn test_exhausted_counters_fail_without_wrapping() {
        let mut ids = IdAllocator::resume_at(u64::MAX, u64::MAX - 1);

        assert!(matches!(ids.next_node_id(), Err(Error::IdsExhausted("node"))));
        assert_eq!(ids.peek_node(), u64::MAX);

        assert!(ids.ensure_edge_available().is_ok());
        assert_eq!(ids.next_edge_id().unwrap(), EdgeId(u64::MAX - 1));
        assert!(ids.ensure_edge_available().is_err());
        assert!(matches!(ids.next_edge_id(), Err(Error::IdsExhausted("edge"))));
        assert_eq!(ids.peek_edge(), u64::MAX);
    }

    #[test]
    fn test_ids_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&NodeId(4)).unwrap(), "4");
        let id: EdgeId = serde_json::from_str("9").unwrap();
        assert_eq!(id, EdgeId(9));
    }
}
