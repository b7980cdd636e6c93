//! The graph store
//!
//! [`GraphStore`] owns the node table, the adjacency model and the id
//! allocator, and is the only writer of all three. Every successful mutation
//! reports its effects through the store's [`ChangeNotifier`]; a failed one
//! changes nothing and reports nothing.

use crate::adjacency::Adjacency;
use crate::edge::{Edge, EdgeEntry, NewEdge};
use crate::error::{Error, Result};
use crate::event::{ChangeNotifier, GraphEvent, Subscriber, SubscriptionId};
use crate::ids::{EdgeId, IdAllocator, NodeId};
use crate::node::{Coordinates, NewNode, Node, NodeSnapshot, Payload};
use crate::traversal::{
    shortest_path, CancellationToken, GraphPath, TraversalKind, TraversalResult, Visits,
};
use indexmap::IndexMap;

/// Undirected graph with change notifications
#[derive(Debug, Default)]
pub struct GraphStore {
    ids: IdAllocator,
    nodes: IndexMap<NodeId, Node>,
    adjacency: Adjacency,
    notifier: ChangeNotifier,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a store from already validated parts
    pub(crate) fn from_parts(
        ids: IdAllocator,
        nodes: IndexMap<NodeId, Node>,
        adjacency: Adjacency,
    ) -> Self {
        Self {
            ids,
            nodes,
            adjacency,
            notifier: ChangeNotifier::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) -> SubscriptionId {
        self.notifier.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a node, optionally connecting it to `new.link_target`.
    ///
    /// A link target that does not exist fails the whole operation with
    /// [`Error::UnknownNode`] before anything is allocated. So does an
    /// exhausted id space ([`Error::IdsExhausted`]).
    pub fn add_node(&mut self, new: NewNode) -> Result<NodeId> {
        if let Some(target) = new.link_target {
            self.require(target)?;
            self.ids.ensure_edge_available()?;
        }

        let id = self.ids.next_node_id()?;
        let link_target = new.link_target;
        self.nodes.insert(id, Node::from_new(id, new));
        self.adjacency.insert_row(id);
        tracing::debug!("Added node {}", id);
        self.emit_node(id, |node| GraphEvent::NodeCreated { node });

        if let Some(target) = link_target {
            // Cannot be a duplicate or a self-loop: `id` has no edges yet,
            // and edge capacity was checked above.
            self.link(target, id, Payload::Null)?;
        }

        Ok(id)
    }

    /// Delete a node together with every edge touching it
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node> {
        self.require(id)?;

        let neighbors: Vec<NodeId> = self.neighbor_iter(id).collect();
        for neighbor in neighbors {
            if let Some(entry) = self.adjacency.unlink(id, neighbor) {
                tracing::debug!("Cascade removed edge {} ({} <-> {})", entry.id, id, neighbor);
                self.emit_node(id, |node| GraphEvent::NodeUpdated { node });
                self.emit_node(neighbor, |node| GraphEvent::NodeUpdated { node });
                self.emit(GraphEvent::EdgeDeleted {
                    edge: entry.to_edge(id, neighbor),
                });
            }
        }

        let snapshot = self.snapshot_of(id);
        self.adjacency.remove_row(id);
        let removed = self.nodes.shift_remove(&id);
        if let Some(node) = snapshot {
            self.emit(GraphEvent::NodeDeleted { node });
        }
        tracing::debug!("Deleted node {}", id);

        removed.ok_or(Error::UnknownNode(id))
    }

    /// Connect two nodes.
    ///
    /// Fails with [`Error::DuplicateEdge`] (an ignored operation, see
    /// [`Error::is_ignored`]) when the pair is already adjacent.
    pub fn connect(&mut self, edge: NewEdge) -> Result<EdgeId> {
        let NewEdge { start, end, value } = edge;
        self.require(start)?;
        self.require(end)?;
        if start == end {
            return Err(Error::SelfLoop(start));
        }
        if self.adjacency.linked(start, end) {
            tracing::warn!("Edge {} <-> {} already exists, ignoring", start, end);
            return Err(Error::DuplicateEdge { start, end });
        }

        self.link(start, end, value)
    }

    /// Replace a node's value and coordinates.
    ///
    /// Unknown ids are ignored and reported as `false`: updates may arrive
    /// for nodes the presentation layer has not yet seen deleted.
    pub fn update_node(
        &mut self,
        id: NodeId,
        value: Payload,
        coordinates: Option<Coordinates>,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            tracing::debug!("Ignoring update for unknown node {}", id);
            return false;
        };

        node.value = value;
        node.coordinates = coordinates;
        self.emit_node(id, |node| GraphEvent::NodeUpdated { node });
        true
    }

    fn link(&mut self, start: NodeId, end: NodeId, value: Payload) -> Result<EdgeId> {
        let id = self.ids.next_edge_id()?;
        let entry = EdgeEntry { id, value };
        let edge = entry.to_edge(start, end);
        self.adjacency.link(start, end, entry);
        tracing::debug!("Connected {} <-> {} as edge {}", start, end, id);

        self.emit_node(start, |node| GraphEvent::NodeUpdated { node });
        self.emit_node(end, |node| GraphEvent::NodeUpdated { node });
        self.emit(GraphEvent::EdgeCreated { edge });
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Neighbors in the order their edges were created
    pub fn neighbors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.require(id)?;
        Ok(self.neighbor_iter(id).collect())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        self.snapshot_of(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every edge once, in replay order
    pub fn edges(&self) -> Vec<Edge> {
        self.adjacency.unique_edges()
    }

    /// The edge between `a` and `b`, oriented `a -> b`
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<Edge> {
        self.adjacency.entry(a, b).map(|entry| entry.to_edge(a, b))
    }

    /// Read-only view of the adjacency model
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub(crate) fn allocator(&self) -> &IdAllocator {
        &self.ids
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replay and traversal
    // ─────────────────────────────────────────────────────────────────────────

    /// Replay the whole graph as creation events: every node, then every
    /// edge exactly once.
    ///
    /// Each edge is reported the way [`connect`](Self::connect) reports it:
    /// both endpoints as `NodeUpdated`, then the `EdgeCreated`.
    pub fn materialize(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.emit_node(id, |node| GraphEvent::NodeCreated { node });
        }
        for edge in self.adjacency.unique_edges() {
            self.emit_node(edge.start, |node| GraphEvent::NodeUpdated { node });
            self.emit_node(edge.end, |node| GraphEvent::NodeUpdated { node });
            self.emit(GraphEvent::EdgeCreated { edge });
        }
        tracing::debug!(
            "Materialized {} nodes and {} edges",
            self.node_count(),
            self.edge_count()
        );
    }

    /// Lazy visit sequence without notifications
    pub fn visits(&self, kind: TraversalKind, start: NodeId) -> Result<Visits<'_>> {
        kind.strategy().visits(&self.adjacency, start)
    }

    /// Run a traversal, emitting one `VisitOrder` event per visited node
    pub fn traverse(&mut self, kind: TraversalKind, start: NodeId) -> Result<TraversalResult> {
        self.run_traversal(kind, start, None)
    }

    /// Like [`traverse`](Self::traverse), stopping once `token` is cancelled
    pub fn traverse_with_cancel(
        &mut self,
        kind: TraversalKind,
        start: NodeId,
        token: &CancellationToken,
    ) -> Result<TraversalResult> {
        self.run_traversal(kind, start, Some(token.clone()))
    }

    fn run_traversal(
        &mut self,
        kind: TraversalKind,
        start: NodeId,
        cancel: Option<CancellationToken>,
    ) -> Result<TraversalResult> {
        let mut visits = kind.strategy().visits(&self.adjacency, start)?;
        if let Some(token) = cancel {
            visits = visits.with_cancellation(token);
        }

        let mut order = Vec::new();
        for visit in visits.by_ref() {
            order.push(visit.node);
            if let Some(node) = snapshot(&self.nodes, &self.adjacency, visit.node) {
                self.notifier.publish(&GraphEvent::VisitOrder {
                    traversal: kind,
                    step: visit.step,
                    node,
                    via: visit.via,
                });
            }
        }

        let stats = visits.stats().clone();
        tracing::debug!(
            "{} from {} visited {} nodes, examined {} edges",
            kind,
            start,
            stats.nodes_visited,
            stats.edges_examined
        );

        Ok(TraversalResult {
            kind,
            start,
            order,
            stats,
        })
    }

    /// Fewest-edges path between two nodes
    pub fn shortest_path(&self, start: NodeId, target: NodeId) -> Result<Option<GraphPath>> {
        shortest_path(&self.adjacency, start, target)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invariants
    // ─────────────────────────────────────────────────────────────────────────

    /// Describe the first broken structural invariant, if any
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.nodes.len() != self.adjacency.len() {
            return Err(format!(
                "{} nodes but {} adjacency rows",
                self.nodes.len(),
                self.adjacency.len()
            ));
        }
        for id in self.adjacency.node_ids() {
            if !self.nodes.contains_key(&id) {
                return Err(format!("adjacency row {} has no node", id));
            }
        }
        for (id, node) in &self.nodes {
            if node.id != *id {
                return Err(format!("node {} stored under key {}", node.id, id));
            }
            if id.0 >= self.ids.peek_node() {
                return Err(format!("node id {} not below allocator", id));
            }
        }
        if let Some(violation) = self.adjacency.asymmetry() {
            return Err(violation);
        }
        for edge in self.adjacency.unique_edges() {
            if edge.id.0 >= self.ids.peek_edge() {
                return Err(format!("edge id {} not below allocator", edge.id));
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn require(&self, id: NodeId) -> Result<()> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    fn neighbor_iter(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.neighbors(id).into_iter().flatten()
    }

    fn snapshot_of(&self, id: NodeId) -> Option<NodeSnapshot> {
        snapshot(&self.nodes, &self.adjacency, id)
    }

    fn emit_node(&mut self, id: NodeId, event: impl FnOnce(NodeSnapshot) -> GraphEvent) {
        if let Some(node) = self.snapshot_of(id) {
            self.emit(event(node));
        }
    }

    fn emit(&mut self, event: GraphEvent) {
        self.notifier.publish(&event);
    }
}

fn snapshot(
    nodes: &IndexMap<NodeId, Node>,
    adjacency: &Adjacency,
    id: NodeId,
) -> Option<NodeSnapshot> {
    nodes.get(&id).map(|node| NodeSnapshot {
        node: node.clone(),
        neighbors: adjacency.neighbors(id).into_iter().flatten().collect(),
    })
}
