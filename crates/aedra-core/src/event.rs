//! Change notifications
//!
//! The store reports every structural change and every traversal visit as a
//! [`GraphEvent`] carrying a full snapshot of the affected entity, so a
//! consumer can render it without replaying history.
//!
//! Delivery is synchronous: each subscriber is called once per event, in
//! emission order, before the triggering operation returns. Subscribers must
//! not call back into the store that is notifying them.

use crate::edge::Edge;
use crate::ids::NodeId;
use crate::node::NodeSnapshot;
use crate::traversal::TraversalKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Event record emitted by the graph store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GraphEvent {
    NodeCreated {
        node: NodeSnapshot,
    },
    NodeUpdated {
        node: NodeSnapshot,
    },
    NodeDeleted {
        node: NodeSnapshot,
    },
    EdgeCreated {
        edge: Edge,
    },
    EdgeDeleted {
        edge: Edge,
    },
    VisitOrder {
        traversal: TraversalKind,
        step: usize,
        node: NodeSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        via: Option<Edge>,
    },
}

/// Tag of a [`GraphEvent`], handy for counting and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NodeCreated,
    NodeUpdated,
    NodeDeleted,
    EdgeCreated,
    EdgeDeleted,
    VisitOrder,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NodeCreated => "node_created",
            Self::NodeUpdated => "node_updated",
            Self::NodeDeleted => "node_deleted",
            Self::EdgeCreated => "edge_created",
            Self::EdgeDeleted => "edge_deleted",
            Self::VisitOrder => "visit_order",
        };
        f.write_str(name)
    }
}

impl GraphEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NodeCreated { .. } => EventKind::NodeCreated,
            Self::NodeUpdated { .. } => EventKind::NodeUpdated,
            Self::NodeDeleted { .. } => EventKind::NodeDeleted,
            Self::EdgeCreated { .. } => EventKind::EdgeCreated,
            Self::EdgeDeleted { .. } => EventKind::EdgeDeleted,
            Self::VisitOrder { .. } => EventKind::VisitOrder,
        }
    }

    /// The node this event is about, for node and visit events
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::NodeCreated { node }
            | Self::NodeUpdated { node }
            | Self::NodeDeleted { node }
            | Self::VisitOrder { node, .. } => Some(node.id()),
            Self::EdgeCreated { .. } | Self::EdgeDeleted { .. } => None,
        }
    }

    /// The edge this event is about, for edge events
    pub fn edge(&self) -> Option<&Edge> {
        match self {
            Self::EdgeCreated { edge } | Self::EdgeDeleted { edge } => Some(edge),
            _ => None,
        }
    }
}

/// Receiver of graph events
pub trait Subscriber: Send {
    fn on_event(&mut self, event: &GraphEvent);
}

impl<F> Subscriber for F
where
    F: FnMut(&GraphEvent) + Send,
{
    fn on_event(&mut self, event: &GraphEvent) {
        self(event)
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Synchronous broadcast channel scoped to one graph
#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: Vec<(SubscriptionId, Box<dyn Subscriber>)>,
    next_id: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        tracing::debug!("Subscriber {:?} registered", id);
        id
    }

    /// Remove a subscriber; `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    /// Deliver one event to every subscriber, in subscription order
    pub fn publish(&mut self, event: &GraphEvent) {
        tracing::trace!("Publishing {} to {} subscribers", event.kind(), self.subscribers.len());
        for (_, subscriber) in &mut self.subscribers {
            subscriber.on_event(event);
        }
    }

    pub fn publish_all<'a>(&mut self, events: impl IntoIterator<Item = &'a GraphEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Subscriber that records events into a shared buffer.
///
/// Clones share the same buffer, so one clone can be handed to the notifier
/// while another is kept to inspect what was delivered.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<GraphEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking subscriber cannot leave the buffer half-written, so a
    // poisoned lock is still safe to read.
    fn buffer(&self) -> MutexGuard<'_, Vec<GraphEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<GraphEvent> {
        self.buffer().clone()
    }

    /// Take every recorded event, leaving the buffer empty
    pub fn drain(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.buffer())
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.buffer().iter().map(GraphEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.buffer().iter().filter(|e| e.kind() == kind).count()
    }
}

impl Subscriber for EventRecorder {
    fn on_event(&mut self, event: &GraphEvent) {
        self.buffer().push(event.clone());
    }
}
