//! Thread-safe graph handle
//!
//! [`SharedGraph`] serializes all access to one [`GraphStore`] behind a
//! mutex. Events produced by an operation are buffered while the store is
//! locked and delivered only after the store guard is released, so
//! subscribers may read the graph from inside a callback. Mutating it from a
//! callback deadlocks on the delivery lock and is not allowed.

use crate::edge::NewEdge;
use crate::error::{Error, Result};
use crate::event::{ChangeNotifier, EventRecorder, GraphEvent, Subscriber, SubscriptionId};
use crate::graph::GraphStore;
use crate::ids::{EdgeId, NodeId};
use crate::node::{Coordinates, NewNode, Node, NodeSnapshot, Payload};
use crate::snapshot::GraphSnapshot;
use crate::traversal::{TraversalKind, TraversalResult};
use std::sync::{Arc, Mutex, MutexGuard};

struct Inner {
    store: Mutex<GraphStore>,
    outbox: EventRecorder,
    notifier: Mutex<ChangeNotifier>,
}

/// Cloneable, `Send + Sync` handle to a graph store
#[derive(Clone)]
pub struct SharedGraph {
    inner: Arc<Inner>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::from_store(GraphStore::new())
    }

    /// Wrap an existing store. Subscribers already registered on `store`
    /// keep receiving events synchronously, under the store lock.
    pub fn from_store(mut store: GraphStore) -> Self {
        let outbox = EventRecorder::new();
        store.subscribe(outbox.clone());
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                outbox,
                notifier: Mutex::new(ChangeNotifier::new()),
            }),
        }
    }

    pub fn subscribe(&self, subscriber: impl Subscriber + 'static) -> Result<SubscriptionId> {
        Ok(self.notifier()?.subscribe(subscriber))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        Ok(self.notifier()?.unsubscribe(id))
    }

    pub fn add_node(&self, new: NewNode) -> Result<NodeId> {
        self.mutate(|store| store.add_node(new))
    }

    pub fn delete_node(&self, id: NodeId) -> Result<Node> {
        self.mutate(|store| store.delete_node(id))
    }

    pub fn connect(&self, edge: NewEdge) -> Result<EdgeId> {
        self.mutate(|store| store.connect(edge))
    }

    pub fn update_node(
        &self,
        id: NodeId,
        value: Payload,
        coordinates: Option<Coordinates>,
    ) -> Result<bool> {
        self.mutate(|store| Ok(store.update_node(id, value, coordinates)))
    }

    pub fn traverse(&self, kind: TraversalKind, start: NodeId) -> Result<TraversalResult> {
        self.mutate(|store| store.traverse(kind, start))
    }

    pub fn materialize(&self) -> Result<()> {
        self.mutate(|store| {
            store.materialize();
            Ok(())
        })
    }

    pub fn neighbors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.store()?.neighbors(id)
    }

    pub fn node_snapshot(&self, id: NodeId) -> Result<Option<NodeSnapshot>> {
        Ok(self.store()?.node_snapshot(id))
    }

    pub fn node_count(&self) -> Result<usize> {
        Ok(self.store()?.node_count())
    }

    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(self.store()?.snapshot())
    }

    /// Run `op` under the store lock, then deliver its events with the store
    /// unlocked.
    fn mutate<T>(&self, op: impl FnOnce(&mut GraphStore) -> Result<T>) -> Result<T> {
        // Taking the delivery lock first keeps each operation's events
        // contiguous and in order across threads.
        let mut notifier = self.notifier()?;
        let (result, events) = {
            let mut store = self.store()?;
            let result = op(&mut store);
            (result, self.inner.outbox.drain())
        };
        deliver(&mut notifier, &events);
        result
    }

    fn store(&self) -> Result<MutexGuard<'_, GraphStore>> {
        self.inner
            .store
            .lock()
            .map_err(|e| Error::Internal(format!("Graph lock poisoned: {}", e)))
    }

    fn notifier(&self) -> Result<MutexGuard<'_, ChangeNotifier>> {
        self.inner
            .notifier
            .lock()
            .map_err(|e| Error::Internal(format!("Notifier lock poisoned: {}", e)))
    }
}

impl Default for SharedGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(notifier: &mut ChangeNotifier, events: &[GraphEvent]) {
    if !events.is_empty() {
        tracing::trace!("Delivering {} buffered events", events.len());
    }
    notifier.publish_all(events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use std::thread;

    #[test]
    fn test_shared_graph_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedGraph>();
    }

    #[test]
    fn test_events_delivered_after_operation() {
        let graph = SharedGraph::new();
        let events = EventRecorder::new();
        graph.subscribe(events.clone()).unwrap();

        let a = graph.add_node(NewNode::new("A")).unwrap();
        graph.add_node(NewNode::new("B").linked_to(a)).unwrap();

        assert_eq!(
            events.kinds(),
            vec![
                EventKind::NodeCreated,
                EventKind::NodeCreated,
                EventKind::NodeUpdated,
                EventKind::NodeUpdated,
                EventKind::EdgeCreated
            ]
        );
    }

    #[test]
    fn test_subscriber_can_read_during_delivery() {
        let graph = SharedGraph::new();
        let reader = graph.clone();
        let counts = Arc::new(Mutex::new(Vec::new()));
        let sink = counts.clone();
        graph
            .subscribe(move |_: &GraphEvent| {
                let count = reader.node_count().unwrap();
                sink.lock().unwrap().push(count);
            })
            .unwrap();

        graph.add_node(NewNode::new("A")).unwrap();
        assert_eq!(*counts.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_failed_operation_delivers_nothing() {
        let graph = SharedGraph::new();
        let events = EventRecorder::new();
        graph.subscribe(events.clone()).unwrap();

        assert!(graph.delete_node(NodeId(0)).is_err());
        assert!(events.is_empty());
    }

    #[test]
    fn test_concurrent_writers_get_unique_ids() {
        let graph = SharedGraph::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let graph = graph.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|i| graph.add_node(NewNode::new(t * 100 + i)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<NodeId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
        assert_eq!(graph.node_count().unwrap(), 100);
    }
}
