//! AEDRA Core - Graph engine for data structure visualization
//!
//! This crate provides the undirected graph store, its traversal strategies
//! and the change-notification protocol consumed by presentation layers.

pub mod adjacency;
pub mod command;
pub mod edge;
pub mod error;
pub mod event;
pub mod graph;
pub mod ids;
pub mod node;
pub mod shared;
pub mod snapshot;
pub mod traversal;

pub use adjacency::Adjacency;
pub use command::{Command, Outcome};
pub use edge::{Edge, EdgeEntry, NewEdge};
pub use error::{Error, Result};
pub use event::{ChangeNotifier, EventKind, EventRecorder, GraphEvent, Subscriber, SubscriptionId};
pub use graph::GraphStore;
pub use ids::{EdgeId, IdAllocator, NodeId};
pub use node::{Coordinates, NewNode, Node, NodeSnapshot, Payload};
pub use shared::SharedGraph;
pub use snapshot::GraphSnapshot;
pub use traversal::{
    shortest_path, BreadthFirst, CancellationToken, DepthFirst, GraphPath, TraversalKind,
    TraversalResult, TraversalStats, TraversalStrategy, Visit, Visits,
};
