//! Graph traversal strategies
//!
//! Strategies read the adjacency model and yield a lazy sequence of
//! [`Visit`]s. The graph store drives that sequence and turns every visit
//! into a `VisitOrder` event.

use crate::adjacency::Adjacency;
use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Available traversal strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalKind {
    #[serde(rename = "bfs")]
    BreadthFirst,
    #[serde(rename = "dfs")]
    DepthFirst,
}

impl TraversalKind {
    pub fn strategy(&self) -> &'static dyn TraversalStrategy {
        match self {
            Self::BreadthFirst => &BreadthFirst,
            Self::DepthFirst => &DepthFirst,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BreadthFirst => "bfs",
            Self::DepthFirst => "dfs",
        }
    }
}

impl fmt::Display for TraversalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraversalKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bfs" | "breadth-first" | "breadth_first" => Ok(Self::BreadthFirst),
            "dfs" | "depth-first" | "depth_first" => Ok(Self::DepthFirst),
            other => Err(format!("unknown traversal '{}' (expected bfs or dfs)", other)),
        }
    }
}

/// One node becoming visited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Zero-based position in the visit order
    pub step: usize,
    pub node: NodeId,
    /// Edge used to reach `node`; `None` for the start node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<Edge>,
}

/// A traversal algorithm over the adjacency model
pub trait TraversalStrategy: Send + Sync {
    fn kind(&self) -> TraversalKind;

    /// Start a traversal from `start`.
    ///
    /// Fails with [`Error::InvalidStartNode`] before yielding anything if
    /// `start` is not in the graph.
    fn visits<'g>(&self, adjacency: &'g Adjacency, start: NodeId) -> Result<Visits<'g>>;
}

/// FIFO frontier: every node at distance `k` is visited before any node at
/// distance `k + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreadthFirst;

impl TraversalStrategy for BreadthFirst {
    fn kind(&self) -> TraversalKind {
        TraversalKind::BreadthFirst
    }

    fn visits<'g>(&self, adjacency: &'g Adjacency, start: NodeId) -> Result<Visits<'g>> {
        if !adjacency.contains(start) {
            return Err(Error::InvalidStartNode(start));
        }
        let mut frontier = VecDeque::new();
        frontier.push_back(Pending::root(start));
        let mut visits = Visits::new(adjacency, self.kind(), Frontier::Queue(frontier));
        // Marked on enqueue, so a node is queued at most once.
        visits.seen.insert(start);
        Ok(visits)
    }
}

/// LIFO frontier on an explicit stack; a node is visited the first time it
/// is popped unvisited.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirst;

impl TraversalStrategy for DepthFirst {
    fn kind(&self) -> TraversalKind {
        TraversalKind::DepthFirst
    }

    fn visits<'g>(&self, adjacency: &'g Adjacency, start: NodeId) -> Result<Visits<'g>> {
        if !adjacency.contains(start) {
            return Err(Error::InvalidStartNode(start));
        }
        Ok(Visits::new(
            adjacency,
            self.kind(),
            Frontier::Stack(vec![Pending::root(start)]),
        ))
    }
}

#[derive(Debug, Clone)]
struct Pending {
    node: NodeId,
    via: Option<Edge>,
}

impl Pending {
    fn root(node: NodeId) -> Self {
        Self { node, via: None }
    }
}

#[derive(Debug)]
enum Frontier {
    Queue(VecDeque<Pending>),
    Stack(Vec<Pending>),
}

impl Frontier {
    fn clear(&mut self) {
        match self {
            Self::Queue(queue) => queue.clear(),
            Self::Stack(stack) => stack.clear(),
        }
    }
}

/// Shared flag for stopping a traversal between two visits
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Traversal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub edges_examined: usize,
    pub cancelled: bool,
}

/// Lazy, finite, non-restartable visit sequence
#[derive(Debug)]
pub struct Visits<'g> {
    adjacency: &'g Adjacency,
    kind: TraversalKind,
    frontier: Frontier,
    seen: HashSet<NodeId>,
    stats: TraversalStats,
    cancel: Option<CancellationToken>,
}

impl<'g> Visits<'g> {
    fn new(adjacency: &'g Adjacency, kind: TraversalKind, frontier: Frontier) -> Self {
        Self {
            adjacency,
            kind,
            frontier,
            seen: HashSet::new(),
            stats: TraversalStats::default(),
            cancel: None,
        }
    }

    /// Stop yielding once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    fn next_unvisited(&mut self) -> Option<Pending> {
        match &mut self.frontier {
            Frontier::Queue(queue) => queue.pop_front(),
            Frontier::Stack(stack) => {
                while let Some(pending) = stack.pop() {
                    if self.seen.insert(pending.node) {
                        return Some(pending);
                    }
                }
                None
            }
        }
    }

    fn expand(&mut self, node: NodeId) {
        let Some(entries) = self.adjacency.entries(node) else {
            return;
        };
        match &mut self.frontier {
            Frontier::Queue(queue) => {
                for (neighbor, entry) in entries {
                    self.stats.edges_examined += 1;
                    if self.seen.insert(neighbor) {
                        queue.push_back(Pending {
                            node: neighbor,
                            via: Some(entry.to_edge(node, neighbor)),
                        });
                    }
                }
            }
            Frontier::Stack(stack) => {
                let entries: Vec<_> = entries.collect();
                self.stats.edges_examined += entries.len();
                // Reversed so the first neighbor is popped first.
                for (neighbor, entry) in entries.into_iter().rev() {
                    if !self.seen.contains(&neighbor) {
                        stack.push(Pending {
                            node: neighbor,
                            via: Some(entry.to_edge(node, neighbor)),
                        });
                    }
                }
            }
        }
    }
}

impl Iterator for Visits<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            if !self.stats.cancelled {
                tracing::debug!(
                    "{} traversal cancelled after {} visits",
                    self.kind,
                    self.stats.nodes_visited
                );
            }
            self.stats.cancelled = true;
            self.frontier.clear();
            return None;
        }

        let Pending { node, via } = self.next_unvisited()?;
        self.expand(node);

        let visit = Visit {
            step: self.stats.nodes_visited,
            node,
            via,
        };
        self.stats.nodes_visited += 1;
        Some(visit)
    }
}

/// Outcome of a traversal driven by the graph store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalResult {
    pub kind: TraversalKind,
    pub start: NodeId,
    /// Visited nodes in visit order
    pub order: Vec<NodeId>,
    pub stats: TraversalStats,
}

/// A path through the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    /// Ordered node ids from start to target
    pub nodes: Vec<NodeId>,

    /// Edges connecting consecutive nodes, oriented along the path
    pub edges: Vec<Edge>,

    /// Number of edges
    pub length: usize,
}

/// Fewest-edges path from `start` to `target`, using the BFS frontier.
///
/// `Ok(None)` when `target` is in another component.
pub fn shortest_path(
    adjacency: &Adjacency,
    start: NodeId,
    target: NodeId,
) -> Result<Option<GraphPath>> {
    if !adjacency.contains(target) {
        return Err(Error::UnknownNode(target));
    }

    let mut parent: HashMap<NodeId, Edge> = HashMap::new();
    let mut found = false;
    for visit in BreadthFirst.visits(adjacency, start)? {
        if let Some(edge) = visit.via {
            parent.insert(visit.node, edge);
        }
        if visit.node == target {
            found = true;
            break;
        }
    }

    if !found {
        tracing::debug!("No path from {} to {}", start, target);
        return Ok(None);
    }

    Ok(Some(reconstruct_path(start, target, &parent)))
}

fn reconstruct_path(start: NodeId, target: NodeId, parent: &HashMap<NodeId, Edge>) -> GraphPath {
    let mut nodes = vec![target];
    let mut edges = Vec::new();
    let mut current = target;

    while current != start {
        match parent.get(&current) {
            Some(edge) => {
                edges.push(edge.clone());
                nodes.push(edge.start);
                current = edge.start;
            }
            None => break,
        }
    }

    nodes.reverse();
    edges.reverse();

    GraphPath {
        length: edges.len(),
        nodes,
        edges,
    }
}
