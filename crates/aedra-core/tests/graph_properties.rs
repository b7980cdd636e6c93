//! Property tests for the graph store invariants.
//!
//! Random operation sequences are applied to a store; after every step the
//! structural invariants, id monotonicity and notification atomicity are
//! checked.

use aedra_core::{
    EdgeId, Error, EventKind, EventRecorder, GraphStore, NewEdge, NewNode, NodeId, TraversalKind,
};
use proptest::{
    collection::vec,
    prelude::{prop_assert, prop_assert_eq, prop_oneof, Just, Strategy},
    proptest,
    test_runner::Config as ProptestConfig,
};
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};

const GRAPH_PROP_CASES: u32 = 128;

// Ids are drawn from a small range so operations regularly hit both live
// and missing nodes.
const ID_RANGE: u64 = 12;

#[derive(Debug, Clone)]
enum Op {
    Add { link: Option<u64> },
    Connect { start: u64, end: u64 },
    Delete { id: u64 },
    Update { id: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => proptest::option::of(0..ID_RANGE).prop_map(|link| Op::Add { link }),
        4 => (0..ID_RANGE, 0..ID_RANGE).prop_map(|(start, end)| Op::Connect { start, end }),
        1 => (0..ID_RANGE).prop_map(|id| Op::Delete { id }),
        1 => (0..ID_RANGE).prop_map(|id| Op::Update { id }),
    ]
}

fn edge_set(graph: &GraphStore) -> HashMap<(NodeId, NodeId), (EdgeId, serde_json::Value)> {
    let mut set = HashMap::new();
    for node in graph.nodes() {
        for neighbor in graph.neighbors(node.id).unwrap() {
            let edge = graph.edge_between(node.id, neighbor).unwrap();
            set.insert((node.id, neighbor), (edge.id, edge.value));
        }
    }
    set
}

/// Distances from `start` by a reference BFS
fn distances(graph: &GraphStore, start: NodeId) -> HashMap<NodeId, usize> {
    let mut dist = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        let d = dist[&node];
        for neighbor in graph.neighbors(node).unwrap() {
            if !dist.contains_key(&neighbor) {
                dist.insert(neighbor, d + 1);
                queue.push_back(neighbor);
            }
        }
    }
    dist
}

fn build(ops: &[Op]) -> GraphStore {
    let mut graph = GraphStore::new();
    for op in ops {
        match op {
            Op::Add { link } => {
                let mut new = NewNode::new("n");
                if let Some(target) = link {
                    new = new.linked_to(NodeId(*target));
                }
                let _ = graph.add_node(new);
            }
            Op::Connect { start, end } => {
                let _ = graph.connect(NewEdge::new(NodeId(*start), NodeId(*end)));
            }
            Op::Delete { id } => {
                let _ = graph.delete_node(NodeId(*id));
            }
            Op::Update { id } => {
                graph.update_node(NodeId(*id), json!("u"), None);
            }
        }
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: GRAPH_PROP_CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn invariants_hold_and_failures_are_silent(ops in vec(op_strategy(), 0..60)) {
        let mut graph = GraphStore::new();
        let events = EventRecorder::new();
        graph.subscribe(events.clone());

        let mut last_node: Option<NodeId> = None;
        let mut last_edge: Option<EdgeId> = None;
        let mut seen_nodes = HashSet::new();

        for op in ops {
            events.drain();
            let before = edge_set(&graph);
            let node_count = graph.node_count();

            match op {
                Op::Add { link } => {
                    let mut new = NewNode::new("n");
                    if let Some(target) = link {
                        new = new.linked_to(NodeId(target));
                    }
                    match graph.add_node(new) {
                        Ok(id) => {
                            prop_assert!(last_node.map_or(true, |last| id > last));
                            prop_assert!(seen_nodes.insert(id));
                            last_node = Some(id);
                            let expected = if link.is_some() { 4 } else { 1 };
                            prop_assert_eq!(events.len(), expected);
                            let created = events.events().last().and_then(|e| e.edge().cloned());
                            if let Some(edge) = created {
                                prop_assert!(last_edge.map_or(true, |last| edge.id > last));
                                last_edge = Some(edge.id);
                            }
                        }
                        Err(err) => {
                            prop_assert!(matches!(err, Error::UnknownNode(_)));
                            prop_assert!(events.is_empty());
                            prop_assert_eq!(graph.node_count(), node_count);
                        }
                    }
                }
                Op::Connect { start, end } => {
                    match graph.connect(NewEdge::new(NodeId(start), NodeId(end))) {
                        Ok(id) => {
                            prop_assert!(last_edge.map_or(true, |last| id > last));
                            last_edge = Some(id);
                            prop_assert_eq!(
                                events.kinds(),
                                vec![
                                    EventKind::NodeUpdated,
                                    EventKind::NodeUpdated,
                                    EventKind::EdgeCreated
                                ]
                            );
                        }
                        Err(_) => {
                            prop_assert!(events.is_empty());
                            prop_assert_eq!(edge_set(&graph), before);
                        }
                    }
                }
                Op::Delete { id } => {
                    let id = NodeId(id);
                    let former = graph.neighbors(id).ok();
                    match graph.delete_node(id) {
                        Ok(_) => {
                            let former = former.unwrap_or_default();
                            prop_assert_eq!(events.count(EventKind::EdgeDeleted), former.len());
                            prop_assert_eq!(events.count(EventKind::NodeUpdated), 2 * former.len());
                            prop_assert_eq!(events.count(EventKind::NodeDeleted), 1);
                            for neighbor in former {
                                prop_assert!(!graph.neighbors(neighbor).unwrap().contains(&id));
                            }
                            prop_assert!(!graph.contains_node(id));
                        }
                        Err(_) => {
                            prop_assert!(events.is_empty());
                            prop_assert_eq!(edge_set(&graph), before);
                        }
                    }
                }
                Op::Update { id } => {
                    let applied = graph.update_node(NodeId(id), json!("u"), None);
                    prop_assert_eq!(events.len(), usize::from(applied));
                }
            }

            let check = graph.check_invariants();
            prop_assert!(check.is_ok(), "invariant violated: {:?}", check);
        }
    }

    #[test]
    fn adjacency_is_symmetric(ops in vec(op_strategy(), 0..60)) {
        let graph = build(&ops);
        for node in graph.nodes() {
            for neighbor in graph.neighbors(node.id).unwrap() {
                prop_assert!(graph.neighbors(neighbor).unwrap().contains(&node.id));
                let forward = graph.edge_between(node.id, neighbor).unwrap();
                let backward = graph.edge_between(neighbor, node.id).unwrap();
                prop_assert_eq!(forward.id, backward.id);
                prop_assert_eq!(forward.value, backward.value);
            }
        }
    }

    #[test]
    fn traversals_visit_each_reachable_node_once(
        ops in vec(op_strategy(), 0..60),
        start in 0..ID_RANGE,
        kind in prop_oneof![Just(TraversalKind::BreadthFirst), Just(TraversalKind::DepthFirst)],
    ) {
        let mut graph = build(&ops);
        let start = NodeId(start);
        if !graph.contains_node(start) {
            let result = graph.traverse(kind, start);
            prop_assert!(matches!(result, Err(Error::InvalidStartNode(_))));
            return Ok(());
        }

        let dist = distances(&graph, start);
        let result = graph.traverse(kind, start).unwrap();

        prop_assert_eq!(result.order.len(), dist.len());
        let unique: HashSet<_> = result.order.iter().copied().collect();
        prop_assert_eq!(unique.len(), result.order.len());
        prop_assert!(result.order.iter().all(|n| dist.contains_key(n)));
        prop_assert_eq!(result.order[0], start);

        if kind == TraversalKind::BreadthFirst {
            let layers: Vec<usize> = result.order.iter().map(|n| dist[n]).collect();
            prop_assert!(layers.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn materialize_replays_the_graph(ops in vec(op_strategy(), 0..60)) {
        let mut graph = build(&ops);
        let events = EventRecorder::new();
        graph.subscribe(events.clone());
        graph.materialize();

        prop_assert_eq!(events.count(EventKind::NodeCreated), graph.node_count());
        prop_assert_eq!(events.count(EventKind::EdgeCreated), graph.edge_count());
        prop_assert_eq!(events.count(EventKind::NodeUpdated), 2 * graph.edge_count());

        let mut replayed = HashSet::new();
        for event in events.events() {
            if let Some(edge) = event.edge() {
                let key = (edge.start.min(edge.end), edge.start.max(edge.end));
                prop_assert!(replayed.insert(key));
            }
        }
    }
}
