//! Node types

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};

/// Opaque application payload carried by nodes and edges
pub type Payload = serde_json::Value;

/// Spatial hint for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A node in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Allocated at creation, immutable afterwards
    pub id: NodeId,

    /// Application-defined payload
    pub value: Payload,

    /// Optional position hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,

    /// Node this one was linked to when it was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<NodeId>,
}

impl Node {
    pub(crate) fn from_new(id: NodeId, new: NewNode) -> Self {
        Self {
            id,
            value: new.value,
            coordinates: new.coordinates,
            link_target: new.link_target,
        }
    }
}

/// Data for creating a new node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    #[serde(default)]
    pub value: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<NodeId>,
}

impl NewNode {
    pub fn new(value: impl Into<Payload>) -> Self {
        Self {
            value: value.into(),
            coordinates: None,
            link_target: None,
        }
    }

    pub fn at(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Connect the new node to `target` as part of the same operation
    pub fn linked_to(mut self, target: NodeId) -> Self {
        self.link_target = Some(target);
        self
    }
}

/// Full view of a node as carried by events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(flatten)]
    pub node: Node,

    /// Current neighbors in adjacency order
    pub neighbors: Vec<NodeId>,
}

impl NodeSnapshot {
    pub fn id(&self) -> NodeId {
        self.node.id
    }
}
