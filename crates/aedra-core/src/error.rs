//! Error types for AEDRA Core

use crate::ids::NodeId;
use thiserror::Error;

/// Result type alias using AEDRA's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by graph operations.
///
/// Every variant is recoverable: the store is left untouched and no event is
/// emitted when one of these is returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Edge already exists: {start} <-> {end}")]
    DuplicateEdge { start: NodeId, end: NodeId },

    #[error("Self-loop rejected on node {0}")]
    SelfLoop(NodeId),

    #[error("Invalid traversal start node: {0}")]
    InvalidStartNode(NodeId),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("No {0} ids left to allocate")]
    IdsExhausted(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// `true` for conditions that signal an ignored operation rather than a failure.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::DuplicateEdge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateEdge {
            start: NodeId(0),
            end: NodeId(1),
        };
        assert_eq!(err.to_string(), "Edge already exists: 0 <-> 1");
        assert!(err.is_ignored());
        assert!(!Error::UnknownNode(NodeId(3)).is_ignored());
    }
}
