//! In-memory storage backend for testing

use crate::error::{StorageError, StorageResult};
use crate::record::{validate_graph_name, GraphSummary, StoredGraph};
use crate::traits::StorageBackend;
use aedra_core::GraphSnapshot;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory storage backend
///
/// Useful for testing and temporary storage.
pub struct MemoryStorage {
    graphs: RwLock<BTreeMap<String, StoredGraph>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            graphs: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn save_graph(&self, name: &str, snapshot: &GraphSnapshot) -> StorageResult<StoredGraph> {
        validate_graph_name(name)?;
        let stored = StoredGraph::new(name, snapshot.clone());

        let mut graphs = self
            .graphs
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        graphs.insert(name.to_string(), stored.clone());
        Ok(stored)
    }

    async fn load_graph(&self, name: &str) -> StorageResult<Option<StoredGraph>> {
        let graphs = self
            .graphs
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(graphs.get(name).cloned())
    }

    async fn list_graphs(&self) -> StorageResult<Vec<GraphSummary>> {
        let graphs = self
            .graphs
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(graphs.values().map(StoredGraph::summary).collect())
    }

    async fn delete_graph(&self, name: &str) -> StorageResult<bool> {
        let mut graphs = self
            .graphs
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))?;
        Ok(graphs.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aedra_core::{GraphStore, NewNode, NodeId};

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.initialize().await.unwrap();

        let mut graph = GraphStore::new();
        let a = graph.add_node(NewNode::new("A")).unwrap();
        graph.add_node(NewNode::new("B").linked_to(a)).unwrap();

        storage.save_graph("lesson", &graph.snapshot()).await.unwrap();

        let restored = storage.open_store("lesson").await.unwrap();
        assert_eq!(restored.neighbors(NodeId(0)).unwrap(), vec![NodeId(1)]);

        let listed = storage.list_graphs().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].edge_count, 1);

        assert!(storage.delete_graph("lesson").await.unwrap());
        assert!(!storage.delete_graph("lesson").await.unwrap());
        assert!(storage.load_graph("lesson").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_missing_graph_is_empty() {
        let storage = MemoryStorage::new();
        let graph = storage.open_store("nothing-here").await.unwrap();
        assert!(graph.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_name_rejected() {
        let storage = MemoryStorage::new();
        let err = storage
            .save_graph("bad name", &GraphSnapshot::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidGraphName { .. }));
    }
}
