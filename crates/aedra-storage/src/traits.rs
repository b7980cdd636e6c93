//! Storage backend trait definitions

use crate::error::StorageResult;
use crate::record::{GraphSummary, StoredGraph};
use aedra_core::{GraphSnapshot, GraphStore};
use async_trait::async_trait;

/// Trait for storage backend implementations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn initialize(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    /// Save a snapshot under `name`, replacing any previous one
    async fn save_graph(&self, name: &str, snapshot: &GraphSnapshot) -> StorageResult<StoredGraph>;

    /// Load the snapshot stored under `name`
    async fn load_graph(&self, name: &str) -> StorageResult<Option<StoredGraph>>;

    /// List stored graphs, sorted by name
    async fn list_graphs(&self) -> StorageResult<Vec<GraphSummary>>;

    /// Delete a stored graph; `false` if there was nothing to delete
    async fn delete_graph(&self, name: &str) -> StorageResult<bool>;

    /// Restore the graph stored under `name`, or start an empty one
    async fn open_store(&self, name: &str) -> StorageResult<GraphStore> {
        match self.load_graph(name).await? {
            Some(stored) => Ok(GraphStore::from_snapshot(stored.snapshot)?),
            None => {
                tracing::debug!("No stored graph '{}', starting empty", name);
                Ok(GraphStore::new())
            }
        }
    }
}
