//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::migration::Migratable;
use crate::record::{validate_graph_name, GraphSummary, StoredGraph};
use crate::traits::StorageBackend;
use aedra_core::GraphSnapshot;
use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Mutex;

// Table definitions
const GRAPHS: TableDefinition<&str, &[u8]> = TableDefinition::new("graphs");
const META: TableDefinition<&str, u32> = TableDefinition::new("meta");

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// ReDB storage backend
///
/// Each graph is one row in `graphs`, keyed by name, holding the JSON
/// encoding of its [`StoredGraph`].
pub struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;
        let storage = Self { db: Mutex::new(db) };
        storage.migrate_to_latest()?;

        tracing::debug!("Opened graph database at {}", path.display());
        Ok(storage)
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

impl Migratable for RedbStorage {
    fn get_schema_version(&self) -> StorageResult<u32> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = match read_txn.open_table(META) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let version = table.get(SCHEMA_VERSION_KEY)?.map(|v| v.value());
        Ok(version.unwrap_or(0))
    }

    fn set_schema_version(&self, version: u32) -> StorageResult<()> {
        let db = self.lock()?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(META)?;
            table.insert(SCHEMA_VERSION_KEY, version)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn run_migration(&self, version: u32) -> StorageResult<()> {
        match version {
            1 => {
                let db = self.lock()?;
                let write_txn = db.begin_write()?;
                {
                    write_txn.open_table(GRAPHS)?;
                    write_txn.open_table(META)?;
                }
                write_txn.commit()?;
                Ok(())
            }
            other => Err(StorageError::Migration(format!(
                "no migration defined for schema version {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        read_txn.open_table(GRAPHS)?;
        Ok(true)
    }

    async fn save_graph(&self, name: &str, snapshot: &GraphSnapshot) -> StorageResult<StoredGraph> {
        validate_graph_name(name)?;
        let stored = StoredGraph::new(name, snapshot.clone());
        let value = serde_json::to_vec(&stored)?;

        let db = self.lock()?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(GRAPHS)?;
            table.insert(name, value.as_slice())?;
        }
        write_txn.commit()?;

        tracing::debug!(
            "Saved graph '{}' ({} nodes, {} edges)",
            name,
            snapshot.node_count(),
            snapshot.edge_count()
        );
        Ok(stored)
    }

    async fn load_graph(&self, name: &str) -> StorageResult<Option<StoredGraph>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(GRAPHS)?;

        if let Some(value) = table.get(name)? {
            let stored: StoredGraph = serde_json::from_slice(value.value())?;
            Ok(Some(stored))
        } else {
            Ok(None)
        }
    }

    async fn list_graphs(&self) -> StorageResult<Vec<GraphSummary>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(GRAPHS)?;

        let mut summaries = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let stored: StoredGraph = serde_json::from_slice(value.value())?;
            summaries.push(stored.summary());
        }

        Ok(summaries)
    }

    async fn delete_graph(&self, name: &str) -> StorageResult<bool> {
        let db = self.lock()?;
        let write_txn = db.begin_write()?;
        let removed;
        {
            let mut table = write_txn.open_table(GRAPHS)?;
            removed = table.remove(name)?.is_some();
        }
        write_txn.commit()?;

        if removed {
            tracing::debug!("Deleted graph '{}'", name);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::CURRENT_VERSION;
    use aedra_core::{GraphStore, NewEdge, NewNode, NodeId};
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_graph() -> GraphStore {
        let mut graph = GraphStore::new();
        let a = graph.add_node(NewNode::new("A")).unwrap();
        let b = graph.add_node(NewNode::new("B").linked_to(a)).unwrap();
        let c = graph.add_node(NewNode::new("C")).unwrap();
        graph
            .connect(NewEdge::new(b, c).with_value(json!(7)))
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn test_redb_storage() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        let storage = RedbStorage::open(&db_path).unwrap();
        storage.initialize().await.unwrap();
        assert!(storage.health_check().await.unwrap());

        let graph = sample_graph();
        storage.save_graph("lesson", &graph.snapshot()).await.unwrap();

        let restored = storage.open_store("lesson").await.unwrap();
        assert_eq!(restored.snapshot(), graph.snapshot());
        assert_eq!(
            restored.edge_between(NodeId(1), NodeId(2)).unwrap().value,
            json!(7)
        );

        assert!(storage.delete_graph("lesson").await.unwrap());
        assert!(storage.load_graph("lesson").await.unwrap().is_none());
        assert!(!storage.delete_graph("lesson").await.unwrap());
    }

    #[tokio::test]
    async fn test_reopen_keeps_graphs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("graphs.redb");

        {
            let storage = RedbStorage::open(&db_path).unwrap();
            storage.save_graph("b-graph", &sample_graph().snapshot()).await.unwrap();
            storage.save_graph("a-graph", &GraphStore::new().snapshot()).await.unwrap();
        }

        let storage = RedbStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_schema_version().unwrap(), CURRENT_VERSION);

        let listed = storage.list_graphs().await.unwrap();
        let names: Vec<_> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a-graph", "b-graph"]);
        assert_eq!(listed[1].node_count, 3);
        assert_eq!(listed[1].edge_count, 2);
    }

    #[tokio::test]
    async fn test_restored_graph_continues_ids() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("ids.redb")).unwrap();

        let mut graph = sample_graph();
        graph.delete_node(NodeId(2)).unwrap();
        storage.save_graph("g", &graph.snapshot()).await.unwrap();

        let mut restored = storage.open_store("g").await.unwrap();
        let id = restored.add_node(NewNode::new("D")).unwrap();
        assert_eq!(id, NodeId(3));
    }
}
