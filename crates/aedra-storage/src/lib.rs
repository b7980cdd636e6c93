//! AEDRA Storage - Snapshot persistence for graphs
//!
//! Graphs are saved whole, as a [`GraphSnapshot`](aedra_core::GraphSnapshot)
//! under a name, and restored with their id allocators intact.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod memory;
pub mod migration;
pub mod record;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use migration::{Migratable, SchemaVersion, CURRENT_VERSION};
pub use record::{validate_graph_name, GraphSummary, StoredGraph, MAX_GRAPH_NAME_LEN};
pub use traits::StorageBackend;

#[cfg(feature = "redb")]
pub use redb::RedbStorage;
