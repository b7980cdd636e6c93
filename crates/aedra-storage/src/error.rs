//! Storage error types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    #[error("Invalid graph name '{name}': {reason}")]
    InvalidGraphName { name: String, reason: String },

    #[error("Graph error: {0}")]
    Graph(#[from] aedra_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[cfg(feature = "redb")]
    #[error("ReDB error: {0}")]
    Redb(#[from] ::redb::Error),

    #[cfg(feature = "redb")]
    #[error("ReDB database error: {0}")]
    RedbDatabase(#[from] ::redb::DatabaseError),

    #[cfg(feature = "redb")]
    #[error("ReDB table error: {0}")]
    RedbTable(#[from] ::redb::TableError),

    #[cfg(feature = "redb")]
    #[error("ReDB storage error: {0}")]
    RedbStorage(#[from] ::redb::StorageError),

    #[cfg(feature = "redb")]
    #[error("ReDB commit error: {0}")]
    RedbCommit(#[from] ::redb::CommitError),

    #[cfg(feature = "redb")]
    #[error("ReDB transaction error: {0}")]
    RedbTransaction(#[from] ::redb::TransactionError),
}
