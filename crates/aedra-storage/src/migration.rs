//! Schema migrations for graph storage backends
//!
//! The schema version lives next to the data. Backends bring it up to
//! [`CURRENT_VERSION`] when they open, one step at a time.

use crate::{StorageError, StorageResult};

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

/// One step of the schema history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub version: u32,
    pub description: &'static str,
}

const HISTORY: &[SchemaVersion] = &[SchemaVersion {
    version: 1,
    description: "Named graph snapshots stored as JSON",
}];

/// All schema versions, oldest first
pub fn get_migrations() -> &'static [SchemaVersion] {
    HISTORY
}

/// Steps needed to go from `from` to `to`
pub fn pending(from: u32, to: u32) -> impl Iterator<Item = &'static SchemaVersion> {
    HISTORY
        .iter()
        .filter(move |step| step.version > from && step.version <= to)
}

/// Migration trait for storage backends
pub trait Migratable {
    /// Schema version recorded in storage; 0 for a fresh store
    fn get_schema_version(&self) -> StorageResult<u32>;

    fn set_schema_version(&self, version: u32) -> StorageResult<()>;

    /// Apply the changes introduced by `version`
    fn run_migration(&self, version: u32) -> StorageResult<()>;

    /// Run every pending step up to `target`, returning how many ran.
    ///
    /// Data written by a newer schema is refused rather than read.
    fn migrate_to(&self, target: u32) -> StorageResult<usize> {
        let current = self.get_schema_version()?;
        if current > target {
            return Err(StorageError::Migration(format!(
                "stored schema v{} is newer than supported v{}",
                current, target
            )));
        }

        let mut applied = 0;
        for step in pending(current, target) {
            tracing::info!("Migrating schema to v{}: {}", step.version, step.description);
            self.run_migration(step.version)?;
            self.set_schema_version(step.version)?;
            applied += 1;
        }
        if applied == 0 {
            tracing::debug!("Schema already at v{}", current);
        }
        Ok(applied)
    }

    fn migrate_to_latest(&self) -> StorageResult<usize> {
        self.migrate_to(CURRENT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded {
        version: Mutex<u32>,
        ran: Mutex<Vec<u32>>,
    }

    impl Migratable for Recorded {
        fn get_schema_version(&self) -> StorageResult<u32> {
            Ok(*self.version.lock().unwrap())
        }

        fn set_schema_version(&self, version: u32) -> StorageResult<()> {
            *self.version.lock().unwrap() = version;
            Ok(())
        }

        fn run_migration(&self, version: u32) -> StorageResult<()> {
            self.ran.lock().unwrap().push(version);
            Ok(())
        }
    }

    #[test]
    fn test_latest_migration_is_current() {
        let latest = get_migrations().last().map(|m| m.version);
        assert_eq!(latest, Some(CURRENT_VERSION));
    }

    #[test]
    fn test_fresh_store_migrates_once() {
        let store = Recorded::default();
        assert_eq!(store.migrate_to_latest().unwrap(), 1);
        assert_eq!(*store.ran.lock().unwrap(), vec![1]);
        assert_eq!(store.migrate_to_latest().unwrap(), 0);
    }

    #[test]
    fn test_newer_schema_refused() {
        let store = Recorded::default();
        store.set_schema_version(CURRENT_VERSION + 1).unwrap();
        assert!(matches!(
            store.migrate_to_latest(),
            Err(StorageError::Migration(_))
        ));
        assert!(store.ran.lock().unwrap().is_empty());
    }
}
