//! In-process snapshot store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{SnapshotStore, StorageError};
use crate::models::{Catalog, Snapshot};

/// Snapshot kept in memory; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self) -> Result<Option<Snapshot>, StorageError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn write(&self, catalog: &Catalog, expected_version: u64) -> Result<u64, StorageError> {
        let mut guard = self.snapshot.lock().await;
        let found = guard.as_ref().map_or(0, |s| s.version);
        if found != expected_version {
            return Err(StorageError::VersionConflict {
                expected: expected_version,
                found,
            });
        }

        let version = expected_version + 1;
        *guard = Some(Snapshot::new(catalog.clone(), version));
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Egg;

    #[test]
    fn test_memory_store_compare_and_swap() {
        tokio_test::block_on(async {
            let store = MemorySnapshotStore::new();
            assert!(store.read().await.unwrap().is_none());

            let catalog = Catalog {
                eggs: vec![Egg::new("Basic", "10", 1)],
                ..Default::default()
            };
            assert_eq!(store.write(&catalog, 0).await.unwrap(), 1);
            assert!(store.write(&catalog, 0).await.is_err());
            assert_eq!(store.write(&Catalog::default(), 1).await.unwrap(), 2);

            let snapshot = store.read().await.unwrap().unwrap();
            assert_eq!(snapshot.version, 2);
            assert!(snapshot.catalog.is_empty());
        });
    }

    #[test]
    fn test_memory_store_seeded() {
        tokio_test::block_on(async {
            let store = MemorySnapshotStore::with_snapshot(Snapshot::new(Catalog::default(), 9));
            assert!(matches!(
                store.write(&Catalog::default(), 0).await,
                Err(StorageError::VersionConflict { found: 9, .. })
            ));
        });
    }
}
