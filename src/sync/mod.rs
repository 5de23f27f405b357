//! Catalog sync service.
//!
//! Loads and saves catalog snapshots through a [`SnapshotStore`]:
//! 1. `load` hands out the catalog together with its version
//! 2. the caller mutates it through a `CatalogStore`
//! 3. `save` writes it back only if nobody saved in between
//!
//! Transient I/O failures are retried with exponential backoff. A version
//! conflict is never retried here: the caller has to re-load and re-apply its
//! change, which is what [`SyncService::update`] does.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, ValidationError};
use crate::models::Catalog;
use crate::storage::{SnapshotStore, StorageError};

/// Errors that can occur during sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Catalog was modified concurrently (expected v{expected}, stored v{found})")]
    Conflict { expected: u64, found: u64 },

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<StorageError> for SyncError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::VersionConflict { expected, found } => {
                SyncError::Conflict { expected, found }
            }
            other => SyncError::Storage(other),
        }
    }
}

/// Retry policy for transient storage failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt as i32);
        Duration::from_millis((self.initial_delay_ms as f64 * factor).round() as u64)
    }
}

/// Versioned access to the durable catalog.
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn SnapshotStore>,
    policy: RetryPolicy,
}

impl SyncService {
    pub fn new(store: Arc<dyn SnapshotStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "{} on {} store failed (attempt {}/{}), retrying in {:?}: {}",
                        operation,
                        self.store.name(),
                        attempt + 1,
                        self.policy.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Load the catalog and its version.
    ///
    /// Missing or corrupt data yields an empty catalog at version 0.
    pub async fn load(&self) -> Result<(Catalog, u64), SyncError> {
        match self.with_retry("load", || self.store.read()).await {
            Ok(Some(snapshot)) => Ok((snapshot.catalog, snapshot.version)),
            Ok(None) => {
                info!("No stored catalog, starting empty");
                Ok((Catalog::default(), 0))
            }
            Err(StorageError::Json(e)) => {
                warn!("Stored catalog is corrupt, starting empty: {}", e);
                Ok((Catalog::default(), 0))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save the full catalog if the stored version is still
    /// `expected_version`. Returns the new version.
    pub async fn save(&self, catalog: &Catalog, expected_version: u64) -> Result<u64, SyncError> {
        let version = self
            .with_retry("save", || self.store.write(catalog, expected_version))
            .await?;
        info!(
            "Saved catalog v{} ({} mobs, {} eggs, {} levels)",
            version,
            catalog.mobs.len(),
            catalog.eggs.len(),
            catalog.levels.len()
        );
        Ok(version)
    }

    /// Read-modify-write: load, apply `change`, save.
    ///
    /// On a version conflict the catalog is re-loaded and `change` applied
    /// again, up to `max_retries` times. A validation error from `change`
    /// aborts without writing.
    pub async fn update<T, F>(&self, mut change: F) -> Result<(T, u64), SyncError>
    where
        F: FnMut(&mut CatalogStore) -> Result<T, ValidationError>,
    {
        let mut attempt = 0;
        loop {
            let (catalog, version) = self.load().await?;
            let mut store = CatalogStore::from(catalog);
            let value = change(&mut store)?;

            match self.save(store.catalog(), version).await {
                Ok(new_version) => return Ok((value, new_version)),
                Err(SyncError::Conflict { expected, found })
                    if attempt < self.policy.max_retries =>
                {
                    warn!(
                        "Catalog moved from v{} to v{} during update, re-applying",
                        expected, found
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewMob;
    use crate::models::{Mob, Snapshot};
    use crate::storage::{FileSnapshotStore, MemorySnapshotStore};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_delay_ms: 1,
            backoff_multiplier: 2.0,
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog {
            mobs: vec![Mob::new("Rat", 100.0, 2.0, 10.0, 1)],
            ..Default::default()
        }
    }

    /// Fails the first `failures` reads and writes with an I/O error.
    struct FlakyStore {
        inner: MemorySnapshotStore,
        failures: u32,
        reads: AtomicU32,
        writes: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemorySnapshotStore::new(),
                failures,
                reads: AtomicU32::new(0),
                writes: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl SnapshotStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn read(&self) -> Result<Option<Snapshot>, StorageError> {
            if self.reads.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(StorageError::Io(std::io::Error::other("disk busy")));
            }
            self.inner.read().await
        }

        async fn write(&self, catalog: &Catalog, expected: u64) -> Result<u64, StorageError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(StorageError::Io(std::io::Error::other("disk busy")));
            }
            self.inner.write(catalog, expected).await
        }
    }

    /// Simulates another editor saving right before our first write.
    struct RacingStore {
        inner: MemorySnapshotStore,
        raced: AtomicU32,
    }

    #[async_trait]
    impl SnapshotStore for RacingStore {
        fn name(&self) -> &'static str {
            "racing"
        }

        async fn read(&self) -> Result<Option<Snapshot>, StorageError> {
            self.inner.read().await
        }

        async fn write(&self, catalog: &Catalog, expected: u64) -> Result<u64, StorageError> {
            if self.raced.fetch_add(1, Ordering::SeqCst) == 0 {
                let theirs = Catalog {
                    mobs: vec![Mob::new("Bat", 50.0, 1.0, 5.0, 1)],
                    ..Default::default()
                };
                self.inner.write(&theirs, expected).await?;
            }
            self.inner.write(catalog, expected).await
        }
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let sync = SyncService::new(Arc::new(MemorySnapshotStore::new()), fast_policy());
        let (catalog, version) = sync.load().await.unwrap();
        assert!(catalog.is_empty());
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.json");
        std::fs::write(&path, "garbage").unwrap();
        let sync = SyncService::new(Arc::new(FileSnapshotStore::new(path)), fast_policy());

        let (catalog, version) = sync.load().await.unwrap();
        assert!(catalog.is_empty());
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn test_save_of_load_only_bumps_version() {
        let store = MemorySnapshotStore::with_snapshot(Snapshot::new(sample_catalog(), 4));
        let sync = SyncService::new(Arc::new(store), fast_policy());

        let (catalog, version) = sync.load().await.unwrap();
        let new_version = sync.save(&catalog, version).await.unwrap();
        assert_eq!(new_version, version + 1);

        let (reloaded, reloaded_version) = sync.load().await.unwrap();
        assert_eq!(reloaded, catalog);
        assert_eq!(reloaded_version, 5);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts_and_keeps_content() {
        let sync = SyncService::new(Arc::new(MemorySnapshotStore::new()), fast_policy());
        let (_, version) = sync.load().await.unwrap();
        sync.save(&sample_catalog(), version).await.unwrap();

        let err = sync.save(&Catalog::default(), version).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Conflict {
                expected: 0,
                found: 1
            }
        ));

        let (stored, _) = sync.load().await.unwrap();
        assert_eq!(stored, sample_catalog());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let store = Arc::new(FlakyStore::new(2));
        let sync = SyncService::new(store.clone(), fast_policy());

        let version = sync.save(&sample_catalog(), 0).await.unwrap();
        assert_eq!(version, 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);

        let (catalog, _) = sync.load().await.unwrap();
        assert_eq!(catalog, sample_catalog());
        assert_eq!(store.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = Arc::new(FlakyStore::new(10));
        let sync = SyncService::new(store.clone(), fast_policy());

        let err = sync.load().await.unwrap_err();
        assert!(matches!(err, SyncError::Storage(StorageError::Io(_))));
        assert_eq!(store.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_conflict_is_not_retried_by_save() {
        let store = Arc::new(FlakyStore::new(0));
        let sync = SyncService::new(store.clone(), fast_policy());
        sync.save(&sample_catalog(), 0).await.unwrap();

        assert!(sync.save(&sample_catalog(), 0).await.is_err());
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_reapplies_after_conflict() {
        let store = Arc::new(RacingStore {
            inner: MemorySnapshotStore::new(),
            raced: AtomicU32::new(0),
        });
        let sync = SyncService::new(store, fast_policy());

        let (name, version) = sync
            .update(|catalog| {
                catalog
                    .add_mob(NewMob {
                        name: "Rat".to_string(),
                        life: "100".to_string(),
                        trophies: "2".to_string(),
                        xp: "10".to_string(),
                        area: "1".to_string(),
                    })
                    .map(|mob| mob.name.clone())
            })
            .await
            .unwrap();

        assert_eq!(name, "Rat");
        assert_eq!(version, 2);

        // The concurrent editor's mob survived
        let (catalog, _) = sync.load().await.unwrap();
        let names: Vec<_> = catalog.mobs.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bat", "Rat"]);
    }

    #[tokio::test]
    async fn test_update_validation_error_does_not_write() {
        let store = MemorySnapshotStore::with_snapshot(Snapshot::new(sample_catalog(), 1));
        let sync = SyncService::new(Arc::new(store), fast_policy());

        let err = sync
            .update(|catalog| {
                catalog
                    .add_mob(NewMob {
                        name: "RAT".to_string(),
                        ..Default::default()
                    })
                    .map(|_| ())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        let (_, version) = sync.load().await.unwrap();
        assert_eq!(version, 1);
    }
}
