//! Durable catalog snapshots.
//!
//! The whole catalog is stored as one versioned JSON document. Backends
//! implement [`SnapshotStore`]:
//! - **file**: JSON file on disk with a cross-process lock
//! - **memory**: in-process store for tests and throwaway sessions
//!
//! A write is a compare-and-swap on the version: it only succeeds when the
//! stored version still equals the version the caller loaded.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Catalog, Snapshot};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version conflict: expected {expected}, stored {found}")]
    VersionConflict { expected: u64, found: u64 },
}

impl StorageError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Io(_))
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// A backend holding the current catalog snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Backend identifier for logging.
    fn name(&self) -> &'static str;

    /// Read the stored snapshot. `Ok(None)` when nothing was ever saved;
    /// `StorageError::Json` when the stored data is corrupt.
    async fn read(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Replace the stored catalog if the stored version equals
    /// `expected_version`. Returns the new version.
    async fn write(&self, catalog: &Catalog, expected_version: u64) -> Result<u64, StorageError>;
}
