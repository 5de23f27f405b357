//! JSON file snapshot store.
//!
//! Writes hold an exclusive lock on a sibling `.lock` file for the whole
//! check-version / write / rename sequence, so two processes saving at once
//! are serialized and readers never see a half-written file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, info, warn};

use super::{SnapshotStore, StorageConfig, StorageError};
use crate::models::{Catalog, Snapshot};

/// Snapshot stored as a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_config(config: &StorageConfig) -> Self {
        Self::new(config.catalog_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        path.with_file_name(name)
    }
}

fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let snapshot: Snapshot = serde_json::from_str(&text)?;
    debug!(
        "Read snapshot v{} from {:?} ({} mobs, {} eggs, {} levels)",
        snapshot.version,
        path,
        snapshot.catalog.mobs.len(),
        snapshot.catalog.eggs.len(),
        snapshot.catalog.levels.len()
    );
    Ok(Some(snapshot))
}

/// Version currently on disk. A corrupt file counts as version 0, the same
/// version a reader is handed when it falls back to an empty catalog.
fn stored_version(path: &Path) -> Result<u64, StorageError> {
    match read_snapshot(path) {
        Ok(snapshot) => Ok(snapshot.map_or(0, |s| s.version)),
        Err(StorageError::Json(e)) => {
            warn!("Stored snapshot {:?} is corrupt, treating as v0: {}", path, e);
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

fn write_locked(path: &Path, catalog: &Catalog, expected: u64) -> Result<u64, StorageError> {
    let found = stored_version(path)?;
    if found != expected {
        return Err(StorageError::VersionConflict { expected, found });
    }

    let snapshot = Snapshot::new(catalog.clone(), expected + 1);
    let tmp_path = FileSnapshotStore::sibling(path, ".tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    info!("Wrote snapshot v{} to {:?}", snapshot.version, path);
    Ok(snapshot.version)
}

fn write_snapshot(path: &Path, catalog: &Catalog, expected: u64) -> Result<u64, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(FileSnapshotStore::sibling(path, ".lock"))?;
    FileExt::lock_exclusive(&lock_file)?;

    let result = write_locked(path, catalog, expected);
    release_lock(path, result, FileExt::unlock(&lock_file))
}

/// The outcome of the locked section wins over an unlock failure. Dropping
/// the lock file releases the lock as well.
fn release_lock(
    path: &Path,
    result: Result<u64, StorageError>,
    unlocked: io::Result<()>,
) -> Result<u64, StorageError> {
    if let Err(e) = unlocked {
        warn!("Failed to unlock {:?}: {}", path, e);
    }
    result
}

fn join_error(e: tokio::task::JoinError) -> StorageError {
    StorageError::Io(io::Error::other(e))
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn read(&self) -> Result<Option<Snapshot>, StorageError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_snapshot(&path))
            .await
            .map_err(join_error)?
    }

    async fn write(&self, catalog: &Catalog, expected_version: u64) -> Result<u64, StorageError> {
        let path = self.path.clone();
        let catalog = catalog.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &catalog, expected_version))
            .await
            .map_err(join_error)?
    }
}
