//! Snapshot-based record storage with a durable and a volatile backing.
//!
//! The store always works on full-collection snapshots: `load_all` returns
//! the whole collection, `save_all` replaces it wholesale. The durable
//! variant keeps the snapshot as a single pretty-printed JSON document on
//! disk; the volatile variant keeps it in process memory. A durable store
//! that fails to write falls back to holding the snapshot in memory for
//! the rest of the process lifetime ([`StorageMode::Degraded`]) — callers
//! keep working, durability is lost.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backing unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(String),
}

/// Which backing currently holds the authoritative snapshot.
///
/// `Durable` and `Volatile` are selected at construction and are static
/// for the process lifetime, except for the one-way runtime transition
/// `Durable -> Degraded` taken when a disk write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Durable,
    Volatile,
    Degraded,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Durable => write!(f, "durable"),
            StorageMode::Volatile => write!(f, "volatile"),
            StorageMode::Degraded => write!(f, "degraded"),
        }
    }
}

struct StoreInner<T> {
    mode: StorageMode,
    // Authoritative snapshot in Volatile and Degraded modes. Unused while
    // the store is Durable (disk is authoritative there).
    snapshot: Vec<T>,
}

pub struct SnapshotStore<T> {
    path: Option<PathBuf>,
    inner: RwLock<StoreInner<T>>,
}

impl<T> SnapshotStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Creates a file-backed store writing the snapshot to `path`.
    ///
    /// The parent directory is created up front if missing; a failure to
    /// create it is only logged — the first `save_all` will then take the
    /// degraded fallback instead of failing the caller.
    pub fn durable(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!("Could not create storage directory {}: {}", parent.display(), e);
                }
            }
        }

        Self {
            path: Some(path),
            inner: RwLock::new(StoreInner {
                mode: StorageMode::Durable,
                snapshot: Vec::new(),
            }),
        }
    }

    /// Creates an in-memory store. Used when the filesystem is read-only;
    /// the snapshot does not survive a restart.
    pub fn volatile() -> Self {
        Self {
            path: None,
            inner: RwLock::new(StoreInner {
                mode: StorageMode::Volatile,
                snapshot: Vec::new(),
            }),
        }
    }

    pub fn mode(&self) -> StorageMode {
        self.inner.read().expect("storage lock poisoned").mode
    }

    /// Returns the full collection.
    ///
    /// A missing snapshot file is an empty collection. An unreadable or
    /// corrupt file is `StorageError::Unavailable` — the caller decides
    /// whether to surface it or recover to empty.
    pub fn load_all(&self) -> Result<Vec<T>, StorageError> {
        let inner = self.inner.read().expect("storage lock poisoned");

        match inner.mode {
            StorageMode::Volatile | StorageMode::Degraded => Ok(inner.snapshot.clone()),
            StorageMode::Durable => {
                let path = self.path.as_ref().expect("durable store has a path");

                let contents = match fs::read_to_string(path) {
                    Ok(contents) => contents,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        debug!("Snapshot file {} not found, starting empty", path.display());
                        return Ok(Vec::new());
                    }
                    Err(e) => {
                        return Err(StorageError::Unavailable(format!(
                            "Failed to read {}: {}",
                            path.display(),
                            e
                        )))
                    }
                };

                serde_json::from_str(&contents).map_err(|e| {
                    StorageError::Unavailable(format!(
                        "Failed to parse {}: {}",
                        path.display(),
                        e
                    ))
                })
            }
        }
    }

    /// Replaces the full collection.
    ///
    /// In durable mode a failed disk write does not fail the call: the
    /// store transitions to [`StorageMode::Degraded`], keeps the snapshot
    /// in memory and serves it from there for the rest of the process
    /// lifetime. Only a serialization failure is reported to the caller.
    pub fn save_all(&self, records: &[T]) -> Result<(), StorageError> {
        let mut inner = self.inner.write().expect("storage lock poisoned");

        match inner.mode {
            StorageMode::Volatile | StorageMode::Degraded => {
                inner.snapshot = records.to_vec();
                Ok(())
            }
            StorageMode::Durable => {
                let path = self.path.as_ref().expect("durable store has a path");

                let contents = serde_json::to_string_pretty(records)
                    .map_err(|e| StorageError::Serialize(e.to_string()))?;

                match fs::write(path, contents) {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        warn!(
                            "Failed to write snapshot to {}: {} - falling back to in-memory storage",
                            path.display(),
                            e
                        );
                        inner.mode = StorageMode::Degraded;
                        inner.snapshot = records.to_vec();
                        Ok(())
                    }
                }
            }
        }
    }
}
