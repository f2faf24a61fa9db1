//! Storage seam
//!
//! The storage writer is an external collaborator with idempotent
//! write-if-absent semantics; the engine feeds it resolved paths and bytes.

use albumfetch_base::{EngineError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns true if the bytes were written, false if the path already had
    /// content.
    async fn write_if_absent(&self, path: &Path, bytes: Bytes) -> Result<bool>;
}

/// Filesystem-backed storage, creating parent directories as needed.
#[derive(Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::transport(format!("storage write to {} failed: {}", path.display(), err))
}

#[async_trait]
impl Storage for FsStorage {
    async fn write_if_absent(&self, path: &Path, bytes: Bytes) -> Result<bool> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| storage_error(path, e))?
        {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(path, e))?;
        }
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| storage_error(path, e))?;
        Ok(true)
    }
}

/// In-memory storage for tests and dry runs.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    /// Pre-populate a path, e.g. to exercise write-if-absent.
    pub fn preload(&self, path: impl Into<PathBuf>, bytes: impl Into<Bytes>) {
        self.files.lock().unwrap().insert(path.into(), bytes.into());
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn write_if_absent(&self, path: &Path, bytes: Bytes) -> Result<bool> {
        let mut files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Ok(false);
        }
        files.insert(path.to_path_buf(), bytes);
        Ok(true)
    }
}
