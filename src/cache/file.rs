//! File-backed cache store.
//!
//! Each key maps to one file directly under the base directory. The file holds
//! the raw payload and nothing else; its modification time is the write time
//! used for expiry. Touching a cache file from outside therefore refreshes it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use dashmap::DashSet;
use futures::future::join_all;
use tokio::fs;

use crate::cache::expiration::ExpirationPolicy;
use crate::cache::{BackendKind, CacheError, CacheStore};

enum Freshness {
    Missing,
    Stale,
    Fresh,
}

/// Disk-based cache using one file per key.
pub struct FileStore {
    directory: PathBuf,
    known: DashSet<String>,
    policy: ExpirationPolicy,
}

impl FileStore {
    /// Create the store, creating `directory` if it does not exist yet.
    pub async fn new(
        directory: impl Into<PathBuf>,
        policy: ExpirationPolicy,
    ) -> Result<Self, CacheError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)
            .await
            .map_err(|e| CacheError::io(&directory, e))?;

        Ok(Self {
            directory,
            known: DashSet::new(),
            policy,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self.directory.join(key))
    }

    async fn freshness(&self, path: &Path) -> Freshness {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Freshness::Missing,
        };

        // Platforms without mtime support cannot age entries.
        match metadata.modified() {
            Ok(written_at) if self.policy.is_stale_since(written_at, SystemTime::now()) => {
                Freshness::Stale
            }
            _ => Freshness::Fresh,
        }
    }

    /// Best effort; a concurrent reader may already have removed the file.
    /// A file that cannot be removed stays known so later sweeps retry it.
    async fn evict(&self, key: &str, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(key, "evicted expired cache file");
                self.known.remove(key);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.known.remove(key);
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to evict expired cache file");
            }
        }
    }

    /// Remove the file for `key`, forgetting the key only once the file is gone.
    async fn forget(&self, key: &str, path: &Path) -> Result<(), CacheError> {
        remove_file_if_present(path).await?;
        self.known.remove(key);
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    async fn contains(&self, key: &str) -> bool {
        let Ok(path) = self.path_for(key) else {
            return false;
        };

        match self.freshness(&path).await {
            Freshness::Fresh => true,
            Freshness::Missing => false,
            Freshness::Stale => {
                self.evict(key, &path).await;
                false
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.path_for(key)?;

        match self.freshness(&path).await {
            Freshness::Missing => return Err(CacheError::NotFound(key.to_string())),
            Freshness::Stale => {
                self.evict(key, &path).await;
                return Err(CacheError::Expired(key.to_string()));
            }
            Freshness::Fresh => {}
        }

        match fs::read(&path).await {
            Ok(payload) => Ok(payload),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(key.to_string())),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    async fn write(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        fs::write(&path, payload)
            .await
            .map_err(|e| CacheError::io(&path, e))?;

        self.known.insert(key.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        self.forget(key, &path).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let keys = self.tracked_keys();
        let results = join_all(keys.iter().map(|key| async move {
            let path = self.directory.join(key);
            self.forget(key, &path).await
        }))
        .await;
        results.into_iter().collect()
    }

    fn tracked_keys(&self) -> Vec<String> {
        self.known.iter().map(|key| key.key().clone()).collect()
    }
}

async fn remove_file_if_present(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

/// Keys become file names verbatim, so they must be a single plain component.
fn validate_key(key: &str) -> Result<(), CacheError> {
    let reason = if key.is_empty() {
        "key must not be empty"
    } else if key == "." || key == ".." {
        "key must not be a relative directory reference"
    } else if key.contains(['/', '\\']) {
        "key must not contain a path separator"
    } else if key.contains('\0') {
        "key must not contain NUL"
    } else {
        return Ok(());
    };

    Err(CacheError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}
