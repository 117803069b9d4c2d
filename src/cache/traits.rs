//! CacheStore trait definition.

use async_trait::async_trait;

use crate::cache::CacheError;

/// The storage medium behind a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Memory,
    File,
    Redis,
    RedisCluster,
}

impl BackendKind {
    /// Whether the medium expires entries on its own.
    pub fn expires_natively(&self) -> bool {
        matches!(self, BackendKind::Redis | BackendKind::RedisCluster)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Redis => "redis",
            BackendKind::RedisCluster => "redis_cluster",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability set every backend provides to the cache facade.
///
/// Stores are driven under the facade's lock and never lock across operations
/// themselves. Stale entries found by `contains` or `read` are evicted before
/// those methods return.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Present and fresh. Never fails; an unreachable medium reads as absent.
    async fn contains(&self, key: &str) -> bool;

    /// Payload for `key`, or `NotFound` / `Expired`.
    async fn read(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    /// Read, then remove the entry.
    async fn take(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let payload = self.read(key).await?;
        self.remove(key).await?;
        Ok(payload)
    }

    /// Insert or overwrite. Expiry is derived from the store's policy.
    async fn write(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError>;

    /// Remove `key`. Absent keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry owned by this store.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Keys the sweeper should revisit. Empty for stores with native expiry.
    fn tracked_keys(&self) -> Vec<String> {
        Vec::new()
    }
}
