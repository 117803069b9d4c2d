//! The cache facade: one contract over every backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::cache::expiration::ExpirationPolicy;
use crate::cache::file::FileStore;
use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::sweeper::{Sweeper, SweeperState};
use crate::cache::{BackendKind, CacheError, CacheStore, codec};
use crate::config::settings::{CacheBackend, CacheConfig, RedisCacheConfig, RedisClusterConfig};

/// State shared between a cache instance and its sweeper.
pub(crate) struct CacheCore {
    store: RwLock<Box<dyn CacheStore>>,
    kind: BackendKind,
    policy: ExpirationPolicy,
}

impl CacheCore {
    pub(crate) fn kind(&self) -> BackendKind {
        self.kind
    }

    pub(crate) fn policy(&self) -> ExpirationPolicy {
        self.policy
    }

    pub(crate) async fn has(&self, key: &str) -> bool {
        self.store.read().await.contains(key).await
    }

    pub(crate) async fn tracked_keys(&self) -> Vec<String> {
        self.store.read().await.tracked_keys()
    }
}

/// A cache instance over one backend with a uniform TTL.
///
/// Writers (`add`, `set`, `delete`, `flush`) hold the instance lock exclusively;
/// readers (`get`, `pull`, `has`) share it. Readers may still evict stale
/// entries, and two readers evicting the same key is harmless.
///
/// Share an instance between tasks with `Arc<Cache>`. Dropping the last
/// handle stops the background sweeper.
pub struct Cache {
    core: Arc<CacheCore>,
    sweeper: Option<Sweeper>,
}

impl Cache {
    /// In-process cache. A zero `ttl` means entries never expire.
    ///
    /// The expiry sweeper is started on the ambient Tokio runtime when `ttl`
    /// is non-zero.
    pub fn memory(ttl: Duration) -> Self {
        let policy = ExpirationPolicy::new(ttl);
        Self::with_store(Box::new(MemoryStore::new(policy)), policy)
    }

    /// One file per key under `directory`, which is created if missing.
    pub async fn file(ttl: Duration, directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let policy = ExpirationPolicy::new(ttl);
        let store = FileStore::new(directory, policy).await?;
        Ok(Self::with_store(Box::new(store), policy))
    }

    /// Single-node Redis. Fails with [`CacheError::Connection`] if the server
    /// does not answer at construction.
    pub async fn redis(ttl: Duration, config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let store = RedisStore::connect(config, ttl).await?;
        Ok(Self::with_store(Box::new(store), ExpirationPolicy::new(ttl)))
    }

    /// Redis cluster reached through its seed nodes.
    pub async fn redis_cluster(
        ttl: Duration,
        config: &RedisClusterConfig,
    ) -> Result<Self, CacheError> {
        let store = RedisStore::connect_cluster(config, ttl).await?;
        Ok(Self::with_store(Box::new(store), ExpirationPolicy::new(ttl)))
    }

    /// Build the backend selected by `config`.
    pub async fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let ttl = config.ttl();
        match config.backend {
            CacheBackend::Memory => Ok(Self::memory(ttl)),
            CacheBackend::File => Self::file(ttl, &config.file.directory).await,
            CacheBackend::Redis => Self::redis(ttl, &config.redis).await,
            CacheBackend::RedisCluster => Self::redis_cluster(ttl, &config.redis_cluster).await,
        }
    }

    fn with_store(store: Box<dyn CacheStore>, policy: ExpirationPolicy) -> Self {
        let kind = store.kind();
        let core = Arc::new(CacheCore {
            store: RwLock::new(store),
            kind,
            policy,
        });
        let sweeper = Sweeper::spawn(Arc::clone(&core));

        tracing::debug!(
            backend = %kind,
            ttl_ms = policy.ttl().map(|ttl| ttl.as_millis() as u64),
            sweeper = sweeper.is_some(),
            "cache created"
        );
        Self { core, sweeper }
    }

    pub fn kind(&self) -> BackendKind {
        self.core.kind
    }

    /// Configured TTL, or `None` when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.core.policy.ttl()
    }

    // ========================================================================
    // Writers
    // ========================================================================

    /// Store `value` only if no fresh entry exists for `key`.
    ///
    /// The existence check and the write happen under one exclusive lock, so
    /// of several concurrent `add`s on the same key exactly one succeeds.
    pub async fn add<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<(), CacheError> {
        let store = self.core.store.write().await;
        if store.contains(key).await {
            tracing::debug!(key, backend = %self.core.kind, "add rejected, entry exists");
            return Err(CacheError::AlreadyExists(key.to_string()));
        }

        let payload = codec::encode(value)?;
        store.write(key, payload).await
    }

    /// Store `value`, overwriting any existing entry.
    pub async fn set<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<(), CacheError> {
        let payload = codec::encode(value)?;
        let store = self.core.store.write().await;
        store.write(key, payload).await
    }

    /// Remove `key`. Missing keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let store = self.core.store.write().await;
        store.remove(key).await
    }

    /// Remove every entry of this cache.
    pub async fn flush(&self) -> Result<(), CacheError> {
        let store = self.core.store.write().await;
        store.clear().await?;
        tracing::debug!(backend = %self.core.kind, "cache flushed");
        Ok(())
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Encoded payload for `key`.
    ///
    /// Fails with [`CacheError::NotFound`] for unknown keys and
    /// [`CacheError::Expired`] for stale ones, which are evicted on the way.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let store = self.core.store.read().await;
        let result = store.read(key).await;
        log_read(key, self.core.kind, &result);
        result
    }

    /// Like [`Cache::get`], but also removes the entry on success.
    pub async fn pull(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let store = self.core.store.read().await;
        let result = store.take(key).await;
        log_read(key, self.core.kind, &result);
        result
    }

    /// `get` decoded into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        codec::decode(&self.get(key).await?)
    }

    /// `pull` decoded into `T`.
    pub async fn pull_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        codec::decode(&self.pull(key).await?)
    }

    /// Whether a fresh entry exists for `key`. Stale entries are evicted.
    pub async fn has(&self, key: &str) -> bool {
        self.core.has(key).await
    }

    // ========================================================================
    // Sweeper control
    // ========================================================================

    pub fn sweeper_state(&self) -> SweeperState {
        self.sweeper
            .as_ref()
            .map_or(SweeperState::Idle, Sweeper::state)
    }

    /// Stop the background sweeper. Expired entries are then only evicted when
    /// their key is touched.
    pub fn stop_sweeper(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }

    /// `true` once the sweeper task has exited, or if there never was one.
    pub fn sweeper_finished(&self) -> bool {
        self.sweeper.as_ref().is_none_or(Sweeper::is_finished)
    }

    /// Keys the backend still holds, without evicting anything.
    #[cfg(test)]
    pub(crate) async fn tracked_keys(&self) -> Vec<String> {
        self.core.tracked_keys().await
    }
}

fn log_read(key: &str, backend: BackendKind, result: &Result<Vec<u8>, CacheError>) {
    match result {
        Ok(payload) => tracing::debug!(key, %backend, bytes = payload.len(), "cache hit"),
        Err(CacheError::Expired(_)) => tracing::debug!(key, %backend, "cache entry expired"),
        Err(CacheError::NotFound(_)) => tracing::debug!(key, %backend, "cache miss"),
        Err(e) => tracing::warn!(key, %backend, error = %e, "cache read failed"),
    }
}
