//! Redis cache implementation.
//!
//! A single node is reached through a bb8 connection pool; a cluster through one
//! multiplexed cluster connection. Expiry is left to Redis itself via `PSETEX`.

use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::cache::{BackendKind, CacheError, CacheStore};
use crate::config::settings::{RedisCacheConfig, RedisClusterConfig};

type RedisPool = Pool<Client>;

enum Connection {
    Single(RedisPool),
    Cluster(ClusterConnection),
}

/// Run one typed command on whichever connection the store holds.
macro_rules! with_conn {
    ($store:expr, |$conn:ident| $command:expr) => {
        match &$store.connection {
            Connection::Single(pool) => {
                let mut pooled = RedisStore::get_conn(pool).await?;
                let $conn: &mut MultiplexedConnection = &mut pooled;
                $command
                    .await
                    .map_err(|e: RedisError| CacheError::Operation(e.to_string()))
            }
            Connection::Cluster(connection) => {
                let mut cluster = connection.clone();
                let $conn: &mut ClusterConnection = &mut cluster;
                $command
                    .await
                    .map_err(|e: RedisError| CacheError::Operation(e.to_string()))
            }
        }
    };
}

/// Redis-backed cache store.
pub struct RedisStore {
    connection: Connection,
    key_prefix: Option<String>,
    ttl: Option<Duration>,
}

impl RedisStore {
    /// Connect to a single Redis node and verify it answers `PING`.
    pub async fn connect(config: &RedisCacheConfig, ttl: Duration) -> Result<Self, CacheError> {
        let client = Client::open(config.connection_url().as_str())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let store = Self {
            connection: Connection::Single(pool),
            key_prefix: non_empty(&config.key_prefix),
            ttl: (!ttl.is_zero()).then_some(ttl),
        };
        store.ping().await?;

        tracing::info!(address = %config.address, "connected to redis");
        Ok(store)
    }

    /// Connect to a Redis cluster through its seed nodes and verify it answers `PING`.
    pub async fn connect_cluster(
        config: &RedisClusterConfig,
        ttl: Duration,
    ) -> Result<Self, CacheError> {
        let mut builder = ClusterClient::builder(config.node_urls());
        if let Some(password) = non_empty(&config.password) {
            builder = builder.password(password);
        }
        let client = builder
            .build()
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let timeout = Duration::from_secs(config.connection_timeout);
        let connection = tokio::time::timeout(timeout, client.get_async_connection())
            .await
            .map_err(|_| {
                CacheError::Connection(format!(
                    "timed out after {}s connecting to cluster",
                    config.connection_timeout
                ))
            })?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let store = Self {
            connection: Connection::Cluster(connection),
            key_prefix: non_empty(&config.key_prefix),
            ttl: (!ttl.is_zero()).then_some(ttl),
        };
        store.ping().await?;

        tracing::info!(nodes = ?config.nodes, "connected to redis cluster");
        Ok(store)
    }

    fn prefixed_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let result: Result<String, CacheError> =
            with_conn!(self, |conn| redis::cmd("PING").query_async::<String>(conn));
        result.map_err(|e| CacheError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn get_conn(pool: &RedisPool) -> Result<PooledConnection<'_, Client>, CacheError> {
        pool.get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn kind(&self) -> BackendKind {
        match self.connection {
            Connection::Single(_) => BackendKind::Redis,
            Connection::Cluster(_) => BackendKind::RedisCluster,
        }
    }

    async fn contains(&self, key: &str) -> bool {
        let result: Result<bool, CacheError> = async {
            let prefixed = self.prefixed_key(key);
            with_conn!(self, |conn| conn.exists::<_, bool>(&prefixed))
        }
        .await;

        match result {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(key, error = %e, "redis existence check failed");
                false
            }
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let prefixed = self.prefixed_key(key);
        let payload: Option<Vec<u8>> =
            with_conn!(self, |conn| conn.get::<_, Option<Vec<u8>>>(&prefixed))?;
        payload.ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError> {
        let prefixed = self.prefixed_key(key);
        match self.ttl {
            // PSETEX 0 is rejected by Redis; sub-millisecond TTLs round up.
            Some(ttl) => {
                let millis = ttl.as_millis().max(1) as u64;
                with_conn!(self, |conn| conn.pset_ex::<_, _, ()>(&prefixed, payload, millis))
            }
            None => with_conn!(self, |conn| conn.set::<_, _, ()>(&prefixed, payload)),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let prefixed = self.prefixed_key(key);
        with_conn!(self, |conn| conn.del::<_, ()>(&prefixed))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let Some(prefix) = &self.key_prefix else {
            return with_conn!(self, |conn| redis::cmd("FLUSHALL").query_async::<()>(conn));
        };

        let pattern = format!("{}:*", prefix);
        let keys: Vec<String> = with_conn!(self, |conn| conn.keys::<_, Vec<String>>(&pattern))?;
        if keys.is_empty() {
            return Ok(());
        }

        match &self.connection {
            Connection::Single(_) => {
                let batch = keys.clone();
                with_conn!(self, |conn| conn.del::<_, ()>(batch))?;
            }
            // A multi-key DEL must stay within one hash slot on a cluster.
            Connection::Cluster(_) => {
                for key in &keys {
                    with_conn!(self, |conn| conn.del::<_, ()>(key))?;
                }
            }
        }

        tracing::debug!(removed = keys.len(), %prefix, "cleared prefixed redis keys");
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> RedisCacheConfig {
        RedisCacheConfig {
            // Port 1 is reserved and nothing listens on it in test environments.
            address: "127.0.0.1:1".to_string(),
            connection_timeout: 1,
            pool_size: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_fails_fast_when_unreachable() {
        let result = RedisStore::connect(&unreachable_config(), Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[tokio::test]
    async fn test_connect_cluster_fails_fast_when_unreachable() {
        let config = RedisClusterConfig {
            nodes: vec!["127.0.0.1:1".to_string()],
            connection_timeout: 1,
            ..Default::default()
        };
        let result = RedisStore::connect_cluster(&config, Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    /// Live tests need a disposable Redis; they flush it.
    /// Run with `TIERCACHE_TEST_REDIS=127.0.0.1:6379 cargo test -- --ignored`.
    fn live_config() -> Option<RedisCacheConfig> {
        let address = std::env::var("TIERCACHE_TEST_REDIS").ok()?;
        Some(RedisCacheConfig {
            address,
            key_prefix: "tiercache-test".to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_write_read_remove() {
        let Some(config) = live_config() else { return };
        let store = RedisStore::connect(&config, Duration::from_secs(30)).await.unwrap();

        store.write("key", b"value".to_vec()).await.unwrap();
        assert!(store.contains("key").await);
        assert_eq!(store.read("key").await.unwrap(), b"value".to_vec());

        assert_eq!(store.take("key").await.unwrap(), b"value".to_vec());
        assert!(!store.contains("key").await);
        assert!(matches!(store.read("key").await, Err(CacheError::NotFound(_))));
        store.remove("key").await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_native_expiry() {
        let Some(config) = live_config() else { return };
        let store = RedisStore::connect(&config, Duration::from_millis(200)).await.unwrap();

        store.write("short", b"value".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!store.contains("short").await);
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_prefixed_clear() {
        let Some(config) = live_config() else { return };
        let store = RedisStore::connect(&config, Duration::ZERO).await.unwrap();

        store.write("k1", b"v1".to_vec()).await.unwrap();
        store.write("k2", b"v2".to_vec()).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.contains("k1").await);
        assert!(!store.contains("k2").await);

        // Nothing left under the prefix
        store.clear().await.unwrap();
    }
}
