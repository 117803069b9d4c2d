//! Cache facade with interchangeable backends and a uniform TTL.
//!
//! Supported backends:
//! - Memory (in-process map)
//! - File (one file per key under a directory)
//! - Redis (single node, pooled)
//! - Redis cluster
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! backend = "file"    # "memory", "file", "redis" or "redis_cluster"
//! ttl_seconds = 300   # 0 = never expire
//!
//! [cache.file]
//! directory = "cache"
//!
//! [cache.redis]
//! address = "127.0.0.1:6379"
//! password = ""
//! pool_size = 4
//! connection_timeout = 5
//! key_prefix = ""
//! tls_enabled = false
//!
//! [cache.redis_cluster]
//! nodes = ["127.0.0.1:7000", "127.0.0.1:7001"]
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let cache = Cache::memory(Duration::from_secs(5));
//! cache.set("cache_key", "value").await?;
//! assert!(cache.has("cache_key").await);
//! let value: String = cache.get_as("cache_key").await?;
//! ```
//!
//! Memory and file caches with a non-zero TTL run a background sweeper that
//! evicts entries nobody reads again. Redis expires entries natively.

pub mod codec;
mod error;
mod expiration;
mod facade;
mod file;
mod memory;
mod redis;
mod sweeper;
mod traits;


pub use error::{CacheError, CacheResult};
pub use expiration::ExpirationPolicy;
pub use facade::Cache;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use sweeper::SweeperState;
pub use traits::{BackendKind, CacheStore};

// Re-export config types
pub use crate::config::settings::{
    CacheBackend, CacheConfig, FileCacheConfig, RedisCacheConfig, RedisClusterConfig,
};
