//! Settings structures for tiercache
//!
//! This module defines all configuration structures that map to the TOML
//! configuration file format and `TIERCACHE_*` environment overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logger::LoggerConfig;

// ============================================================================
// Default value functions for serde
// ============================================================================

fn default_cache_directory() -> String {
    "cache".to_string()
}

fn default_redis_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_redis_pool_size() -> u32 {
    4
}

fn default_redis_connection_timeout() -> u64 {
    5
}

// ============================================================================
// Cache Configuration
// ============================================================================

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    File,
    Redis,
    RedisCluster,
}

/// File cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCacheConfig {
    /// Directory holding one file per cache key
    #[serde(default = "default_cache_directory")]
    pub directory: String,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
        }
    }
}

/// Single-node Redis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// `host:port`, or a full `redis://` / `rediss://` URL
    #[serde(default = "default_redis_address")]
    pub address: String,

    /// Password; empty means no authentication
    #[serde(default)]
    pub password: String,

    /// Whether to use TLS
    #[serde(default)]
    pub tls_enabled: bool,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_redis_connection_timeout")]
    pub connection_timeout: u64,

    /// Namespace for keys; empty means keys are stored verbatim
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            address: default_redis_address(),
            password: String::new(),
            tls_enabled: false,
            pool_size: default_redis_pool_size(),
            connection_timeout: default_redis_connection_timeout(),
            key_prefix: String::new(),
        }
    }
}

impl RedisCacheConfig {
    /// Connection URL built from address, credential and TLS flag
    pub fn connection_url(&self) -> String {
        node_url(&self.address, &self.password, self.tls_enabled)
    }
}

/// Redis cluster configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisClusterConfig {
    /// Seed nodes as `host:port` or full URLs
    #[serde(default)]
    pub nodes: Vec<String>,

    /// Password shared by all nodes; empty means no authentication
    #[serde(default)]
    pub password: String,

    /// Whether to use TLS
    #[serde(default)]
    pub tls_enabled: bool,

    /// Connection timeout in seconds
    #[serde(default = "default_redis_connection_timeout")]
    pub connection_timeout: u64,

    /// Namespace for keys; empty means keys are stored verbatim
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisClusterConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            password: String::new(),
            tls_enabled: false,
            connection_timeout: default_redis_connection_timeout(),
            key_prefix: String::new(),
        }
    }
}

impl RedisClusterConfig {
    /// Seed node URLs. The password is handed to the cluster client separately.
    pub fn node_urls(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| node_url(node, "", self.tls_enabled))
            .collect()
    }
}

fn node_url(address: &str, password: &str, tls_enabled: bool) -> String {
    if address.contains("://") {
        return address.to_string();
    }

    let scheme = if tls_enabled { "rediss" } else { "redis" };
    if password.is_empty() {
        format!("{}://{}", scheme, address)
    } else {
        format!("{}://:{}@{}", scheme, urlencoding::encode(password), address)
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Cache backend type
    #[serde(default)]
    pub backend: CacheBackend,

    /// Time-to-live in seconds; 0 means entries never expire
    #[serde(default)]
    pub ttl_seconds: u64,

    /// File cache settings
    #[serde(default)]
    pub file: FileCacheConfig,

    /// Redis cache settings
    #[serde(default)]
    pub redis: RedisCacheConfig,

    /// Redis cluster settings
    #[serde(default)]
    pub redis_cluster: RedisClusterConfig,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}
