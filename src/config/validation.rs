//! Configuration validation logic
//!
//! This module provides validation methods for the configuration structures
//! so that a bad value is reported against its field before any backend is
//! constructed.

use crate::config::error::ConfigError;
use crate::config::settings::{
    CacheBackend, CacheConfig, FileCacheConfig, RedisCacheConfig, RedisClusterConfig, Settings,
};

impl FileCacheConfig {
    /// Validate file cache configuration
    ///
    /// # Validation Rules
    /// - Directory must not be empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.file.directory",
                "Cache directory is required when the file backend is selected.",
            ));
        }
        Ok(())
    }
}

impl RedisCacheConfig {
    /// Validate Redis configuration
    ///
    /// # Validation Rules
    /// - Address must not be empty
    /// - Pool size must be greater than 0
    /// - Connection timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.redis.address",
                "Redis address is required. Expected host:port or a redis:// URL.",
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "cache.redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "cache.redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl RedisClusterConfig {
    /// Validate Redis cluster configuration
    ///
    /// # Validation Rules
    /// - At least one seed node, none of them empty
    /// - Connection timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() || self.nodes.iter().any(|node| node.trim().is_empty()) {
            return Err(ConfigError::validation(
                "cache.redis_cluster.nodes",
                "At least one non-empty seed node (host:port) is required.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "cache.redis_cluster.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache configuration
    ///
    /// Only the section of the selected backend is checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            CacheBackend::Memory => Ok(()),
            CacheBackend::File => self.file.validate(),
            CacheBackend::Redis => self.redis.validate(),
            CacheBackend::RedisCluster => self.redis_cluster.validate(),
        }
    }
}

impl Settings {
    /// Validate all settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate().map_err(|e| {
            ConfigError::validation("logger".to_string(), format!("{:#}", e))
        })?;

        self.cache.validate()
    }
}
