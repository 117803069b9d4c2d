//! In-process cache store backed by a concurrent map.

use std::time::SystemTime;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::expiration::ExpirationPolicy;
use crate::cache::{BackendKind, CacheError, CacheStore};

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Vec<u8>,
    expires_at: Option<SystemTime>,
}

/// In-memory cache with per-entry expiry.
///
/// The map allows eviction from the facade's shared-lock read path.
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
    policy: ExpirationPolicy,
}

impl MemoryStore {
    pub fn new(policy: ExpirationPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `key` only if it is still stale, so a concurrent rewrite survives.
    fn evict_if_stale(&self, key: &str, now: SystemTime) {
        let policy = self.policy;
        if self
            .entries
            .remove_if(key, |_, entry| policy.is_stale(entry.expires_at, now))
            .is_some()
        {
            tracing::debug!(key, "evicted expired memory entry");
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn contains(&self, key: &str) -> bool {
        let now = SystemTime::now();
        let stale = match self.entries.get(key) {
            Some(entry) => self.policy.is_stale(entry.expires_at, now),
            None => return false,
        };

        if stale {
            self.evict_if_stale(key, now);
        }
        !stale
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let now = SystemTime::now();
        let entry = self
            .entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        if self.policy.is_stale(entry.expires_at, now) {
            self.evict_if_stale(key, now);
            return Err(CacheError::Expired(key.to_string()));
        }
        Ok(entry.payload)
    }

    async fn take(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let now = SystemTime::now();
        let (_, entry) = self
            .entries
            .remove(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        if self.policy.is_stale(entry.expires_at, now) {
            tracing::debug!(key, "evicted expired memory entry");
            return Err(CacheError::Expired(key.to_string()));
        }
        Ok(entry.payload)
    }

    async fn write(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError> {
        let entry = CacheEntry {
            payload,
            expires_at: self.policy.expires_at(SystemTime::now()),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }

    fn tracked_keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}
