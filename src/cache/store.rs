//! Cache storage.
//!
//! `CacheStore` is the narrow interface the read-through layer consumes. Writes are
//! single-key sets; a reader never observes a partially written payload.

use std::{
    sync::{RwLock, RwLockWriteGuard},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use tracing::warn;

use super::config::CacheConfig;
use super::keys::CacheKey;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the payload stored under `key`, if present and not expired.
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    /// Store `payload` under `key`, replacing any previous value, expiring after `ttl`.
    async fn set(&self, key: &CacheKey, payload: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every entry this service wrote. A shared store (Redis) only
    /// removes keys under the configured `key_prefix`; an empty prefix clears
    /// the whole logical database.
    async fn flush_all(&self) -> Result<(), CacheError>;

    /// Check that the store answers.
    async fn ping(&self) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct MemoryEntry {
    payload: Bytes,
    expires_at: Instant,
}

/// In-process store with per-entry expiry and LRU eviction.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<CacheKey, MemoryEntry>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.memory_capacity_non_zero())),
        }
    }

    /// Number of entries currently held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// LRU reads reorder entries, so every operation takes the write side.
    /// Poisoned locks are recovered.
    fn entries(&self, op: &'static str) -> RwLockWriteGuard<'_, LruCache<CacheKey, MemoryEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(cache = "memory", op, "recovered poisoned entry lock");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut entries = self.entries("get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.payload.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, payload: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            payload,
            expires_at: Instant::now() + ttl,
        };
        self.entries("set").put(key.clone(), entry);
        Ok(())
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        self.entries("flush_all").clear();
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
