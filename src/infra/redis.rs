//! Redis-backed cache store.
//!
//! Every key is written as `{key_prefix}{digest}` with `SET .. EX ttl`, so expiry is
//! enforced by Redis itself. Flushing removes only keys under the prefix; an empty
//! prefix flushes the whole logical database.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

use crate::cache::{CacheConfig, CacheError, CacheKey, CacheStore};

const SCAN_BATCH: usize = 500;

#[derive(Clone)]
pub struct RedisCacheStore {
    redis: ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("redis", &"<ConnectionManager>")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisCacheStore {
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.redis_url.as_str()).map_err(CacheError::unavailable)?;
        let redis = ConnectionManager::new(client)
            .await
            .map_err(CacheError::unavailable)?;
        Ok(Self {
            redis,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.key_prefix, key.as_str())
    }

    async fn delete_prefixed(&self) -> Result<usize, CacheError> {
        let pattern = prefix_pattern(&self.key_prefix);
        let mut conn = self.redis.clone();
        let mut cursor = 0u64;
        let mut removed = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(CacheError::unavailable)?;

            if !keys.is_empty() {
                let deleted: usize = conn.del(&keys).await.map_err(CacheError::unavailable)?;
                removed += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(removed)
    }
}

/// `SCAN MATCH` pattern for keys under `prefix`, with glob metacharacters in the
/// prefix escaped so they match literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let payload: Option<Vec<u8>> = self
            .redis
            .clone()
            .get(self.storage_key(key))
            .await
            .map_err(CacheError::unavailable)?;
        Ok(payload.map(Bytes::from))
    }

    async fn set(&self, key: &CacheKey, payload: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        let _: () = self
            .redis
            .clone()
            .set_ex(self.storage_key(key), payload.as_ref(), seconds)
            .await
            .map_err(CacheError::unavailable)?;
        Ok(())
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        if self.key_prefix.is_empty() {
            let _: () = redis::cmd("FLUSHDB")
                .query_async(&mut self.redis.clone())
                .await
                .map_err(CacheError::unavailable)?;
            debug!(cache = "redis", "flushed logical database");
            return Ok(());
        }

        let removed = self.delete_prefixed().await?;
        debug!(cache = "redis", removed, prefix = %self.key_prefix, "flushed prefixed keys");
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let _: String = redis::cmd("PING")
            .query_async(&mut self.redis.clone())
            .await
            .map_err(CacheError::unavailable)?;
        Ok(())
    }
}
