//! Redis-backed history store.
//!
//! History lives in a single Redis list with the newest payload at the head:
//! `LPUSH` + `LTRIM` on append, `LRANGE 0 n-1` on read.

use crate::pool::RedisPool;
use async_trait::async_trait;
use hub_core::{MessageStore, StoreError, StoreResult};
use redis::AsyncCommands;

/// Default list key for the history
pub const DEFAULT_HISTORY_KEY: &str = "hub:history";

/// Bounded history kept in a Redis list
#[derive(Debug, Clone)]
pub struct RedisHistoryStore {
    pool: RedisPool,
    key: String,
    capacity: usize,
}

impl RedisHistoryStore {
    /// Create a store over `key`, retaining at most `capacity` entries
    #[must_use]
    pub fn new(pool: RedisPool, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            pool,
            key: key.into(),
            capacity,
        }
    }

    /// Get the list key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Inclusive `LTRIM` stop index keeping `capacity` entries
    fn trim_stop(&self) -> isize {
        isize::try_from(self.capacity.saturating_sub(1)).unwrap_or(isize::MAX)
    }

    /// Inclusive `LRANGE` stop index for the newest `n` entries
    fn range_stop(n: usize) -> isize {
        isize::try_from(n - 1).unwrap_or(isize::MAX)
    }
}

#[async_trait]
impl MessageStore for RedisHistoryStore {
    async fn append(&self, payload: &str) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;

        redis::pipe()
            .atomic()
            .lpush(&self.key, payload)
            .ignore()
            .ltrim(&self.key, 0, self.trim_stop())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(crate::RedisPoolError::from)?;

        tracing::trace!(key = %self.key, "History entry appended");

        Ok(())
    }

    async fn recent(&self, n: usize) -> StoreResult<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let raw: Vec<Vec<u8>> = conn
            .lrange(&self.key, 0, Self::range_stop(n))
            .await
            .map_err(crate::RedisPoolError::from)?;

        raw.into_iter()
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .collect()
    }
}
