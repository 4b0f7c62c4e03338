//! Redis-backed ephemeral store
//!
//! Maps the store contract directly onto Redis primitives: `SET key value
//! EX ttl`, `GET`, `DEL`, and cursor-based `SCAN MATCH prefix*` for the
//! per-room typing listing. TTL enforcement is native to Redis, so no
//! sweep is needed.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

use super::{EphemeralStore, StoreResult};
use crate::pool::RedisPool;

/// Redis-backed TTL store for multi-process deployments
#[derive(Clone)]
pub struct RedisStore {
    pool: RedisPool,
}

impl RedisStore {
    /// Create a new store over a Redis pool
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EphemeralStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;
        // SET EX takes whole seconds; round up so a sub-second TTL is not zero
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let pattern = format!("{prefix}*");

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}
