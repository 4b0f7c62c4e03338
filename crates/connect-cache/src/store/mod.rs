//! Ephemeral store abstraction
//!
//! A TTL-keyed string store with `set`/`get`/`delete`/`scan_prefix`,
//! independent of any backing technology. Expired entries are treated as
//! absent by every operation.

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use async_trait::async_trait;
use std::time::Duration;

/// Error type for ephemeral store operations
///
/// Callers on the presence/typing path treat these as degraded
/// visibility, not failures: the store fails open.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to create store backend: {0}")]
    Create(String),

    #[error("Failed to get connection from pool: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Result type for ephemeral store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// TTL-keyed ephemeral string store
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Set a key with a time-to-live, overwriting any existing entry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Get an unexpired value, or None
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Delete a key, returning whether an unexpired entry existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// List all unexpired keys starting with the given prefix
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
