//! Redis connection pool using deadpool-redis.
//!
//! Only needed when the coordinator runs with the Redis-backed ephemeral
//! store (multi-process deployments); single-process deployments use the
//! in-memory store and never open a pool.

use deadpool_redis::{Config, Pool, Runtime};

use crate::store::{StoreError, StoreResult};

/// Redis pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Redis connection URL (e.g., `redis://localhost:6379`)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

impl RedisPoolConfig {
    /// Build from the shared application config, if a Redis URL is set
    pub fn from_app_config(config: &connect_common::RedisConfig) -> Option<Self> {
        config.url.as_ref().map(|url| Self {
            url: url.clone(),
            max_connections: config.max_connections as usize,
        })
    }
}

/// Managed Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisPool {
    /// Create a new Redis pool with the given configuration
    pub fn new(config: RedisPoolConfig) -> StoreResult<Self> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map_err(|e| StoreError::Create(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| StoreError::Create(e.to_string()))?;

        // Redact credentials from URL for logging
        let safe_url = config.url.split('@').next_back().unwrap_or(&config.url);
        tracing::info!(
            url = %safe_url,
            max_connections = config.max_connections,
            "Redis pool created"
        );

        Ok(Self { pool })
    }

    /// Get a connection from the pool
    pub async fn get(&self) -> StoreResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(StoreError::Pool)
    }

    /// Check if the pool is healthy by pinging Redis
    pub async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
