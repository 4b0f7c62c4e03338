//! Application configuration structs
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub coordinator: CoordinatorConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Listener configuration for the gateway server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
///
/// The URL is optional: without one the coordinator runs on its in-memory
/// ephemeral store, which is sufficient for a single-process deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Credential verification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry: i64,
}

/// Coordinator tunables
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    /// Presence record TTL in seconds, renewed only by explicit online signals
    #[serde(default = "default_presence_ttl_secs")]
    pub presence_ttl_secs: u64,
    /// Typing record TTL in seconds
    #[serde(default = "default_typing_ttl_secs")]
    pub typing_ttl_secs: u64,
    /// Upper bound on any single authorization query or persistence write
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
    /// Outbound channel buffer per connection
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
    /// Number of recent messages delivered on room join
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            presence_ttl_secs: default_presence_ttl_secs(),
            typing_ttl_secs: default_typing_ttl_secs(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            session_buffer: default_session_buffer(),
            history_limit: default_history_limit(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "connect-realtime".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_presence_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_typing_ttl_secs() -> u64 {
    10
}

fn default_collaborator_timeout_ms() -> u64 {
    5_000
}

fn default_session_buffer() -> usize {
    100
}

fn default_history_limit() -> i64 {
    50
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: env::var("WS_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("WS_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or_else(default_port),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", default_max_connections()),
                min_connections: env_parse("DATABASE_MIN_CONNECTIONS", default_min_connections()),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok(),
                max_connections: env_parse("REDIS_MAX_CONNECTIONS", default_redis_max_connections()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
                token_expiry: env_parse("JWT_TOKEN_EXPIRY", default_token_expiry()),
            },
            coordinator: CoordinatorConfig {
                presence_ttl_secs: env_parse("PRESENCE_TTL_SECS", default_presence_ttl_secs()),
                typing_ttl_secs: env_parse("TYPING_TTL_SECS", default_typing_ttl_secs()),
                collaborator_timeout_ms: env_parse(
                    "COLLABORATOR_TIMEOUT_MS",
                    default_collaborator_timeout_ms(),
                ),
                session_buffer: env_parse("SESSION_BUFFER", default_session_buffer()),
                history_limit: env_parse("HISTORY_LIMIT", default_history_limit()),
            },
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.presence_ttl_secs, 300);
        assert_eq!(config.typing_ttl_secs, 10);
        assert_eq!(config.collaborator_timeout_ms, 5_000);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_server_address() {
        let server = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3001,
        };
        assert_eq!(server.address(), "0.0.0.0:3001");
    }

    #[test]
    fn test_environment_classifiers() {
        assert!(Environment::Production.is_production());
        assert!(Environment::Development.is_development());
        assert!(!Environment::Staging.is_production());
    }
}
