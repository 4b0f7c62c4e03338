//! # connect-common
//!
//! Shared utilities including configuration, error handling, credential
//! verification, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, JwtService, TokenVerifier};
pub use config::{
    AppConfig, AppSettings, AuthConfig, ConfigError, CoordinatorConfig, DatabaseConfig,
    Environment, RedisConfig, ServerConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
