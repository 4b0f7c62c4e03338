//! Configuration loading

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, AuthConfig, ConfigError, CoordinatorConfig, DatabaseConfig,
    Environment, RedisConfig, ServerConfig,
};
