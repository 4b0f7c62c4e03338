//! Application error types
//!
//! Unified error handling for the coordinator, mapped onto the error
//! taxonomy of the realtime subsystem: authentication errors are fatal to
//! a connection attempt, authorization and persistence errors are
//! recovered locally, ephemeral-store errors degrade silently.

use connect_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authentication")]
    MissingAuth,

    #[error("User account suspended")]
    SuspendedUser,

    // Authorization errors
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Persistence errors
    #[error("Database error: {0}")]
    Database(String),

    // Ephemeral store errors
    #[error("Cache error: {0}")]
    Cache(String),

    // Protocol errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get error code for structured error events
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::MissingAuth => "MISSING_AUTH",
            Self::SuspendedUser => "SUSPENDED_USER",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if this error is fatal to a connection attempt
    ///
    /// Only authentication failures reject the connection itself; every
    /// other error is recovered within the session.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::TokenExpired | Self::MissingAuth | Self::SuspendedUser
        )
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error payload delivered to the originating connection only
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
