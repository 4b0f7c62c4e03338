//! Error handling utilities for repositories

use connect_core::{DomainError, Snowflake};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Create a "message not found" error
pub fn message_not_found(id: Snowflake) -> DomainError {
    DomainError::MessageNotFound(id)
}

/// Create a "chat not found" error
pub fn chat_not_found(id: Snowflake) -> DomainError {
    DomainError::ChatNotFound(id)
}
