//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // Not found
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Chat not found: {0}")]
    ChatNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    // Authorization
    #[error("Not a member of chat {0}")]
    NotAMember(Snowflake),

    // Validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    // Infrastructure (wrapped)
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for structured error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::ChatNotFound(_) => "UNKNOWN_CHAT",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::NotAMember(_) => "NOT_A_MEMBER",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::ChatNotFound(_) | Self::MessageNotFound(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotAMember(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::ContentTooLong { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = DomainError::UserNotFound(Snowflake::new(1));
        assert_eq!(err.code(), "UNKNOWN_USER");

        let err = DomainError::NotAMember(Snowflake::new(5));
        assert_eq!(err.code(), "NOT_A_MEMBER");
    }

    #[test]
    fn test_classifiers() {
        assert!(DomainError::ChatNotFound(Snowflake::new(1)).is_not_found());
        assert!(DomainError::NotAMember(Snowflake::new(1)).is_authorization());
        assert!(DomainError::ContentTooLong { max: 2000 }.is_validation());
        assert!(!DomainError::DatabaseError("x".to_string()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::MessageNotFound(Snowflake::new(123));
        assert_eq!(err.to_string(), "Message not found: 123");
    }
}
