//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. These are intentionally limited to the
//! operations the realtime coordinator performs; no CRUD surface beyond
//! that is exposed here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Message, MessageView, User};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>>;
}

// ============================================================================
// Chat Repository
// ============================================================================

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Bump the chat's `updated_at` to now (touch-on-activity)
    async fn touch(&self, id: Snowflake) -> RepoResult<()>;
}

// ============================================================================
// Chat Member Repository
// ============================================================================

#[async_trait]
pub trait ChatMemberRepository: Send + Sync {
    /// Check whether a user is currently a member of a chat
    ///
    /// Callers must not cache the answer across requests: membership can
    /// change between any two actions.
    async fn is_member(&self, chat_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message, returning the stored record
    ///
    /// The returned record is the canonical payload for fan-out.
    async fn create(&self, message: &Message) -> RepoResult<Message>;

    /// Fetch the most recent messages of a chat, newest first, joined
    /// with each sender's display identity
    async fn list_recent(&self, chat_id: Snowflake, limit: i64) -> RepoResult<Vec<MessageView>>;

    /// Record the read timestamp of a message
    async fn mark_read(&self, message_id: Snowflake, read_at: DateTime<Utc>) -> RepoResult<()>;
}
