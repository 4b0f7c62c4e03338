//! Event payload definitions
//!
//! Data structures for each outbound event type. IDs serialize as
//! strings, timestamps as RFC 3339.

use chrono::{DateTime, Utc};
use connect_cache::PresenceStatus;
use connect_core::{MediaItem, MessageView, Snowflake, UserSummary};
use serde::{Deserialize, Serialize};

/// Full persisted message record as broadcast to a room
///
/// Always carries the server-assigned ID and timestamp; a
/// client-supplied message identity is never echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: Snowflake,
    pub chat_id: Snowflake,
    pub sender_id: Snowflake,
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    pub sender: UserSummary,
}

impl From<MessageView> for MessagePayload {
    fn from(view: MessageView) -> Self {
        let message = view.message;
        Self {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            media: message.media,
            created_at: message.created_at,
            read_at: message.read_at,
            sender: view.sender,
        }
    }
}

/// `chat_history` payload delivered to a joining session only
///
/// Messages are ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryPayload {
    pub chat_id: Snowflake,
    pub messages: Vec<MessagePayload>,
}

/// `user_typing` payload - the room's current typing set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdatePayload {
    pub chat_id: Snowflake,
    pub typing_user_ids: Vec<Snowflake>,
}

/// `user_online` payload - includes the display identity so peers can
/// render the user without a lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceOnlinePayload {
    pub user_id: Snowflake,
    pub user: UserSummary,
}

/// `user_offline` payload - only the user ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceOfflinePayload {
    pub user_id: Snowflake,
}

/// `user_presence` payload - reply to a presence query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresencePayload {
    pub user_id: Snowflake,
    pub status: PresenceStatus,
}

/// `message_read` payload - read receipt fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceiptPayload {
    pub message_id: Snowflake,
    pub read_by: Snowflake,
    pub read_at: DateTime<Utc>,
}

/// `error` payload - delivered to the originating connection only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}
