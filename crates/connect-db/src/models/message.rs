//! Message database models

use chrono::{DateTime, Utc};
use connect_core::MediaItem;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for the messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub media: Json<Vec<MediaItem>>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl MessageModel {
    /// Check if the message has been read
    #[inline]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Message row joined with its sender's display columns
///
/// Shape of the history query: one row per message with the sender's
/// identity resolved in the same round trip.
#[derive(Debug, Clone, FromRow)]
pub struct MessageWithSenderModel {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub media: Json<Vec<MediaItem>>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub sender_name: String,
    pub sender_handle: String,
    pub sender_avatar_url: Option<String>,
}
