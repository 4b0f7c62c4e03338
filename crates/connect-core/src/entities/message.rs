//! Message entity - a persisted chat message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::UserSummary;
use crate::value_objects::Snowflake;

/// Attached media item (image, video, document)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub size: i64,
    pub name: String,
}

/// A chat message with a server-assigned ID and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub chat_id: Snowflake,
    pub sender_id: Snowflake,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new message ready for persistence
    ///
    /// The ID must come from the server-side generator; client-supplied
    /// identities are never trusted.
    pub fn new(
        id: Snowflake,
        chat_id: Snowflake,
        sender_id: Snowflake,
        content: String,
        media: Vec<MediaItem>,
    ) -> Self {
        Self {
            id,
            chat_id,
            sender_id,
            content,
            media,
            created_at: Utc::now(),
            read_at: None,
        }
    }
}

/// Message joined with its sender's display identity
///
/// The projection the persistence collaborator returns for history reads
/// and the canonical payload shape for new-message fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub message: Message,
    pub sender: UserSummary,
}

impl MessageView {
    /// Build a view from a message and the already-known sender identity
    pub fn new(message: Message, sender: UserSummary) -> Self {
        Self { message, sender }
    }
}
