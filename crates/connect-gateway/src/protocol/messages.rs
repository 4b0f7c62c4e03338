//! Gateway message format
//!
//! Both directions use JSON text frames tagged by event name. Inbound
//! frames that fail to parse - unknown event kinds included - are
//! ignored by the dispatch layer: no broadcast, no persistence write.

use connect_core::{MediaItem, Snowflake};
use serde::{Deserialize, Serialize};

use crate::events::{
    ChatHistoryPayload, ErrorPayload, MessagePayload, PresenceOfflinePayload,
    PresenceOnlinePayload, ReadReceiptPayload, TypingUpdatePayload, UserPresencePayload,
};

/// Room reference payload (join/leave/typing)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub chat_id: Snowflake,
}

/// Payload of a `send_message` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub chat_id: Snowflake,
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

/// Payload of a `message_read` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReadPayload {
    pub chat_id: Snowflake,
    pub message_id: Snowflake,
}

/// User reference payload (`get_user_presence`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRefPayload {
    pub user_id: Snowflake,
}

/// Messages a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom(RoomPayload),
    LeaveRoom(RoomPayload),
    SendMessage(SendMessagePayload),
    TypingStart(RoomPayload),
    TypingStop(RoomPayload),
    MessageRead(MessageReadPayload),
    UserOnline,
    UserOffline,
    GetUserPresence(UserRefPayload),
}

impl ClientMessage {
    /// Deserialize from a JSON text frame
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Event name for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join_room",
            Self::LeaveRoom(_) => "leave_room",
            Self::SendMessage(_) => "send_message",
            Self::TypingStart(_) => "typing_start",
            Self::TypingStop(_) => "typing_stop",
            Self::MessageRead(_) => "message_read",
            Self::UserOnline => "user_online",
            Self::UserOffline => "user_offline",
            Self::GetUserPresence(_) => "get_user_presence",
        }
    }
}

/// Events the coordinator sends to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ChatHistory(ChatHistoryPayload),
    NewMessage(MessagePayload),
    UserTyping(TypingUpdatePayload),
    UserOnline(PresenceOnlinePayload),
    UserOffline(PresenceOfflinePayload),
    UserPresence(UserPresencePayload),
    MessageRead(ReadReceiptPayload),
    Error(ErrorPayload),
}

impl ServerEvent {
    /// Build an `error` event delivered to the originating connection only
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Event name for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ChatHistory(_) => "chat_history",
            Self::NewMessage(_) => "new_message",
            Self::UserTyping(_) => "user_typing",
            Self::UserOnline(_) => "user_online",
            Self::UserOffline(_) => "user_offline",
            Self::UserPresence(_) => "user_presence",
            Self::MessageRead(_) => "message_read",
            Self::Error(_) => "error",
        }
    }
}
