//! Chat entity - a room shared by two or more users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// A chat room (1:1 or group)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: Snowflake,
    /// Group chats have more than two members and may carry a name
    pub group: bool,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every message send (touch-on-activity)
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Create a new direct (1:1) chat
    pub fn direct(id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            group: false,
            name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new group chat with a name
    pub fn group(id: Snowflake, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            group: true,
            name: Some(name.into()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Role of a user within a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Admin,
    Owner,
}

impl Default for MemberRole {
    fn default() -> Self {
        Self::Member
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Admin => write!(f, "admin"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

impl std::str::FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(format!("Invalid member role: {s}")),
        }
    }
}

/// Membership record linking a user to a chat
///
/// The authoritative copy lives in the persistence collaborator; the
/// coordinator re-reads it per authorization-sensitive action and never
/// caches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMember {
    pub chat_id: Snowflake,
    pub user_id: Snowflake,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl ChatMember {
    /// Create a new membership record with the default role
    pub fn new(chat_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            chat_id,
            user_id,
            role: MemberRole::Member,
            joined_at: Utc::now(),
        }
    }
}
