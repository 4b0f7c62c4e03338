//! User entity - an account known to the platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// User account as stored by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: Snowflake, name: String, handle: String, email: String) -> Self {
        Self {
            id,
            name,
            handle,
            email,
            avatar_url: None,
            suspended: false,
            created_at: Utc::now(),
        }
    }

    /// Set the avatar URL
    #[must_use]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Display identity embedded in realtime events
///
/// The subset of a user's profile other clients need to render a
/// message or presence entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Snowflake,
    pub name: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            handle: user.handle.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new(
            Snowflake::new(1),
            "Ada".to_string(),
            "ada".to_string(),
            "ada@example.com".to_string(),
        );
        assert!(!user.suspended);
        assert!(user.avatar_url.is_none());
    }

    #[test]
    fn test_user_summary_from_user() {
        let user = User::new(
            Snowflake::new(7),
            "Ada".to_string(),
            "ada".to_string(),
            "ada@example.com".to_string(),
        )
        .with_avatar_url("https://cdn.example.com/a.png");

        let summary = UserSummary::from(&user);
        assert_eq!(summary.id, user.id);
        assert_eq!(summary.handle, "ada");
        assert_eq!(
            summary.avatar_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_user_summary_wire_fields() {
        let summary = UserSummary {
            id: Snowflake::new(1),
            name: "Ada".to_string(),
            handle: "ada".to_string(),
            avatar_url: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["id"], "1");
        assert!(json.get("avatarUrl").is_none());
    }
}
