//! Chat database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the chats table
#[derive(Debug, Clone, FromRow)]
pub struct ChatModel {
    pub id: i64,
    pub is_group: bool,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
