//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
}
