//! PostgreSQL implementation of ChatMemberRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use connect_core::{ChatMemberRepository, RepoResult, Snowflake};

use super::error::map_db_error;

/// PostgreSQL implementation of ChatMemberRepository
///
/// Intentionally uncached: authorization checks hit the table every
/// time, so a user removed from a group stops receiving its traffic on
/// their very next action.
#[derive(Clone)]
pub struct PgChatMemberRepository {
    pool: PgPool,
}

impl PgChatMemberRepository {
    /// Create a new PgChatMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMemberRepository for PgChatMemberRepository {
    #[instrument(skip(self))]
    async fn is_member(&self, chat_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM chat_members
                WHERE chat_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(chat_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(exists)
    }
}
