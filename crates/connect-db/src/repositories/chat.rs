//! PostgreSQL implementation of ChatRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use connect_core::{ChatRepository, RepoResult, Snowflake};

use super::error::{chat_not_found, map_db_error};

/// PostgreSQL implementation of ChatRepository
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    /// Create a new PgChatRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    #[instrument(skip(self))]
    async fn touch(&self, id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chats
            SET updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(chat_not_found(id));
        }

        Ok(())
    }
}
