//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;

use connect_core::{Message, MessageRepository, MessageView, RepoResult, Snowflake};

use crate::models::{MessageModel, MessageWithSenderModel};

use super::error::{map_db_error, message_not_found};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message))]
    async fn create(&self, message: &Message) -> RepoResult<Message> {
        let row = sqlx::query_as::<_, MessageModel>(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, content, media, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, chat_id, sender_id, content, media, created_at, read_at
            "#,
        )
        .bind(message.id.into_inner())
        .bind(message.chat_id.into_inner())
        .bind(message.sender_id.into_inner())
        .bind(&message.content)
        .bind(Json(&message.media))
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Message::from(row))
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, chat_id: Snowflake, limit: i64) -> RepoResult<Vec<MessageView>> {
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as::<_, MessageWithSenderModel>(
            r#"
            SELECT m.id, m.chat_id, m.sender_id, m.content, m.media,
                   m.created_at, m.read_at,
                   u.name AS sender_name,
                   u.handle AS sender_handle,
                   u.avatar_url AS sender_avatar_url
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.chat_id = $1
            ORDER BY m.id DESC
            LIMIT $2
            "#,
        )
        .bind(chat_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(MessageView::from).collect())
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, message_id: Snowflake, read_at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_at = $2
            WHERE id = $1
            "#,
        )
        .bind(message_id.into_inner())
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(message_not_found(message_id));
        }

        Ok(())
    }
}
