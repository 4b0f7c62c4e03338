//! Typing indicator aggregator
//!
//! Per-room sets of currently-typing users. Each (room, user) pair is a
//! TTL-bounded key with no payload beyond existence: a user appears in a
//! room's typing set iff an unexpired record exists for the pair. The
//! same user may be typing in several rooms at once, each independently
//! TTL'd.

use std::sync::Arc;
use std::time::Duration;

use connect_core::Snowflake;

use crate::store::{EphemeralStore, StoreResult};

/// Key prefix for typing records
const TYPING_PREFIX: &str = "typing:";

/// Marker value stored while a user is typing
const TYPING_MARKER: &str = "typing";

/// Tracks who is typing in which room over the ephemeral store
#[derive(Clone)]
pub struct TypingTracker {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
}

impl TypingTracker {
    /// Create a tracker with the given TTL
    pub fn new(store: Arc<dyn EphemeralStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn typing_key(chat_id: Snowflake, user_id: Snowflake) -> String {
        format!("{TYPING_PREFIX}{chat_id}:{user_id}")
    }

    fn room_prefix(chat_id: Snowflake) -> String {
        format!("{TYPING_PREFIX}{chat_id}:")
    }

    /// Record that a user started (or is still) typing; refreshes the TTL
    pub async fn start(&self, chat_id: Snowflake, user_id: Snowflake) -> StoreResult<()> {
        self.store
            .set(&Self::typing_key(chat_id, user_id), TYPING_MARKER, self.ttl)
            .await?;

        tracing::trace!(chat_id = %chat_id, user_id = %user_id, "Typing indicator set");
        Ok(())
    }

    /// Clear a user's typing record for a room
    pub async fn stop(&self, chat_id: Snowflake, user_id: Snowflake) -> StoreResult<bool> {
        let removed = self
            .store
            .delete(&Self::typing_key(chat_id, user_id))
            .await?;

        tracing::trace!(chat_id = %chat_id, user_id = %user_id, "Typing indicator cleared");
        Ok(removed)
    }

    /// List users with an unexpired typing record in a room
    pub async fn list_typing(&self, chat_id: Snowflake) -> StoreResult<Vec<Snowflake>> {
        let prefix = Self::room_prefix(chat_id);
        let keys = self.store.scan_prefix(&prefix).await?;

        let mut user_ids: Vec<Snowflake> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|suffix| suffix.parse().ok())
            .collect();
        user_ids.sort_unstable();

        Ok(user_ids)
    }
}
