//! Presence tracker
//!
//! Online/offline status per user with a sliding TTL. The invariant is
//! that absence of a record equals offline: going online writes a
//! TTL-bounded marker, going offline deletes the key outright so a stale
//! entry can never linger past a clean disconnect. The TTL is renewed
//! only by explicit online signals, never by ordinary traffic, which
//! bounds how long a silently-dropped connection can appear online.

use std::sync::Arc;
use std::time::Duration;

use connect_core::Snowflake;
use serde::{Deserialize, Serialize};

use crate::store::{EphemeralStore, StoreResult};

/// Key prefix for presence records
const PRESENCE_PREFIX: &str = "presence:";

/// Marker value stored for an online user
const ONLINE_MARKER: &str = "online";

/// User presence status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Tracks per-user online status over the ephemeral store
#[derive(Clone)]
pub struct PresenceTracker {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
}

impl PresenceTracker {
    /// Create a tracker with the given TTL
    pub fn new(store: Arc<dyn EphemeralStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn presence_key(user_id: Snowflake) -> String {
        format!("{PRESENCE_PREFIX}{user_id}")
    }

    /// Mark a user online with a fresh TTL
    pub async fn set_online(&self, user_id: Snowflake) -> StoreResult<()> {
        self.store
            .set(&Self::presence_key(user_id), ONLINE_MARKER, self.ttl)
            .await?;

        tracing::debug!(user_id = %user_id, "User presence set to online");
        Ok(())
    }

    /// Mark a user offline by deleting the record
    pub async fn set_offline(&self, user_id: Snowflake) -> StoreResult<bool> {
        let removed = self.store.delete(&Self::presence_key(user_id)).await?;

        tracing::debug!(user_id = %user_id, "User presence set to offline");
        Ok(removed)
    }

    /// Get a user's current status; absent or expired means offline
    pub async fn get(&self, user_id: Snowflake) -> StoreResult<PresenceStatus> {
        let status = match self.store.get(&Self::presence_key(user_id)).await? {
            Some(value) if value == ONLINE_MARKER => PresenceStatus::Online,
            _ => PresenceStatus::Offline,
        };
        Ok(status)
    }
}
