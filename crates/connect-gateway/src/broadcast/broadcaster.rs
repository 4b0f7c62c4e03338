//! Room broadcaster
//!
//! Fans events out to every session subscribed to a room. Two guarantees
//! hold per room: publishes are delivered to each subscriber in
//! invocation order (a per-room mutex serializes the snapshot-and-enqueue
//! step, and each session's channel is FIFO), and a slow or dead
//! subscriber never delays the others (delivery is `try_send`; a full or
//! closed channel is skipped). Publishes to different rooms never
//! contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use connect_core::Snowflake;

use crate::connection::{Connection, SessionRegistry};
use crate::protocol::ServerEvent;

/// Fans out events to room subscribers and to all sessions
pub struct RoomBroadcaster {
    /// Registry resolving session IDs to live handles
    registry: Arc<SessionRegistry>,

    /// Per-room publish serialization; never removed while the process
    /// lives, so two publishers can never hold different locks for the
    /// same room
    room_locks: DashMap<Snowflake, Arc<Mutex<()>>>,
}

impl RoomBroadcaster {
    /// Create a new broadcaster over a registry
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            room_locks: DashMap::new(),
        }
    }

    fn room_lock(&self, chat_id: Snowflake) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Deliver an event to every session subscribed to a room, except
    /// the excluded session if given
    ///
    /// Returns the number of sessions the event was enqueued for.
    pub async fn publish(
        &self,
        chat_id: Snowflake,
        event: ServerEvent,
        exclude_session: Option<&str>,
    ) -> usize {
        let lock = self.room_lock(chat_id);
        let _guard = lock.lock().await;

        let targets = self.registry.room_sessions(chat_id);
        let mut sent = 0;

        for connection in targets {
            if exclude_session == Some(connection.session_id()) {
                continue;
            }
            if Self::deliver(&connection, event.clone()) {
                sent += 1;
            }
        }

        tracing::trace!(
            chat_id = %chat_id,
            event = event.kind(),
            sent = sent,
            "Event published to room"
        );

        sent
    }

    /// Deliver an event to every live session, except the excluded one
    ///
    /// Used for presence updates, which any connected peer may care
    /// about. No cross-session ordering is guaranteed.
    pub fn broadcast_all(&self, event: ServerEvent, exclude_session: Option<&str>) -> usize {
        let mut sent = 0;

        for connection in self.registry.all_sessions() {
            if exclude_session == Some(connection.session_id()) {
                continue;
            }
            if Self::deliver(&connection, event.clone()) {
                sent += 1;
            }
        }

        tracing::trace!(event = event.kind(), sent = sent, "Event broadcast to all sessions");

        sent
    }

    /// Enqueue without blocking; per-connection failures are isolated
    fn deliver(connection: &Arc<Connection>, event: ServerEvent) -> bool {
        match connection.try_send(event) {
            Ok(()) => true,
            Err(tokio::sync::mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    session_id = %connection.session_id(),
                    event = event.kind(),
                    "Dropping event for slow consumer"
                );
                false
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                tracing::trace!(
                    session_id = %connection.session_id(),
                    "Skipping delivery to closed session"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for RoomBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomBroadcaster")
            .field("rooms_seen", &self.room_locks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_core::UserSummary;
    use tokio::sync::mpsc;

    fn session(
        registry: &SessionRegistry,
        session_id: &str,
        user_id: i64,
        buffer: usize,
    ) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(buffer);
        let user = UserSummary {
            id: Snowflake::new(user_id),
            name: "Test".to_string(),
            handle: format!("user{user_id}"),
            avatar_url: None,
        };
        registry.insert(Connection::new(session_id.to_string(), user, tx));
        rx
    }

    #[tokio::test]
    async fn test_publish_reaches_room_members_only() {
        let registry = SessionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry.clone());
        let chat = Snowflake::new(1);

        let mut rx_member = session(&registry, "member", 1, 10);
        let mut rx_outsider = session(&registry, "outsider", 2, 10);
        registry.join_room("member", chat);

        let sent = broadcaster.publish(chat, ServerEvent::error("x"), None).await;
        assert_eq!(sent, 1);

        assert!(rx_member.try_recv().is_ok());
        assert!(rx_outsider.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_order_preserved_per_room() {
        let registry = SessionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry.clone());
        let chat = Snowflake::new(1);

        let mut rx = session(&registry, "s1", 1, 64);
        registry.join_room("s1", chat);

        for i in 0..20 {
            broadcaster
                .publish(chat, ServerEvent::error(format!("event-{i}")), None)
                .await;
        }

        for i in 0..20 {
            match rx.recv().await.unwrap() {
                ServerEvent::Error(payload) => assert_eq!(payload.message, format!("event-{i}")),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_publish_excludes_originating_session() {
        let registry = SessionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry.clone());
        let chat = Snowflake::new(1);

        let mut rx_sender = session(&registry, "sender", 1, 10);
        let mut rx_peer = session(&registry, "peer", 2, 10);
        registry.join_room("sender", chat);
        registry.join_room("peer", chat);

        let sent = broadcaster
            .publish(chat, ServerEvent::error("x"), Some("sender"))
            .await;
        assert_eq!(sent, 1);

        assert!(rx_sender.try_recv().is_err());
        assert!(rx_peer.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_slow_consumer_does_not_block_others() {
        let registry = SessionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry.clone());
        let chat = Snowflake::new(1);

        // Buffer of one, never drained: the second publish overflows it
        let _rx_slow = session(&registry, "slow", 1, 1);
        let mut rx_fast = session(&registry, "fast", 2, 10);
        registry.join_room("slow", chat);
        registry.join_room("fast", chat);

        let first = broadcaster.publish(chat, ServerEvent::error("a"), None).await;
        let second = broadcaster.publish(chat, ServerEvent::error("b"), None).await;

        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert!(rx_fast.try_recv().is_ok());
        assert!(rx_fast.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_all_excludes_session() {
        let registry = SessionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry.clone());

        let mut rx_self = session(&registry, "self", 1, 10);
        let mut rx_peer1 = session(&registry, "peer1", 2, 10);
        let mut rx_peer2 = session(&registry, "peer2", 3, 10);

        let sent = broadcaster.broadcast_all(ServerEvent::error("x"), Some("self"));
        assert_eq!(sent, 2);

        assert!(rx_self.try_recv().is_err());
        assert!(rx_peer1.try_recv().is_ok());
        assert!(rx_peer2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_publish_to_empty_room() {
        let registry = SessionRegistry::new_shared();
        let broadcaster = RoomBroadcaster::new(registry);

        let sent = broadcaster
            .publish(Snowflake::new(99), ServerEvent::error("x"), None)
            .await;
        assert_eq!(sent, 0);
    }
}
