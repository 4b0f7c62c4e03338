//! Individual connection session
//!
//! One authenticated live transport connection. The user identity is
//! fixed at construction: authentication happens before a session is
//! ever registered, so there is no unauthenticated session state.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use connect_core::{Snowflake, UserSummary};

use crate::protocol::ServerEvent;

/// A single authenticated connection session
pub struct Connection {
    /// Unique session ID
    session_id: String,

    /// Authenticated user's display identity
    user: UserSummary,

    /// Rooms this session is currently subscribed to
    rooms: RwLock<HashSet<Snowflake>>,

    /// Channel to the task draining events into the WebSocket
    sender: mpsc::Sender<ServerEvent>,

    /// Set by the first teardown; guarantees the disconnect path runs once
    torn_down: AtomicBool,

    /// Connection establishment time
    connected_at: Instant,
}

impl Connection {
    /// Create a new connection session
    pub fn new(session_id: String, user: UserSummary, sender: mpsc::Sender<ServerEvent>) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            user,
            rooms: RwLock::new(HashSet::new()),
            sender,
            torn_down: AtomicBool::new(false),
            connected_at: Instant::now(),
        })
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the authenticated user's display identity
    pub fn user(&self) -> &UserSummary {
        &self.user
    }

    /// Get the authenticated user's ID
    pub fn user_id(&self) -> Snowflake {
        self.user.id
    }

    /// Add a room to this session's room set
    pub fn join_room(&self, chat_id: Snowflake) {
        self.rooms.write().insert(chat_id);
    }

    /// Remove a room from this session's room set
    pub fn leave_room(&self, chat_id: Snowflake) -> bool {
        self.rooms.write().remove(&chat_id)
    }

    /// Check if this session is subscribed to a room
    pub fn is_in_room(&self, chat_id: Snowflake) -> bool {
        self.rooms.read().contains(&chat_id)
    }

    /// Snapshot of all subscribed rooms
    pub fn rooms(&self) -> Vec<Snowflake> {
        self.rooms.read().iter().copied().collect()
    }

    /// Send an event to this connection, waiting for buffer space
    pub async fn send(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<ServerEvent>> {
        self.sender.send(event).await
    }

    /// Try to send an event without blocking
    ///
    /// Fan-out paths use this so one slow consumer never delays delivery
    /// to the rest of a room.
    pub fn try_send(&self, event: ServerEvent) -> Result<(), mpsc::error::TrySendError<ServerEvent>> {
        self.sender.try_send(event)
    }

    /// Check if the outbound channel is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Claim the teardown path; returns true exactly once per session
    pub fn begin_teardown(&self) -> bool {
        !self.torn_down.swap(true, Ordering::SeqCst)
    }

    /// Get connection age
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user.id)
            .field("rooms", &self.rooms.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64) -> UserSummary {
        UserSummary {
            id: Snowflake::new(id),
            name: "Ada".to_string(),
            handle: "ada".to_string(),
            avatar_url: None,
        }
    }

    fn connection(buffer: usize) -> (Arc<Connection>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Connection::new("session1".to_string(), summary(42), tx), rx)
    }

    #[tokio::test]
    async fn test_connection_identity() {
        let (conn, _rx) = connection(10);
        assert_eq!(conn.session_id(), "session1");
        assert_eq!(conn.user_id(), Snowflake::new(42));
        assert_eq!(conn.user().handle, "ada");
    }

    #[tokio::test]
    async fn test_room_set() {
        let (conn, _rx) = connection(10);
        let room1 = Snowflake::new(1);
        let room2 = Snowflake::new(2);

        assert!(conn.rooms().is_empty());

        conn.join_room(room1);
        conn.join_room(room2);
        assert!(conn.is_in_room(room1));
        assert!(conn.is_in_room(room2));
        assert_eq!(conn.rooms().len(), 2);

        assert!(conn.leave_room(room1));
        assert!(!conn.is_in_room(room1));
        assert!(!conn.leave_room(room1));
    }

    #[tokio::test]
    async fn test_try_send_reports_full_buffer() {
        let (conn, mut rx) = connection(1);

        assert!(conn.try_send(ServerEvent::error("one")).is_ok());
        assert!(matches!(
            conn.try_send(ServerEvent::error("two")),
            Err(mpsc::error::TrySendError::Full(_))
        ));

        rx.recv().await.unwrap();
        assert!(conn.try_send(ServerEvent::error("three")).is_ok());
    }

    #[tokio::test]
    async fn test_teardown_claimed_once() {
        let (conn, _rx) = connection(10);
        assert!(conn.begin_teardown());
        assert!(!conn.begin_teardown());
        assert!(!conn.begin_teardown());
    }

    #[tokio::test]
    async fn test_closed_after_receiver_drop() {
        let (conn, rx) = connection(10);
        assert!(!conn.is_closed());
        drop(rx);
        assert!(conn.is_closed());
    }
}
