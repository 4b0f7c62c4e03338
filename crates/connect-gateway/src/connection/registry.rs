//! Session registry
//!
//! Exclusive owner of all live connection sessions, using DashMap for
//! thread-safe access. Room state holds session IDs only and resolves
//! live handles through the registry, so room membership never keeps a
//! dead session alive.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use connect_core::Snowflake;

use super::Connection;

/// Registry of all live sessions and the room -> session index
pub struct SessionRegistry {
    /// Live sessions by session ID
    sessions: DashMap<String, Arc<Connection>>,

    /// Room ID to session IDs subscribed to it
    rooms: DashMap<Snowflake, HashSet<String>>,
}

impl SessionRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register an authenticated session
    pub fn insert(&self, connection: Arc<Connection>) {
        let session_id = connection.session_id().to_string();
        self.sessions.insert(session_id.clone(), connection);

        tracing::debug!(session_id = %session_id, "Session registered");
    }

    /// Deregister a session and clear its room index entries
    ///
    /// Uses `alter` for atomic modify-and-cleanup so a concurrent join to
    /// the same room neither crashes nor leaks an index entry.
    pub fn remove(&self, session_id: &str) -> Option<Arc<Connection>> {
        let (_, connection) = self.sessions.remove(session_id)?;

        for chat_id in connection.rooms() {
            self.rooms.alter(&chat_id, |_, mut sessions| {
                sessions.remove(session_id);
                sessions
            });
        }
        self.rooms.retain(|_, sessions| !sessions.is_empty());

        tracing::debug!(session_id = %session_id, "Session deregistered");

        Some(connection)
    }

    /// Get a session by ID
    pub fn get(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.sessions.get(session_id).map(|r| r.clone())
    }

    /// Check if a session is registered
    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Subscribe a session to a room
    pub fn join_room(&self, session_id: &str, chat_id: Snowflake) -> bool {
        if let Some(connection) = self.sessions.get(session_id) {
            connection.join_room(chat_id);

            self.rooms
                .entry(chat_id)
                .or_default()
                .insert(session_id.to_string());

            tracing::trace!(
                session_id = %session_id,
                chat_id = %chat_id,
                "Session joined room"
            );

            true
        } else {
            false
        }
    }

    /// Unsubscribe a session from a room
    pub fn leave_room(&self, session_id: &str, chat_id: Snowflake) -> bool {
        if let Some(connection) = self.sessions.get(session_id) {
            connection.leave_room(chat_id);

            self.rooms.alter(&chat_id, |_, mut sessions| {
                sessions.remove(session_id);
                sessions
            });
            self.rooms.retain(|_, sessions| !sessions.is_empty());

            tracing::trace!(
                session_id = %session_id,
                chat_id = %chat_id,
                "Session left room"
            );

            true
        } else {
            false
        }
    }

    /// Snapshot of all sessions subscribed to a room
    ///
    /// The returned handles are stable against concurrent join/leave; a
    /// broadcast iterates the snapshot, never the live index.
    pub fn room_sessions(&self, chat_id: Snowflake) -> Vec<Arc<Connection>> {
        self.rooms
            .get(&chat_id)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter_map(|sid| self.sessions.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of every live session
    pub fn all_sessions(&self) -> Vec<Arc<Connection>> {
        self.sessions.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of rooms with at least one subscribed session
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("rooms", &self.rooms.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_core::UserSummary;
    use tokio::sync::mpsc;

    fn make_connection(session_id: &str, user_id: i64) -> Arc<Connection> {
        let (tx, _rx) = mpsc::channel(10);
        let user = UserSummary {
            id: Snowflake::new(user_id),
            name: "Test".to_string(),
            handle: format!("user{user_id}"),
            avatar_url: None,
        };
        Connection::new(session_id.to_string(), user, tx)
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let registry = SessionRegistry::new();

        registry.insert(make_connection("s1", 1));
        assert_eq!(registry.session_count(), 1);
        assert!(registry.has_session("s1"));

        let removed = registry.remove("s1").unwrap();
        assert_eq!(removed.session_id(), "s1");
        assert_eq!(registry.session_count(), 0);
        assert!(registry.remove("s1").is_none());
    }

    #[tokio::test]
    async fn test_join_and_leave_room() {
        let registry = SessionRegistry::new();
        let chat = Snowflake::new(100);

        registry.insert(make_connection("s1", 1));

        assert!(registry.join_room("s1", chat));
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.room_sessions(chat).len(), 1);

        assert!(registry.leave_room("s1", chat));
        assert_eq!(registry.room_count(), 0);
        assert!(registry.room_sessions(chat).is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(!registry.join_room("ghost", Snowflake::new(1)));
        assert!(!registry.leave_room("ghost", Snowflake::new(1)));
    }

    #[tokio::test]
    async fn test_remove_clears_room_index() {
        let registry = SessionRegistry::new();
        let chat = Snowflake::new(100);

        registry.insert(make_connection("s1", 1));
        registry.insert(make_connection("s2", 2));
        registry.join_room("s1", chat);
        registry.join_room("s2", chat);

        registry.remove("s1");

        let remaining = registry.room_sessions(chat);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].session_id(), "s2");
    }

    #[tokio::test]
    async fn test_many_rooms_per_session() {
        let registry = SessionRegistry::new();

        registry.insert(make_connection("s1", 1));
        registry.join_room("s1", Snowflake::new(1));
        registry.join_room("s1", Snowflake::new(2));
        registry.join_room("s1", Snowflake::new(3));

        assert_eq!(registry.room_count(), 3);

        registry.remove("s1");
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_all_sessions_snapshot() {
        let registry = SessionRegistry::new();
        registry.insert(make_connection("s1", 1));
        registry.insert(make_connection("s2", 2));

        assert_eq!(registry.all_sessions().len(), 2);
    }
}
