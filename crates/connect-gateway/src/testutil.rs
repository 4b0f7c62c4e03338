//! In-memory collaborators for handler-level tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use connect_cache::{MemoryStore, PresenceTracker, TypingTracker};
use connect_common::{AppError, TokenVerifier};
use connect_core::{
    ChatMemberRepository, ChatRepository, DomainError, Message, MessageRepository, MessageView,
    RepoResult, Snowflake, User, UserRepository, UserSummary,
};

use crate::broadcast::RoomBroadcaster;
use crate::connection::{Connection, SessionRegistry};
use crate::protocol::{RoomPayload, SendMessagePayload, ServerEvent};
use crate::server::{CoordinatorContextBuilder, GatewayState};

pub(crate) fn summary(user_id: i64) -> UserSummary {
    UserSummary {
        id: Snowflake::new(user_id),
        name: format!("User {user_id}"),
        handle: format!("user{user_id}"),
        avatar_url: None,
    }
}

pub(crate) fn user(user_id: i64) -> User {
    User::new(
        Snowflake::new(user_id),
        format!("User {user_id}"),
        format!("user{user_id}"),
        format!("user{user_id}@example.com"),
    )
}

#[derive(Default)]
pub(crate) struct FakeMembers {
    members: Mutex<HashSet<(Snowflake, Snowflake)>>,
}

impl FakeMembers {
    pub(crate) fn add(&self, chat_id: i64, user_id: i64) {
        self.members
            .lock()
            .insert((Snowflake::new(chat_id), Snowflake::new(user_id)));
    }
}

#[async_trait]
impl ChatMemberRepository for FakeMembers {
    async fn is_member(&self, chat_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.members.lock().contains(&(chat_id, user_id)))
    }
}

#[derive(Default)]
pub(crate) struct FakeMessages {
    pub(crate) messages: Mutex<Vec<Message>>,
    pub(crate) fail_writes: AtomicBool,
}

impl FakeMessages {
    pub(crate) fn seed(&self, id: i64, chat_id: i64, sender_id: i64, content: &str) {
        self.messages.lock().push(Message::new(
            Snowflake::new(id),
            Snowflake::new(chat_id),
            Snowflake::new(sender_id),
            content.to_string(),
            vec![],
        ));
    }

    pub(crate) fn stored_ids(&self) -> Vec<Snowflake> {
        self.messages.lock().iter().map(|m| m.id).collect()
    }
}

#[async_trait]
impl MessageRepository for FakeMessages {
    async fn create(&self, message: &Message) -> RepoResult<Message> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("write refused".to_string()));
        }
        self.messages.lock().push(message.clone());
        Ok(message.clone())
    }

    async fn list_recent(&self, chat_id: Snowflake, limit: i64) -> RepoResult<Vec<MessageView>> {
        Ok(self
            .messages
            .lock()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .rev()
            .take(limit as usize)
            .map(|m| MessageView::new(m.clone(), summary(m.sender_id.into_inner())))
            .collect())
    }

    async fn mark_read(&self, message_id: Snowflake, read_at: DateTime<Utc>) -> RepoResult<()> {
        let mut messages = self.messages.lock();
        match messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.read_at = Some(read_at);
                Ok(())
            }
            None => Err(DomainError::MessageNotFound(message_id)),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeChats {
    pub(crate) touched: Mutex<Vec<Snowflake>>,
}

#[async_trait]
impl ChatRepository for FakeChats {
    async fn touch(&self, id: Snowflake) -> RepoResult<()> {
        self.touched.lock().push(id);
        Ok(())
    }
}

/// User repository backed by a fixed list
#[derive(Default)]
pub(crate) struct FakeUsers {
    users: Mutex<Vec<User>>,
}

impl FakeUsers {
    pub(crate) fn add(&self, user: User) {
        self.users.lock().push(user);
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        Ok(self.users.lock().iter().find(|u| u.id == id).cloned())
    }
}

/// Verifier accepting tokens of the form `user:<id>`
pub(crate) struct StaticTokens;

impl TokenVerifier for StaticTokens {
    fn verify(&self, token: &str) -> Result<Snowflake, AppError> {
        token
            .strip_prefix("user:")
            .and_then(|id| id.parse::<i64>().ok())
            .map(Snowflake::new)
            .ok_or(AppError::InvalidToken)
    }
}

pub(crate) struct Harness {
    pub(crate) state: GatewayState,
    pub(crate) members: Arc<FakeMembers>,
    pub(crate) messages: Arc<FakeMessages>,
    pub(crate) chats: Arc<FakeChats>,
    pub(crate) users: Arc<FakeUsers>,
}

pub(crate) fn harness() -> Harness {
    let members = Arc::new(FakeMembers::default());
    let messages = Arc::new(FakeMessages::default());
    let chats = Arc::new(FakeChats::default());
    let users = Arc::new(FakeUsers::default());
    let store = MemoryStore::new_shared();

    let context = CoordinatorContextBuilder::new()
        .users(users.clone())
        .chats(chats.clone())
        .members(members.clone())
        .messages(messages.clone())
        .presence(PresenceTracker::new(store.clone(), Duration::from_secs(300)))
        .typing(TypingTracker::new(store, Duration::from_secs(10)))
        .verifier(Arc::new(StaticTokens))
        .build()
        .expect("test context");

    let registry = SessionRegistry::new_shared();
    let broadcaster = Arc::new(RoomBroadcaster::new(registry.clone()));

    Harness {
        state: GatewayState::new(Arc::new(context), registry, broadcaster),
        members,
        messages,
        chats,
        users,
    }
}

pub(crate) fn add_session(
    state: &GatewayState,
    session_id: &str,
    user_id: i64,
) -> (Arc<Connection>, mpsc::Receiver<ServerEvent>) {
    let (tx, rx) = mpsc::channel(32);
    let connection = Connection::new(session_id.to_string(), summary(user_id), tx);
    state.registry().insert(connection.clone());
    (connection, rx)
}

pub(crate) fn room(chat_id: i64) -> RoomPayload {
    RoomPayload {
        chat_id: Snowflake::new(chat_id),
    }
}

pub(crate) fn send_payload(chat_id: i64, content: &str) -> SendMessagePayload {
    SendMessagePayload {
        chat_id: Snowflake::new(chat_id),
        content: content.to_string(),
        media: vec![],
    }
}
