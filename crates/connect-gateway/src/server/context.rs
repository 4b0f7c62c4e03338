//! Coordinator context - dependency container
//!
//! Holds the collaborators and trackers every handler needs: persistence
//! repositories, the room authorizer, presence/typing trackers, the
//! credential verifier, and the ID generator.

use std::sync::Arc;
use std::time::Duration;

use connect_cache::{PresenceTracker, TypingTracker};
use connect_common::TokenVerifier;
use connect_core::{
    ChatMemberRepository, ChatRepository, MessageRepository, SnowflakeGenerator, UserRepository,
};

use crate::authorize::RoomAuthorizer;

/// Dependency container for the coordinator
pub struct CoordinatorContext {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    authorizer: RoomAuthorizer,
    presence: PresenceTracker,
    typing: TypingTracker,
    verifier: Arc<dyn TokenVerifier>,
    ids: Arc<SnowflakeGenerator>,
    collaborator_timeout: Duration,
    history_limit: i64,
    session_buffer: usize,
}

impl CoordinatorContext {
    /// Get the user repository
    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    /// Get the chat repository
    pub fn chats(&self) -> &dyn ChatRepository {
        self.chats.as_ref()
    }

    /// Get the message repository
    pub fn messages(&self) -> &dyn MessageRepository {
        self.messages.as_ref()
    }

    /// Get the room authorizer
    pub fn authorizer(&self) -> &RoomAuthorizer {
        &self.authorizer
    }

    /// Get the presence tracker
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Get the typing tracker
    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// Get the credential verifier
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.verifier.as_ref()
    }

    /// Get the ID generator
    pub fn ids(&self) -> &SnowflakeGenerator {
        &self.ids
    }

    /// Upper bound on any single collaborator call
    pub fn collaborator_timeout(&self) -> Duration {
        self.collaborator_timeout
    }

    /// Number of recent messages delivered on room join
    pub fn history_limit(&self) -> i64 {
        self.history_limit
    }

    /// Outbound channel buffer per connection
    pub fn session_buffer(&self) -> usize {
        self.session_buffer
    }
}

/// Builder for [`CoordinatorContext`]
#[derive(Default)]
pub struct CoordinatorContextBuilder {
    users: Option<Arc<dyn UserRepository>>,
    chats: Option<Arc<dyn ChatRepository>>,
    members: Option<Arc<dyn ChatMemberRepository>>,
    messages: Option<Arc<dyn MessageRepository>>,
    presence: Option<PresenceTracker>,
    typing: Option<TypingTracker>,
    verifier: Option<Arc<dyn TokenVerifier>>,
    ids: Option<Arc<SnowflakeGenerator>>,
    collaborator_timeout: Option<Duration>,
    history_limit: Option<i64>,
    session_buffer: Option<usize>,
}

impl CoordinatorContextBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.users = Some(repo);
        self
    }

    pub fn chats(mut self, repo: Arc<dyn ChatRepository>) -> Self {
        self.chats = Some(repo);
        self
    }

    pub fn members(mut self, repo: Arc<dyn ChatMemberRepository>) -> Self {
        self.members = Some(repo);
        self
    }

    pub fn messages(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.messages = Some(repo);
        self
    }

    pub fn presence(mut self, tracker: PresenceTracker) -> Self {
        self.presence = Some(tracker);
        self
    }

    pub fn typing(mut self, tracker: TypingTracker) -> Self {
        self.typing = Some(tracker);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn ids(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.ids = Some(generator);
        self
    }

    pub fn collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = Some(timeout);
        self
    }

    pub fn history_limit(mut self, limit: i64) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn session_buffer(mut self, buffer: usize) -> Self {
        self.session_buffer = Some(buffer);
        self
    }

    /// Build the context
    ///
    /// # Errors
    /// Returns an error naming the first missing required dependency.
    pub fn build(self) -> Result<CoordinatorContext, String> {
        let collaborator_timeout = self
            .collaborator_timeout
            .unwrap_or(Duration::from_millis(5_000));
        let members = self.members.ok_or("members repository is required")?;

        Ok(CoordinatorContext {
            users: self.users.ok_or("users repository is required")?,
            chats: self.chats.ok_or("chats repository is required")?,
            messages: self.messages.ok_or("messages repository is required")?,
            authorizer: RoomAuthorizer::new(members, collaborator_timeout),
            presence: self.presence.ok_or("presence tracker is required")?,
            typing: self.typing.ok_or("typing tracker is required")?,
            verifier: self.verifier.ok_or("token verifier is required")?,
            ids: self.ids.unwrap_or_default(),
            collaborator_timeout,
            history_limit: self.history_limit.unwrap_or(50),
            session_buffer: self.session_buffer.unwrap_or(100),
        })
    }
}
