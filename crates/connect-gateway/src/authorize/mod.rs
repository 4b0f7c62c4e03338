//! Room authorizer
//!
//! Answers "is user U currently a member of room R" with a fresh read
//! against the persistence collaborator on every call. Nothing is
//! cached: membership can change between connection establishment and
//! any later action. The lookup is timeout-bounded; a stalled
//! collaborator must never park a connection's event loop.

use std::sync::Arc;
use std::time::Duration;

use connect_core::{ChatMemberRepository, DomainError, Snowflake};

/// Errors from a membership lookup
///
/// Callers on membership-gated paths fail closed on either variant:
/// unknown membership is treated as denied.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    #[error("Membership lookup timed out")]
    Timeout,

    #[error(transparent)]
    Repo(#[from] DomainError),
}

/// Timeout-bounded membership checks
#[derive(Clone)]
pub struct RoomAuthorizer {
    members: Arc<dyn ChatMemberRepository>,
    timeout: Duration,
}

impl RoomAuthorizer {
    /// Create an authorizer over a membership repository
    pub fn new(members: Arc<dyn ChatMemberRepository>, timeout: Duration) -> Self {
        Self { members, timeout }
    }

    /// Check current membership of a user in a room
    pub async fn is_member(
        &self,
        chat_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<bool, AuthorizeError> {
        match tokio::time::timeout(self.timeout, self.members.is_member(chat_id, user_id)).await {
            Ok(Ok(is_member)) => Ok(is_member),
            Ok(Err(e)) => {
                tracing::warn!(
                    chat_id = %chat_id,
                    user_id = %user_id,
                    error = %e,
                    "Membership lookup failed"
                );
                Err(AuthorizeError::Repo(e))
            }
            Err(_) => {
                tracing::warn!(
                    chat_id = %chat_id,
                    user_id = %user_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Membership lookup timed out"
                );
                Err(AuthorizeError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connect_core::RepoResult;
    use std::collections::HashSet;

    struct FakeMembers {
        members: HashSet<(Snowflake, Snowflake)>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ChatMemberRepository for FakeMembers {
        async fn is_member(&self, chat_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.members.contains(&(chat_id, user_id)))
        }
    }

    fn authorizer(members: &[(i64, i64)], delay: Option<Duration>) -> RoomAuthorizer {
        let members = members
            .iter()
            .map(|(c, u)| (Snowflake::new(*c), Snowflake::new(*u)))
            .collect();
        RoomAuthorizer::new(
            Arc::new(FakeMembers { members, delay }),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_member_and_non_member() {
        let auth = authorizer(&[(1, 100)], None);

        assert!(auth.is_member(Snowflake::new(1), Snowflake::new(100)).await.unwrap());
        assert!(!auth.is_member(Snowflake::new(1), Snowflake::new(200)).await.unwrap());
        assert!(!auth.is_member(Snowflake::new(2), Snowflake::new(100)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_lookup_times_out() {
        let auth = authorizer(&[(1, 100)], Some(Duration::from_secs(60)));

        let result = auth.is_member(Snowflake::new(1), Snowflake::new(100)).await;
        assert!(matches!(result, Err(AuthorizeError::Timeout)));
    }

    #[tokio::test]
    async fn test_repo_error_propagates() {
        struct FailingMembers;

        #[async_trait]
        impl ChatMemberRepository for FailingMembers {
            async fn is_member(&self, _: Snowflake, _: Snowflake) -> RepoResult<bool> {
                Err(DomainError::DatabaseError("connection refused".to_string()))
            }
        }

        let auth = RoomAuthorizer::new(Arc::new(FailingMembers), Duration::from_secs(5));
        let result = auth.is_member(Snowflake::new(1), Snowflake::new(1)).await;
        assert!(matches!(result, Err(AuthorizeError::Repo(_))));
    }
}
