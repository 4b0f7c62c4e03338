//! Typing indicator handlers

use std::sync::Arc;

use connect_core::Snowflake;

use crate::connection::Connection;
use crate::events::TypingUpdatePayload;
use crate::handlers::{HandlerError, HandlerResult};
use crate::protocol::{RoomPayload, ServerEvent};
use crate::server::GatewayState;

/// Handles `typing_start` and `typing_stop`
///
/// Typing state is best-effort: a failing ephemeral store degrades
/// visibility and nothing else, so store errors are logged and swallowed
/// here rather than surfaced to the client.
pub struct TypingHandler;

impl TypingHandler {
    /// Handle a `typing_start` event
    ///
    /// Membership-gated like message send; refreshes the record's TTL on
    /// every repeat.
    pub async fn start(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let context = state.context();
        let chat_id = payload.chat_id;
        let user_id = connection.user_id();

        if !context.authorizer().is_member(chat_id, user_id).await? {
            return Err(HandlerError::NotAMember(chat_id));
        }

        if let Err(e) = context.typing().start(chat_id, user_id).await {
            tracing::warn!(
                chat_id = %chat_id,
                user_id = %user_id,
                error = %e,
                "Failed to set typing indicator"
            );
            return Ok(());
        }

        Self::republish(state, chat_id, None, Some(connection.session_id())).await;
        Ok(())
    }

    /// Handle a `typing_stop` event
    ///
    /// No membership precondition: clearing one's own record is always
    /// allowed.
    pub async fn stop(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let context = state.context();
        let chat_id = payload.chat_id;
        let user_id = connection.user_id();

        if let Err(e) = context.typing().stop(chat_id, user_id).await {
            tracing::warn!(
                chat_id = %chat_id,
                user_id = %user_id,
                error = %e,
                "Failed to clear typing indicator"
            );
            return Ok(());
        }

        Self::republish(state, chat_id, None, Some(connection.session_id())).await;
        Ok(())
    }

    /// Recompute and publish a room's typing set
    ///
    /// `exclude_user` filters the listed set (a sender must not
    /// resurface from a same-instant refresh); `exclude_session` scopes
    /// the fan-out. A failed read skips the republish entirely.
    pub(crate) async fn republish(
        state: &GatewayState,
        chat_id: Snowflake,
        exclude_user: Option<Snowflake>,
        exclude_session: Option<&str>,
    ) {
        let typing_user_ids = match state.context().typing().list_typing(chat_id).await {
            Ok(user_ids) => user_ids,
            Err(e) => {
                tracing::warn!(
                    chat_id = %chat_id,
                    error = %e,
                    "Failed to list typing users, skipping republish"
                );
                return;
            }
        };

        let typing_user_ids = match exclude_user {
            Some(excluded) => typing_user_ids.into_iter().filter(|id| *id != excluded).collect(),
            None => typing_user_ids,
        };

        let event = ServerEvent::UserTyping(TypingUpdatePayload {
            chat_id,
            typing_user_ids,
        });
        state.broadcaster().publish(chat_id, event, exclude_session).await;
    }
}
