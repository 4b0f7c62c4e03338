//! Room join/leave handlers

use std::sync::Arc;

use crate::connection::Connection;
use crate::events::ChatHistoryPayload;
use crate::handlers::{bounded, HandlerError, HandlerResult};
use crate::protocol::{RoomPayload, ServerEvent};
use crate::server::GatewayState;

/// Handles `join_room` and `leave_room`
pub struct RoomHandler;

impl RoomHandler {
    /// Handle a `join_room` event
    ///
    /// Membership is confirmed before the subscription exists; on success
    /// the requester alone receives the room's recent history, reordered
    /// oldest-first.
    pub async fn join(
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

        state.registry().join_room(connection.session_id(), chat_id);

        tracing::info!(
            session_id = %connection.session_id(),
            user_id = %user_id,
            chat_id = %chat_id,
            "Session joined chat"
        );

        // Fetched newest-first for the LIMIT, delivered oldest-first
        let mut history = bounded(
            context.collaborator_timeout(),
            context.messages().list_recent(chat_id, context.history_limit()),
        )
        .await?;
        history.reverse();

        let event = ServerEvent::ChatHistory(ChatHistoryPayload {
            chat_id,
            messages: history.into_iter().map(Into::into).collect(),
        });
        connection.send(event).await.ok();

        Ok(())
    }

    /// Handle a `leave_room` event
    ///
    /// No precondition and no broadcast.
    pub fn leave(state: &GatewayState, connection: &Arc<Connection>, payload: RoomPayload) {
        state
            .registry()
            .leave_room(connection.session_id(), payload.chat_id);

        tracing::info!(
            session_id = %connection.session_id(),
            user_id = %connection.user_id(),
            chat_id = %payload.chat_id,
            "Session left chat"
        );
    }
}
