//! Message send/read handlers

use std::sync::Arc;

use chrono::Utc;
use connect_core::{Message, MessageView};

use crate::connection::Connection;
use crate::events::ReadReceiptPayload;
use crate::handlers::{bounded, typing::TypingHandler, HandlerError, HandlerResult};
use crate::protocol::{MessageReadPayload, SendMessagePayload, ServerEvent};
use crate::server::GatewayState;

/// Handles `send_message` and `message_read`
pub struct MessageHandler;

impl MessageHandler {
    /// Handle a `send_message` event
    ///
    /// Membership is re-checked on every send. The write must complete
    /// before any fan-out - an unpersisted message is never broadcast -
    /// and the persisted record is the canonical payload. Sending
    /// implies the sender stopped typing.
    pub async fn send(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SendMessagePayload,
    ) -> HandlerResult<()> {
        let context = state.context();
        let chat_id = payload.chat_id;
        let user_id = connection.user_id();

        if !context.authorizer().is_member(chat_id, user_id).await? {
            return Err(HandlerError::NotAMember(chat_id));
        }

        let message = Message::new(
            context.ids().generate(),
            chat_id,
            user_id,
            payload.content,
            payload.media,
        );

        let persisted = bounded(
            context.collaborator_timeout(),
            context.messages().create(&message),
        )
        .await?;

        tracing::info!(
            session_id = %connection.session_id(),
            user_id = %user_id,
            chat_id = %chat_id,
            message_id = %persisted.id,
            "Message persisted"
        );

        let view = MessageView::new(persisted, connection.user().clone());
        state
            .broadcaster()
            .publish(chat_id, ServerEvent::NewMessage(view.into()), None)
            .await;

        // Touch-on-activity; best-effort once the message is delivered
        if let Err(e) = bounded(
            context.collaborator_timeout(),
            context.chats().touch(chat_id),
        )
        .await
        {
            tracing::warn!(chat_id = %chat_id, error = %e, "Failed to touch chat activity");
        }

        // Send implies typing stop; ephemeral store failures fail open
        if let Err(e) = context.typing().stop(chat_id, user_id).await {
            tracing::warn!(
                chat_id = %chat_id,
                user_id = %user_id,
                error = %e,
                "Failed to clear typing indicator on send"
            );
        }
        TypingHandler::republish(state, chat_id, Some(user_id), None).await;

        Ok(())
    }

    /// Handle a `message_read` event
    ///
    /// Persists the read timestamp, then fans the receipt out to the
    /// room excluding the reader.
    pub async fn read(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: MessageReadPayload,
    ) -> HandlerResult<()> {
        let context = state.context();
        let read_at = Utc::now();

        bounded(
            context.collaborator_timeout(),
            context.messages().mark_read(payload.message_id, read_at),
        )
        .await?;

        let event = ServerEvent::MessageRead(ReadReceiptPayload {
            message_id: payload.message_id,
            read_by: connection.user_id(),
            read_at,
        });
        state
            .broadcaster()
            .publish(payload.chat_id, event, Some(connection.session_id()))
            .await;

        Ok(())
    }
}
