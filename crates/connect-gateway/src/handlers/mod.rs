//! Event handlers
//!
//! Routes each inbound client event to its handler and reports failures
//! back to the originating session only. No handler error is fatal to
//! the connection, and no error in one session's handling touches
//! another session's state.

mod error;
mod message;
mod presence;
mod room;
mod typing;

pub use error::{HandlerError, HandlerResult, HandshakeError};
pub use message::MessageHandler;
pub use presence::PresenceHandler;
pub use room::RoomHandler;
pub use typing::TypingHandler;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use connect_core::RepoResult;

use crate::connection::Connection;
use crate::protocol::{ClientMessage, ServerEvent};
use crate::server::GatewayState;

/// Run a persistence call under the collaborator timeout
///
/// A timed-out call is a failure, not a pending operation - the
/// connection's event loop moves on.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    fut: impl Future<Output = RepoResult<T>>,
) -> HandlerResult<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(HandlerError::Persistence(e)),
        Err(_) => Err(HandlerError::Timeout),
    }
}

/// Dispatches inbound client events to handlers
pub struct EventDispatcher;

impl EventDispatcher {
    /// Handle one inbound client event
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: ClientMessage,
    ) {
        tracing::trace!(
            session_id = %connection.session_id(),
            event = message.kind(),
            "Dispatching client event"
        );

        match message {
            ClientMessage::JoinRoom(payload) => {
                Self::report(
                    connection,
                    "Not authorized to join this chat",
                    "Failed to join chat",
                    RoomHandler::join(state, connection, payload).await,
                )
                .await;
            }
            ClientMessage::LeaveRoom(payload) => {
                RoomHandler::leave(state, connection, payload);
            }
            ClientMessage::SendMessage(payload) => {
                Self::report(
                    connection,
                    "Not authorized to send messages in this chat",
                    "Failed to send message",
                    MessageHandler::send(state, connection, payload).await,
                )
                .await;
            }
            ClientMessage::TypingStart(payload) => {
                Self::report(
                    connection,
                    "Not authorized to type in this chat",
                    "Failed to update typing status",
                    TypingHandler::start(state, connection, payload).await,
                )
                .await;
            }
            ClientMessage::TypingStop(payload) => {
                Self::report(
                    connection,
                    "Not authorized to type in this chat",
                    "Failed to update typing status",
                    TypingHandler::stop(state, connection, payload).await,
                )
                .await;
            }
            ClientMessage::MessageRead(payload) => {
                Self::report(
                    connection,
                    "Not authorized to read this chat",
                    "Failed to mark message as read",
                    MessageHandler::read(state, connection, payload).await,
                )
                .await;
            }
            ClientMessage::UserOnline => {
                PresenceHandler::online(state, connection).await;
            }
            ClientMessage::UserOffline => {
                PresenceHandler::offline(state, connection).await;
            }
            ClientMessage::GetUserPresence(payload) => {
                PresenceHandler::get(state, connection, payload).await;
            }
        }
    }

    /// Report a handler failure to the originating session only
    async fn report(
        connection: &Arc<Connection>,
        denied_message: &str,
        failed_message: &str,
        result: HandlerResult<()>,
    ) {
        if let Err(e) = result {
            let message = if e.is_authorization() {
                denied_message
            } else {
                failed_message
            };

            tracing::warn!(
                session_id = %connection.session_id(),
                user_id = %connection.user_id(),
                error = %e,
                "Event handling failed"
            );

            connection.send(ServerEvent::error(message)).await.ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MessageReadPayload, UserRefPayload};
    use crate::testutil::{add_session, harness, room, send_payload};
    use connect_cache::PresenceStatus;
    use connect_core::Snowflake;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_join_denied_for_non_member() {
        let h = harness();
        let (conn, mut rx) = add_session(&h.state, "a", 1);

        EventDispatcher::dispatch(&h.state, &conn, ClientMessage::JoinRoom(room(10))).await;

        match rx.try_recv().unwrap() {
            ServerEvent::Error(payload) => {
                assert_eq!(payload.message, "Not authorized to join this chat");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!conn.is_in_room(Snowflake::new(10)));
        assert!(h.state.registry().room_sessions(Snowflake::new(10)).is_empty());
    }

    #[tokio::test]
    async fn test_join_delivers_history_oldest_first() {
        let h = harness();
        h.members.add(10, 1);
        h.messages.seed(1, 10, 2, "first");
        h.messages.seed(2, 10, 1, "second");
        h.messages.seed(3, 10, 2, "third");

        let (conn, mut rx) = add_session(&h.state, "a", 1);
        EventDispatcher::dispatch(&h.state, &conn, ClientMessage::JoinRoom(room(10))).await;

        assert!(conn.is_in_room(Snowflake::new(10)));
        match rx.try_recv().unwrap() {
            ServerEvent::ChatHistory(payload) => {
                assert_eq!(payload.chat_id, Snowflake::new(10));
                let ids: Vec<i64> = payload.messages.iter().map(|m| m.id.into_inner()).collect();
                assert_eq!(ids, vec![1, 2, 3]);
                assert_eq!(payload.messages[0].content, "first");
                assert_eq!(payload.messages[1].sender.handle, "user1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_broadcasts_persisted_record_to_room() {
        let h = harness();
        h.members.add(10, 1);
        h.members.add(10, 2);

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        let (_conn_c, mut rx_c) = add_session(&h.state, "c", 3);
        h.state.registry().join_room("a", Snowflake::new(10));
        h.state.registry().join_room("b", Snowflake::new(10));

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::SendMessage(send_payload(10, "hi")),
        )
        .await;

        // Persisted exactly once, chat activity touched
        assert_eq!(h.messages.stored_ids().len(), 1);
        assert_eq!(h.chats.touched.lock().as_slice(), &[Snowflake::new(10)]);

        // Every room member receives the persisted record, sender included
        for rx in [&mut rx_a, &mut rx_b] {
            match rx.try_recv().unwrap() {
                ServerEvent::NewMessage(payload) => {
                    assert_eq!(payload.content, "hi");
                    assert_eq!(payload.sender_id, Snowflake::new(1));
                    assert_eq!(payload.sender.handle, "user1");
                    assert_eq!(payload.id, h.messages.stored_ids()[0]);
                }
                other => panic!("unexpected event: {other:?}"),
            }
            // Send implies typing stop: the set is republished afterwards
            match rx.try_recv().unwrap() {
                ServerEvent::UserTyping(payload) => assert!(payload.typing_user_ids.is_empty()),
                other => panic!("unexpected event: {other:?}"),
            }
        }

        // Connected non-subscriber sees nothing
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_denied_for_non_member() {
        let h = harness();
        h.members.add(10, 2);

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        h.state.registry().join_room("b", Snowflake::new(10));

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::SendMessage(send_payload(10, "hi")),
        )
        .await;

        match rx_a.try_recv().unwrap() {
            ServerEvent::Error(payload) => {
                assert_eq!(payload.message, "Not authorized to send messages in this chat");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(h.messages.stored_ids().is_empty());
        assert!(h.chats.touched.lock().is_empty());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_persistence_failure_means_no_fanout() {
        let h = harness();
        h.members.add(10, 1);
        h.members.add(10, 2);
        h.messages.fail_writes.store(true, Ordering::SeqCst);

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        h.state.registry().join_room("a", Snowflake::new(10));
        h.state.registry().join_room("b", Snowflake::new(10));

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::SendMessage(send_payload(10, "hi")),
        )
        .await;

        match rx_a.try_recv().unwrap() {
            ServerEvent::Error(payload) => assert_eq!(payload.message, "Failed to send message"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx_b.try_recv().is_err());
        assert!(h.messages.stored_ids().is_empty());
    }

    #[tokio::test]
    async fn test_send_clears_sender_typing() {
        let h = harness();
        h.members.add(10, 1);

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        h.state.registry().join_room("a", Snowflake::new(10));

        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::TypingStart(room(10))).await;
        assert_eq!(
            h.state
                .context()
                .typing()
                .list_typing(Snowflake::new(10))
                .await
                .unwrap(),
            vec![Snowflake::new(1)]
        );

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::SendMessage(send_payload(10, "done")),
        )
        .await;

        assert!(h
            .state
            .context()
            .typing()
            .list_typing(Snowflake::new(10))
            .await
            .unwrap()
            .is_empty());

        // Sender's own stream: new_message then the emptied typing set
        match rx_a.try_recv().unwrap() {
            ServerEvent::NewMessage(_) => {}
            other => panic!("unexpected event: {other:?}"),
        }
        match rx_a.try_recv().unwrap() {
            ServerEvent::UserTyping(payload) => assert!(payload.typing_user_ids.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_typing_start_excludes_sender_session() {
        let h = harness();
        h.members.add(10, 1);

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        h.state.registry().join_room("a", Snowflake::new(10));
        h.state.registry().join_room("b", Snowflake::new(10));

        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::TypingStart(room(10))).await;

        assert!(rx_a.try_recv().is_err());
        match rx_b.try_recv().unwrap() {
            ServerEvent::UserTyping(payload) => {
                assert_eq!(payload.typing_user_ids, vec![Snowflake::new(1)]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_typing_start_denied_for_non_member() {
        let h = harness();

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::TypingStart(room(10))).await;

        match rx_a.try_recv().unwrap() {
            ServerEvent::Error(payload) => {
                assert_eq!(payload.message, "Not authorized to type in this chat");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(h
            .state
            .context()
            .typing()
            .list_typing(Snowflake::new(10))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_typing_stop_has_no_precondition() {
        let h = harness();

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        h.state.registry().join_room("b", Snowflake::new(10));

        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::TypingStop(room(10))).await;

        // No error to the requester, republish to the room
        assert!(rx_a.try_recv().is_err());
        match rx_b.try_recv().unwrap() {
            ServerEvent::UserTyping(payload) => assert!(payload.typing_user_ids.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_message_read_receipt_excludes_reader() {
        let h = harness();
        h.messages.seed(5, 10, 2, "hello");

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        h.state.registry().join_room("a", Snowflake::new(10));
        h.state.registry().join_room("b", Snowflake::new(10));

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::MessageRead(MessageReadPayload {
                chat_id: Snowflake::new(10),
                message_id: Snowflake::new(5),
            }),
        )
        .await;

        assert!(rx_a.try_recv().is_err());
        match rx_b.try_recv().unwrap() {
            ServerEvent::MessageRead(payload) => {
                assert_eq!(payload.message_id, Snowflake::new(5));
                assert_eq!(payload.read_by, Snowflake::new(1));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(h.messages.messages.lock()[0].read_at.is_some());
    }

    #[tokio::test]
    async fn test_message_read_unknown_message_errors_requester() {
        let h = harness();

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::MessageRead(MessageReadPayload {
                chat_id: Snowflake::new(10),
                message_id: Snowflake::new(404),
            }),
        )
        .await;

        match rx_a.try_recv().unwrap() {
            ServerEvent::Error(payload) => {
                assert_eq!(payload.message, "Failed to mark message as read");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_online_broadcast_and_presence() {
        let h = harness();

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);

        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::UserOnline).await;

        assert_eq!(
            h.state.context().presence().get(Snowflake::new(1)).await.unwrap(),
            PresenceStatus::Online
        );
        assert!(rx_a.try_recv().is_err());
        match rx_b.try_recv().unwrap() {
            ServerEvent::UserOnline(payload) => {
                assert_eq!(payload.user_id, Snowflake::new(1));
                assert_eq!(payload.user.handle, "user1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_offline_broadcast_and_presence() {
        let h = harness();

        let (conn_a, _rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);

        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::UserOnline).await;
        rx_b.try_recv().unwrap();

        EventDispatcher::dispatch(&h.state, &conn_a, ClientMessage::UserOffline).await;

        assert_eq!(
            h.state.context().presence().get(Snowflake::new(1)).await.unwrap(),
            PresenceStatus::Offline
        );
        match rx_b.try_recv().unwrap() {
            ServerEvent::UserOffline(payload) => assert_eq!(payload.user_id, Snowflake::new(1)),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_user_presence_replies_to_requester_only() {
        let h = harness();
        h.state
            .context()
            .presence()
            .set_online(Snowflake::new(7))
            .await
            .unwrap();

        let (conn_a, mut rx_a) = add_session(&h.state, "a", 1);
        let (_conn_b, mut rx_b) = add_session(&h.state, "b", 2);

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::GetUserPresence(UserRefPayload {
                user_id: Snowflake::new(7),
            }),
        )
        .await;

        match rx_a.try_recv().unwrap() {
            ServerEvent::UserPresence(payload) => {
                assert_eq!(payload.user_id, Snowflake::new(7));
                assert_eq!(payload.status, PresenceStatus::Online);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sent_message_round_trips_through_join_history() {
        let h = harness();
        h.members.add(10, 1);
        h.members.add(10, 2);

        let (conn_a, _rx_a) = add_session(&h.state, "a", 1);
        h.state.registry().join_room("a", Snowflake::new(10));

        EventDispatcher::dispatch(
            &h.state,
            &conn_a,
            ClientMessage::SendMessage(send_payload(10, "hi")),
        )
        .await;
        let sent_id = h.messages.stored_ids()[0];

        // A fresh join sees the same record: same server-assigned ID,
        // same content
        let (conn_b, mut rx_b) = add_session(&h.state, "b", 2);
        EventDispatcher::dispatch(&h.state, &conn_b, ClientMessage::JoinRoom(room(10))).await;

        match rx_b.try_recv().unwrap() {
            ServerEvent::ChatHistory(payload) => {
                assert_eq!(payload.messages.len(), 1);
                assert_eq!(payload.messages[0].id, sent_id);
                assert_eq!(payload.messages[0].content, "hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_sends_both_delivered_in_store_order() {
        let h = harness();
        h.members.add(10, 1);
        h.members.add(10, 2);
        h.members.add(10, 3);

        let (conn_a, _rx_a) = add_session(&h.state, "a", 1);
        let (conn_b, _rx_b) = add_session(&h.state, "b", 2);
        let (_conn_c, mut rx_c) = add_session(&h.state, "c", 3);
        h.state.registry().join_room("a", Snowflake::new(10));
        h.state.registry().join_room("b", Snowflake::new(10));
        h.state.registry().join_room("c", Snowflake::new(10));

        tokio::join!(
            EventDispatcher::dispatch(
                &h.state,
                &conn_a,
                ClientMessage::SendMessage(send_payload(10, "from a")),
            ),
            EventDispatcher::dispatch(
                &h.state,
                &conn_b,
                ClientMessage::SendMessage(send_payload(10, "from b")),
            ),
        );

        let stored = h.messages.stored_ids();
        assert_eq!(stored.len(), 2);

        // The observer receives both messages, in persistence order
        let mut received = Vec::new();
        while let Ok(event) = rx_c.try_recv() {
            if let ServerEvent::NewMessage(payload) = event {
                received.push(payload.id);
            }
        }
        assert_eq!(received, stored);
    }
}
