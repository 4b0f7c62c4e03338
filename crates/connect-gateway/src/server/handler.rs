//! WebSocket handler
//!
//! Authenticates the bearer credential presented at upgrade time, runs
//! the per-connection receive/send tasks, and tears the session down
//! exactly once on any close path.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use connect_core::{User, UserSummary};

use crate::connection::Connection;
use crate::events::{PresenceOfflinePayload, PresenceOnlinePayload};
use crate::handlers::{EventDispatcher, HandshakeError};
use crate::protocol::{ClientMessage, ServerEvent};
use crate::server::GatewayState;

/// WebSocket gateway handler
///
/// The credential is checked before the session exists anywhere: a
/// failed handshake is closed with an auth close code and never touches
/// the registry.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = extract_token(&headers, &query);
    let auth = authenticate(&state, token.as_deref()).await;

    ws.on_upgrade(move |socket| async move {
        match auth {
            Ok(user) => handle_socket(state, socket, user).await,
            Err(e) => reject_socket(socket, &e).await,
        }
    })
}

/// Pull the bearer credential from the Authorization header or the
/// `token` query parameter
fn extract_token(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).to_string())
        .or_else(|| query.get("token").cloned())
}

/// Resolve the credential to a live, non-suspended user
async fn authenticate(state: &GatewayState, token: Option<&str>) -> Result<User, HandshakeError> {
    let token = token.ok_or(HandshakeError::MissingToken)?;
    let context = state.context();

    let user_id = context
        .verifier()
        .verify(token)
        .map_err(HandshakeError::Credential)?;

    let user = match tokio::time::timeout(
        context.collaborator_timeout(),
        context.users().find_by_id(user_id),
    )
    .await
    {
        Ok(Ok(Some(user))) => user,
        Ok(Ok(None)) => return Err(HandshakeError::UnknownUser),
        Ok(Err(e)) => return Err(HandshakeError::Lookup(e)),
        Err(_) => return Err(HandshakeError::LookupTimeout),
    };

    if user.suspended {
        return Err(HandshakeError::Suspended);
    }

    Ok(user)
}

/// Close a socket that failed the handshake
async fn reject_socket(mut socket: WebSocket, error: &HandshakeError) {
    tracing::warn!(error = %error, "Rejecting connection at handshake");

    let code = error.close_code();
    let frame = CloseFrame {
        code: code.as_u16(),
        reason: code.description().into(),
    };
    socket.send(Message::Close(Some(frame))).await.ok();
}

/// Run an authenticated connection to completion
async fn handle_socket(state: GatewayState, socket: WebSocket, user: User) {
    let session_id = uuid::Uuid::new_v4().to_string();
    let summary = UserSummary::from(&user);

    let (tx, mut rx) = mpsc::channel::<ServerEvent>(state.context().session_buffer());
    let connection = Connection::new(session_id.clone(), summary.clone(), tx);
    state.registry().insert(connection.clone());

    tracing::info!(
        session_id = %session_id,
        user_id = %user.id,
        handle = %user.handle,
        "WebSocket connection established"
    );

    // Fresh-TTL presence and the global online announcement; store
    // failures fail open
    if let Err(e) = state.context().presence().set_online(user.id).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to set presence online");
    }
    state.broadcaster().broadcast_all(
        ServerEvent::UserOnline(PresenceOnlinePayload {
            user_id: user.id,
            user: summary,
        }),
        Some(&session_id),
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Inbound events
    let state_recv = state.clone();
    let connection_recv = connection.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(frame) = ws_stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    handle_text_frame(&state_recv, &connection_recv, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        session_id = %connection_recv.session_id(),
                        "Ignoring binary frame"
                    );
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    tracing::trace!(session_id = %connection_recv.session_id(), "Ping/pong");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(
                        session_id = %connection_recv.session_id(),
                        "Client closed connection"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %connection_recv.session_id(),
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    // Outbound events
    let session_id_send = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.to_json() {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(
                            session_id = %session_id_send,
                            "Failed to send event to WebSocket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id_send,
                        error = %e,
                        "Failed to serialize outbound event"
                    );
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    // Either side ending brings the session down
    tokio::select! {
        _ = recv_task => {}
        _ = send_task => {}
    }

    teardown(&state, &connection).await;
}

/// Parse and dispatch one inbound text frame
///
/// Malformed or unknown events are ignored: no broadcast, no persistence
/// write, connection stays open.
async fn handle_text_frame(state: &GatewayState, connection: &Arc<Connection>, text: &str) {
    match ClientMessage::from_json(text) {
        Ok(message) => EventDispatcher::dispatch(state, connection, message).await,
        Err(e) => {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Ignoring malformed client frame"
            );
        }
    }
}

/// Disconnect lifecycle: deregister, go offline, announce
///
/// Guarded by the connection's teardown flag so it runs exactly once no
/// matter which path triggered the close.
pub(crate) async fn teardown(state: &GatewayState, connection: &Arc<Connection>) {
    if !connection.begin_teardown() {
        return;
    }

    let session_id = connection.session_id();
    let user_id = connection.user_id();

    state.registry().remove(session_id);

    if let Err(e) = state.context().presence().set_offline(user_id).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to set presence offline");
    }

    state.broadcaster().broadcast_all(
        ServerEvent::UserOffline(PresenceOfflinePayload { user_id }),
        Some(session_id),
    );

    tracing::info!(
        session_id = %session_id,
        user_id = %user_id,
        "Connection closed"
    );
}
