//! Presence handlers
//!
//! Presence is global, not room-scoped: any connected peer may care
//! about any user's status, so online/offline events go to every other
//! live session. All store writes fail open.

use std::sync::Arc;

use connect_cache::PresenceStatus;

use crate::connection::Connection;
use crate::events::{PresenceOfflinePayload, PresenceOnlinePayload, UserPresencePayload};
use crate::protocol::{ServerEvent, UserRefPayload};
use crate::server::GatewayState;

/// Handles `user_online`, `user_offline`, and `get_user_presence`
pub struct PresenceHandler;

impl PresenceHandler {
    /// Handle an explicit `user_online` signal
    ///
    /// This is the only thing that renews the presence TTL - ordinary
    /// traffic does not, which bounds how long a silently-dropped
    /// connection can appear online.
    pub async fn online(state: &GatewayState, connection: &Arc<Connection>) {
        let user_id = connection.user_id();

        if let Err(e) = state.context().presence().set_online(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to set presence online");
        }

        let event = ServerEvent::UserOnline(PresenceOnlinePayload {
            user_id,
            user: connection.user().clone(),
        });
        state
            .broadcaster()
            .broadcast_all(event, Some(connection.session_id()));
    }

    /// Handle an explicit `user_offline` signal
    pub async fn offline(state: &GatewayState, connection: &Arc<Connection>) {
        let user_id = connection.user_id();

        if let Err(e) = state.context().presence().set_offline(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to set presence offline");
        }

        let event = ServerEvent::UserOffline(PresenceOfflinePayload { user_id });
        state
            .broadcaster()
            .broadcast_all(event, Some(connection.session_id()));
    }

    /// Handle a `get_user_presence` query; replies to the requester only
    pub async fn get(state: &GatewayState, connection: &Arc<Connection>, payload: UserRefPayload) {
        let status = match state.context().presence().get(payload.user_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(
                    user_id = %payload.user_id,
                    error = %e,
                    "Presence lookup failed, reporting offline"
                );
                PresenceStatus::Offline
            }
        };

        let event = ServerEvent::UserPresence(UserPresencePayload {
            user_id: payload.user_id,
            status,
        });
        connection.send(event).await.ok();
    }
}
