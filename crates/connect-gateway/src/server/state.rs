//! Gateway state
//!
//! Shared state handed to every connection task.

use std::sync::Arc;

use crate::broadcast::RoomBroadcaster;
use crate::connection::SessionRegistry;

use super::CoordinatorContext;

/// Shared application state for the gateway server
#[derive(Clone)]
pub struct GatewayState {
    /// Collaborators and trackers
    context: Arc<CoordinatorContext>,
    /// Owner of all live sessions
    registry: Arc<SessionRegistry>,
    /// Room and global fan-out
    broadcaster: Arc<RoomBroadcaster>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        context: Arc<CoordinatorContext>,
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<RoomBroadcaster>,
    ) -> Self {
        Self {
            context,
            registry,
            broadcaster,
        }
    }

    /// Get the coordinator context
    pub fn context(&self) -> &CoordinatorContext {
        &self.context
    }

    /// Get the session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Get the room broadcaster
    pub fn broadcaster(&self) -> &RoomBroadcaster {
        &self.broadcaster
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .finish()
    }
}
