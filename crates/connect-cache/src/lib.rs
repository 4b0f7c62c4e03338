//! # connect-cache
//!
//! Ephemeral TTL-keyed state for the realtime coordinator.
//!
//! Presence ("is this user online") and typing indicators ("who is typing
//! in this room") are short-lived records that must age out on their own
//! when no explicit clear signal arrives. Both are built on the
//! [`EphemeralStore`] abstraction: an in-memory sweep-based map serves a
//! single-process deployment, a Redis backing serves multi-process
//! fan-out. The externally observable answers are identical - an expired
//! record is never reported.

pub mod pool;
pub mod presence;
pub mod store;
pub mod typing;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig};

// Re-export store types
pub use store::{EphemeralStore, MemoryStore, RedisStore, StoreError, StoreResult};

// Re-export trackers
pub use presence::{PresenceStatus, PresenceTracker};
pub use typing::TypingTracker;
