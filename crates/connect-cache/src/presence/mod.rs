//! User presence tracking

mod tracker;

pub use tracker::{PresenceStatus, PresenceTracker};
