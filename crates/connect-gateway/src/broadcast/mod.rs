//! Event fan-out to subscribed sessions

mod broadcaster;

pub use broadcaster::RoomBroadcaster;
