//! Wire protocol
//!
//! JSON text frames of the shape `{"type": "<event>", "data": {...}}` in
//! both directions.

mod close_codes;
mod messages;

pub use close_codes::CloseCode;
pub use messages::{
    ClientMessage, MessageReadPayload, RoomPayload, SendMessagePayload, ServerEvent,
    UserRefPayload,
};
