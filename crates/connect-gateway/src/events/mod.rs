//! Outbound event payloads

mod payloads;

pub use payloads::{
    ChatHistoryPayload, ErrorPayload, MessagePayload, PresenceOfflinePayload,
    PresenceOnlinePayload, ReadReceiptPayload, TypingUpdatePayload, UserPresencePayload,
};
