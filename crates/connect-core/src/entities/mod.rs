//! Domain entities

mod chat;
mod message;
mod user;

pub use chat::{Chat, ChatMember, MemberRole};
pub use message::{MediaItem, Message, MessageView};
pub use user::{User, UserSummary};
