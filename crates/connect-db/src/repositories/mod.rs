//! PostgreSQL repository implementations

mod chat;
mod error;
mod member;
mod message;
mod user;

pub use chat::PgChatRepository;
pub use member::PgChatMemberRepository;
pub use message::PgMessageRepository;
pub use user::PgUserRepository;
