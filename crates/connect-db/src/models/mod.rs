//! Database models with SQLx FromRow derives

mod chat;
mod message;
mod user;

pub use chat::ChatModel;
pub use message::{MessageModel, MessageWithSenderModel};
pub use user::UserModel;
