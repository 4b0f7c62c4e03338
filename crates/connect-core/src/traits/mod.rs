//! Repository traits (ports) consumed by the coordinator

mod repositories;

pub use repositories::{
    ChatMemberRepository, ChatRepository, MessageRepository, RepoResult, UserRepository,
};
