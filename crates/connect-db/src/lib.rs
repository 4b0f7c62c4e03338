//! # connect-db
//!
//! Database layer implementing the coordinator's persistence collaborator
//! with PostgreSQL via SQLx.
//!
//! This crate provides PostgreSQL implementations for the repository
//! traits defined in `connect-core`:
//!
//! - Connection pool management
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use repositories::{
    PgChatMemberRepository, PgChatRepository, PgMessageRepository, PgUserRepository,
};
