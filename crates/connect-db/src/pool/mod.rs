//! Connection pool management

mod postgres;

pub use postgres::{create_pool, DatabaseConfig};
pub use sqlx::postgres::PgPool;
