//! Entity <-> model mappers

mod chat;
mod message;
mod user;
