//! Credential verification
//!
//! The coordinator never assumes a token format: it talks to a
//! [`TokenVerifier`], and `JwtService` is the provided implementation.

mod token;

pub use token::{Claims, JwtService, TokenVerifier};
