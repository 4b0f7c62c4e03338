//! Handler error types

use connect_common::AppError;
use connect_core::{DomainError, Snowflake};
use thiserror::Error;

use crate::authorize::AuthorizeError;
use crate::protocol::CloseCode;

/// Errors from in-session event handling
///
/// None of these are fatal to the connection: the dispatcher reports
/// them to the originating session as an `error` event and moves on.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Authenticated but not a member of the targeted room
    #[error("Not a member of chat {0}")]
    NotAMember(Snowflake),

    /// Membership could not be established (fails closed)
    #[error(transparent)]
    Authorize(#[from] AuthorizeError),

    /// Persistence collaborator failed
    #[error(transparent)]
    Persistence(#[from] DomainError),

    /// Persistence collaborator did not answer in time
    #[error("Persistence call timed out")]
    Timeout,
}

impl HandlerError {
    /// Check if this is a definitive authorization rejection
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotAMember(_))
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Errors from the authentication handshake
///
/// All of these reject the connection before it is registered; no event
/// dispatch ever happens for a session that failed here.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("No credential presented")]
    MissingToken,

    #[error(transparent)]
    Credential(AppError),

    #[error("Unknown user")]
    UnknownUser,

    #[error("User account suspended")]
    Suspended,

    #[error("User lookup failed: {0}")]
    Lookup(DomainError),

    #[error("User lookup timed out")]
    LookupTimeout,
}

impl HandshakeError {
    /// Close code sent on the rejecting close frame
    pub fn close_code(&self) -> CloseCode {
        match self {
            Self::MissingToken
            | Self::Credential(_)
            | Self::UnknownUser
            | Self::Suspended => CloseCode::AuthenticationFailed,
            Self::Lookup(_) | Self::LookupTimeout => CloseCode::UnknownError,
        }
    }
}
