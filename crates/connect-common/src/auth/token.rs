//! Bearer credential verification
//!
//! Verification is pluggable: the gateway depends on the [`TokenVerifier`]
//! trait, and the JWT implementation here (via the `jsonwebtoken` crate)
//! is what production wiring installs.

use chrono::{Duration, Utc};
use connect_core::Snowflake;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Get the user ID as a Snowflake
    ///
    /// # Errors
    /// Returns an error if the subject cannot be parsed as a Snowflake
    pub fn user_id(&self) -> Result<Snowflake, AppError> {
        self.sub
            .parse::<i64>()
            .map(Snowflake::new)
            .map_err(|_| AppError::InvalidToken)
    }

    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Resolves a bearer credential to a user identity
///
/// The realtime transport reuses whatever credential the platform issues
/// at login; implementations own the verification scheme.
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and return the user ID it identifies
    ///
    /// # Errors
    /// Returns an authentication error if the token is missing a valid
    /// signature, is expired, or carries no usable subject.
    fn verify(&self, token: &str) -> Result<Snowflake, AppError>;
}

/// JWT-backed credential verification
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: i64,
}

impl JwtService {
    /// Create a new JWT service with the given secret and expiry time
    #[must_use]
    pub fn new(secret: &str, token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry,
        }
    }

    /// Issue a token for a user
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue(&self, user_id: Snowflake) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AppError::internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    /// Decode and validate a token, returning the claims
    ///
    /// # Errors
    /// Returns an error if the token is invalid or expired
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }
}

impl TokenVerifier for JwtService {
    fn verify(&self, token: &str) -> Result<Snowflake, AppError> {
        let claims = self.decode_token(token)?;
        claims.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key", 900)
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = service();
        let user_id = Snowflake::new(12345);

        let token = svc.issue(user_id).unwrap();
        let verified = svc.verify(&token).unwrap();

        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let svc = service();
        assert!(matches!(
            svc.verify("not-a-jwt"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let issuer = JwtService::new("secret-a", 900);
        let verifier = JwtService::new("secret-b", 900);

        let token = issuer.issue(Snowflake::new(1)).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let svc = JwtService::new("test-secret-key", -120);
        let token = svc.issue(Snowflake::new(1)).unwrap();
        assert!(matches!(svc.verify(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_claims_user_id() {
        let claims = Claims {
            sub: "42".to_string(),
            iat: 0,
            exp: i64::MAX,
        };
        assert_eq!(claims.user_id().unwrap(), Snowflake::new(42));

        let bad = Claims {
            sub: "abc".to_string(),
            iat: 0,
            exp: i64::MAX,
        };
        assert!(bad.user_id().is_err());
    }
}
