//! Login sessions as signed JWTs.
//!
//! A token names the user and nothing else. Roles change at runtime, so the
//! extractor in [`crate::auth`] reloads the account on every request.

use court_domain::{unix_now, UserId};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session management error
#[derive(Debug, Error)]
pub enum SessionError {
    /// The token could not be signed
    #[error("Failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Token expired
    #[error("Session token expired")]
    TokenExpired,

    /// Bad signature, malformed token or unknown subject
    #[error("Invalid session token")]
    InvalidToken,
}

/// JWT claims for session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Hyphenated id of the logged-in user
    pub user_id: String,

    /// Expiry (Unix seconds)
    pub exp: u64,

    /// Issue time (Unix seconds)
    pub iat: u64,
}

impl SessionClaims {
    /// Parse the user id carried by the token
    pub fn user_id(&self) -> Result<UserId, SessionError> {
        UserId::from_string(&self.user_id).map_err(|_| SessionError::InvalidToken)
    }
}

/// Issues and checks HS256 session tokens
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry_secs: u64,
}

impl SessionManager {
    /// Sign with `jwt_secret`; sessions last `token_expiry_secs`
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            token_expiry_secs,
        }
    }

    /// Lifetime of newly issued tokens in seconds
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_secs
    }

    fn claims_at(&self, user_id: UserId, now: u64) -> SessionClaims {
        SessionClaims {
            user_id: user_id.to_string(),
            exp: now + self.token_expiry_secs,
            iat: now,
        }
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        Ok(encode(&Header::default(), claims, &self.encoding_key)?)
    }

    /// Start a session for a user who just logged in
    pub fn issue_token(&self, user_id: UserId) -> Result<String, SessionError> {
        self.sign(&self.claims_at(user_id, unix_now()))
    }

    /// Check signature and expiry, returning the claims
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })
    }

    /// The user a bearer token speaks for
    pub fn authenticate(&self, token: &str) -> Result<UserId, SessionError> {
        self.verify_token(token)?.user_id()
    }
}
