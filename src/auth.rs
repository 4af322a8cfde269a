//! Session token validation
//!
//! Players sign in elsewhere and present an HS256 JWT carrying
//! `{sub, username, provider, exp}`. This service only validates tokens; it
//! never issues them.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Stable user id from the identity provider
    pub sub: String,
    /// Display name; also keys the player's ledger account
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub provider: Option<String>,
    /// Expiry (Unix seconds)
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token format")]
    InvalidFormat,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid issuer")]
    InvalidIssuer,

    #[error("missing required claim: {0}")]
    MissingClaim(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Validates session tokens against the shared HS256 secret
#[derive(Clone)]
pub struct SessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl SessionValidator {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_aud = false;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::MissingClaim("sub".into()));
        }
        if claims.username.is_empty() {
            return Err(AuthError::MissingClaim("username".into()));
        }

        Ok(Identity {
            user_id: claims.sub,
            username: claims.username,
        })
    }

    /// Validate the value of an `Authorization` header
    pub fn validate_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidFormat)?;
        self.validate(token)
    }
}

impl fmt::Debug for SessionValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionValidator")
            .field("issuer", &self.validation.iss)
            .finish_non_exhaustive()
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::InvalidFormat
        }
        _ => AuthError::Decode(err.to_string()),
    }
}
