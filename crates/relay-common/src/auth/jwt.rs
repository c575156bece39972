//! Primary access tokens
//!
//! Access tokens are HS256 JWTs whose subject is the externally authenticated user id.

use super::IdentityProvider;
use crate::error::RelayError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

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

/// JWT service for encoding and validating access tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
        }
    }

    /// Issue an access token for `user_id`
    pub fn issue_access_token(&self, user_id: &str) -> Result<String, RelayError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| RelayError::Server(format!("Failed to encode token: {e}")))
    }

    /// Validate an access token, accepting an optional `Bearer ` prefix
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, RelayError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token validation failed");
                RelayError::InvalidAccessToken
            })
    }
}

impl IdentityProvider for JwtService {
    fn user_id(&self, access_token: &str) -> Option<String> {
        self.validate_access_token(access_token)
            .ok()
            .map(|claims| claims.sub)
            .filter(|sub| !sub.is_empty())
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish()
    }
}
