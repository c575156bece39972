//! Credentials
//!
//! Primary access tokens (JWT) and sealed reconnection tokens.

mod cipher;
mod jwt;
mod reconnect;

pub use cipher::{derive_key, CipherError, CipherMode, KEY_LEN};
pub use jwt::{Claims, JwtService};
pub use reconnect::{ReconnectionTokenCodec, TokenEncoding, TokenError};

/// Resolves a primary access token to the user it authenticates.
pub trait IdentityProvider: Send + Sync {
    /// `None` when the token is invalid, expired, or names no user.
    fn user_id(&self, access_token: &str) -> Option<String>;
}
