//! Reconnection token codec
//!
//! A reconnection token is `peer_id ":" issued_at_unix_seconds`, sealed with
//! [`CipherMode`] under a key derived from the server secret, then encoded as hex
//! or base64. Nothing is stored server side: redemption re-derives validity.

use super::cipher::{derive_key, CipherError, CipherMode, KEY_LEN};
use crate::config::ReconnectConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Transport-safe string encoding of a sealed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEncoding {
    #[default]
    Hex,
    Base64,
}

impl TokenEncoding {
    #[must_use]
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(bytes),
            Self::Base64 => STANDARD.encode(bytes),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>, CipherError> {
        match self {
            Self::Hex => hex::decode(text).map_err(|_| CipherError::Encoding),
            Self::Base64 => STANDARD.decode(text).map_err(|_| CipherError::Encoding),
        }
    }
}

impl fmt::Display for TokenEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hex => "hex",
            Self::Base64 => "base64",
        })
    }
}

impl FromStr for TokenEncoding {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "base64" => Ok(Self::Base64),
            _ => Err(CipherError::UnsupportedEncoding(s.to_string())),
        }
    }
}

/// Reconnection token failures
///
/// Redemption failures collapse into a single variant so callers cannot learn
/// why a token was refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid or expired reconnection token")]
    InvalidOrExpired,

    #[error("Failed to issue reconnection token")]
    Issue(#[source] CipherError),
}

/// Mints and redeems reconnection tokens
#[derive(Clone)]
pub struct ReconnectionTokenCodec {
    key: [u8; KEY_LEN],
    mode: CipherMode,
    encoding: TokenEncoding,
    max_age: Duration,
}

impl ReconnectionTokenCodec {
    #[must_use]
    pub fn new(secret: &str, mode: CipherMode, encoding: TokenEncoding, max_age: Duration) -> Self {
        Self {
            key: derive_key(secret),
            mode,
            encoding,
            max_age,
        }
    }

    #[must_use]
    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            &config.secret,
            config.cipher,
            config.encoding,
            config.token_max_age(),
        )
    }

    #[must_use]
    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    #[must_use]
    pub fn encoding(&self) -> TokenEncoding {
        self.encoding
    }

    /// Configured validity window
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Mint a token for `peer_id` stamped with `now`.
    pub fn issue(&self, peer_id: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let plaintext = format!("{peer_id}:{}", now.timestamp());
        let sealed = self
            .mode
            .encrypt(&self.key, plaintext.as_bytes())
            .map_err(TokenError::Issue)?;
        Ok(self.encoding.encode(&sealed))
    }

    /// Mint a token stamped with the current time.
    pub fn issue_now(&self, peer_id: &str) -> Result<String, TokenError> {
        self.issue(peer_id, Utc::now())
    }

    /// Redeem `token` for `claimed_peer_id`.
    ///
    /// Succeeds only if the token opens under the server key, names
    /// `claimed_peer_id`, and `now - issued_at <= max_age`. Returns the peer id.
    pub fn redeem(
        &self,
        token: &str,
        claimed_peer_id: &str,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<String, TokenError> {
        match self.open(token, claimed_peer_id, now, max_age) {
            Ok(peer_id) => Ok(peer_id),
            Err(reason) => {
                tracing::debug!(reason, "Reconnection token rejected");
                Err(TokenError::InvalidOrExpired)
            }
        }
    }

    /// Redeem against the current time and the configured window.
    pub fn redeem_now(&self, token: &str, claimed_peer_id: &str) -> Result<String, TokenError> {
        self.redeem(token, claimed_peer_id, Utc::now(), self.max_age)
    }

    fn open(
        &self,
        token: &str,
        claimed_peer_id: &str,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Result<String, &'static str> {
        let sealed = self.encoding.decode(token.trim()).map_err(|_| "encoding")?;
        let plaintext = self.mode.decrypt(&self.key, &sealed).map_err(|_| "cipher")?;
        let plaintext = String::from_utf8(plaintext).map_err(|_| "utf8")?;

        let (peer_id, issued_at) = plaintext.rsplit_once(':').ok_or("layout")?;
        let issued_at: i64 = issued_at.parse().map_err(|_| "timestamp")?;

        if peer_id.is_empty() || peer_id != claimed_peer_id {
            return Err("peer mismatch");
        }

        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let age = now.timestamp().saturating_sub(issued_at);
        if age < 0 {
            return Err("issued in the future");
        }
        if age > max_age {
            return Err("expired");
        }

        Ok(peer_id.to_string())
    }
}

impl fmt::Debug for ReconnectionTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectionTokenCodec")
            .field("mode", &self.mode)
            .field("encoding", &self.encoding)
            .field("max_age", &self.max_age)
            .finish()
    }
}
