//! AES-256 sealing primitives for reconnection credentials
//!
//! Two wire layouts are supported:
//!
//! - `Cbc`: `iv (16) || aes-256-cbc(pkcs7(plaintext))`, confidentiality only
//! - `Gcm`: `nonce (12) || aes-256-gcm(plaintext) || tag (16)`, authenticated
//!
//! Every call to [`CipherMode::encrypt`] draws a fresh IV/nonce from the thread RNG.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of the derived AES-256 key
pub const KEY_LEN: usize = 32;

const BLOCK_SIZE: usize = 16;
const GCM_NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Derive a fixed-size key from an operator-supplied secret of any length.
#[must_use]
pub fn derive_key(secret: &str) -> [u8; KEY_LEN] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Block cipher mode used to seal tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// Confidentiality only (random IV, PKCS#7 padding)
    Cbc,
    /// Authenticated encryption (random nonce, 128-bit tag)
    #[default]
    Gcm,
}

impl CipherMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cbc => "cbc",
            Self::Gcm => "gcm",
        }
    }

    /// Seal `plaintext` under `key`. The IV/nonce is prepended to the output.
    pub fn encrypt(self, key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            Self::Cbc => encrypt_cbc(key, plaintext),
            Self::Gcm => encrypt_gcm(key, plaintext),
        }
    }

    /// Open a sealed buffer produced by [`CipherMode::encrypt`] with the same mode.
    pub fn decrypt(self, key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self {
            Self::Cbc => decrypt_cbc(key, sealed),
            Self::Gcm => decrypt_gcm(key, sealed),
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherMode {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cbc" => Ok(Self::Cbc),
            "gcm" => Ok(Self::Gcm),
            _ => Err(CipherError::UnsupportedMode(s.to_string())),
        }
    }
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

fn encrypt_cbc(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let iv = random_bytes::<BLOCK_SIZE>();
    let encryptor =
        Aes256CbcEnc::new_from_slices(key, &iv).map_err(|_| CipherError::InvalidKeyLength)?;
    let body = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut sealed = Vec::with_capacity(BLOCK_SIZE + body.len());
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&body);
    Ok(sealed)
}

fn decrypt_cbc(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
    if sealed.len() < 2 * BLOCK_SIZE {
        return Err(CipherError::Truncated);
    }
    let (iv, body) = sealed.split_at(BLOCK_SIZE);
    if body.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::Truncated);
    }

    let decryptor =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CipherError::InvalidKeyLength)?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|_| CipherError::InvalidPadding)
}

fn encrypt_gcm(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength)?;
    let nonce = random_bytes::<GCM_NONCE_LEN>();
    let body = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::Seal)?;

    let mut sealed = Vec::with_capacity(GCM_NONCE_LEN + body.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&body);
    Ok(sealed)
}

fn decrypt_gcm(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
    if sealed.len() < GCM_NONCE_LEN + GCM_TAG_LEN {
        return Err(CipherError::Truncated);
    }
    let (nonce, body) = sealed.split_at(GCM_NONCE_LEN);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| CipherError::Authentication)
}

/// Low-level cipher failures. Never shown to clients.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("Unsupported cipher mode: {0}")]
    UnsupportedMode(String),

    #[error("Unsupported token encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Invalid key length")]
    InvalidKeyLength,

    #[error("Ciphertext too short")]
    Truncated,

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Authentication tag mismatch")]
    Authentication,

    #[error("Encryption failed")]
    Seal,

    #[error("Malformed encoding")]
    Encoding,
}
