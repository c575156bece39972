//! Transport frames
//!
//! Envelopes are JSON. Inbound JSON is accepted in text or binary frames;
//! outbound envelopes are always written as text.

use super::{DownstreamMessage, UpstreamMessage};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A single transport frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Envelope encoding failures
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

fn decode<T: DeserializeOwned>(frame: &Frame) -> Result<T, ProtocolError> {
    serde_json::from_slice(frame.as_bytes()).map_err(ProtocolError::Decode)
}

fn encode<T: Serialize>(message: &T) -> Result<Frame, ProtocolError> {
    serde_json::to_string(message)
        .map(Frame::Text)
        .map_err(ProtocolError::Encode)
}

impl UpstreamMessage {
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        decode(frame)
    }

    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        encode(self)
    }
}

impl DownstreamMessage {
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        decode(frame)
    }

    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        encode(self)
    }
}
