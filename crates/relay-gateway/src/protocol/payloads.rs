//! Data payloads carried by broadcasts
//!
//! A payload is one of a closed set of content kinds. On the JSON wire it is
//! adjacently tagged: `{"kind": "text", "data": "hi"}`. Binary content is base64.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Broadcast payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum MessageData {
    /// Plain UTF-8 text
    Text(String),
    /// Arbitrary JSON document
    Json(Value),
    /// Raw bytes
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Nested message tagged with its schema type
    Typed(TypedData),
}

impl MessageData {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Short kind name for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Json(_) => "json",
            Self::Binary(_) => "binary",
            Self::Typed(_) => "typed",
        }
    }
}

impl From<&str> for MessageData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Nested typed message, identified by a schema URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub type_url: String,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
