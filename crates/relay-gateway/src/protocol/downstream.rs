//! Server-to-client envelopes

use super::MessageData;
use serde::{Deserialize, Serialize};

/// Downstream envelope, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DownstreamMessage {
    System(SystemMessage),
    Ack(AckMessage),
    Message(DataMessage),
}

impl DownstreamMessage {
    /// Handshake sent once when a peer is created
    #[must_use]
    pub fn connected(
        connection_id: impl Into<String>,
        user_id: impl Into<String>,
        reconnection_token: impl Into<String>,
    ) -> Self {
        Self::System(SystemMessage::Connected(ConnectedMessage {
            connection_id: connection_id.into(),
            user_id: user_id.into(),
            reconnection_token: reconnection_token.into(),
        }))
    }

    #[must_use]
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::System(SystemMessage::Disconnected(DisconnectedMessage {
            message: message.into(),
        }))
    }

    #[must_use]
    pub fn data(data: MessageData) -> Self {
        Self::Message(DataMessage {
            from: None,
            group: None,
            data,
        })
    }

    /// Name used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::System(SystemMessage::Connected(_)) => "connected",
            Self::System(SystemMessage::Disconnected(_)) => "disconnected",
            Self::Ack(_) => "ack",
            Self::Message(_) => "message",
        }
    }
}

impl From<AckMessage> for DownstreamMessage {
    fn from(ack: AckMessage) -> Self {
        Self::Ack(ack)
    }
}

impl From<DataMessage> for DownstreamMessage {
    fn from(message: DataMessage) -> Self {
        Self::Message(message)
    }
}

/// Server lifecycle notices, tagged by `event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SystemMessage {
    Connected(ConnectedMessage),
    Disconnected(DisconnectedMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub user_id: String,
    pub reconnection_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectedMessage {
    pub message: String,
}

/// Acknowledgement of a client operation carrying an `ackId`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckMessage {
    pub ack_id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AckError>,
}

impl AckMessage {
    #[must_use]
    pub const fn success(ack_id: u64) -> Self {
        Self {
            ack_id,
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(ack_id: u64, error: AckError) -> Self {
        Self {
            ack_id,
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckError {
    pub name: String,
    pub message: String,
}

impl AckError {
    /// Sender tried to broadcast to a group it is not a member of
    #[must_use]
    pub fn not_in_group(group: &str) -> Self {
        Self {
            name: "NotInGroup".to_string(),
            message: format!("Not a member of group '{group}'"),
        }
    }

    /// The operation could not be carried out
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            name: "InternalServerError".to_string(),
            message: message.into(),
        }
    }
}

/// Payload delivered to a peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    /// Sending peer, when the payload came from a group broadcast
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub data: MessageData,
}
