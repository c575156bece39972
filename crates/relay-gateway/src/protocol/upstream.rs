//! Client-to-server envelopes

use super::MessageData;
use serde::{Deserialize, Serialize};

/// Upstream envelope, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UpstreamMessage {
    JoinGroup(JoinGroupMessage),
    LeaveGroup(LeaveGroupMessage),
    SendToGroup(SendToGroupMessage),
    Event(EventMessage),
    SequenceAck(SequenceAckMessage),
}

impl UpstreamMessage {
    #[must_use]
    pub fn join_group(group: impl Into<String>, ack_id: Option<u64>) -> Self {
        Self::JoinGroup(JoinGroupMessage {
            group: group.into(),
            ack_id,
        })
    }

    #[must_use]
    pub fn leave_group(group: impl Into<String>, ack_id: Option<u64>) -> Self {
        Self::LeaveGroup(LeaveGroupMessage {
            group: group.into(),
            ack_id,
        })
    }

    #[must_use]
    pub fn send_to_group(group: impl Into<String>, data: MessageData) -> Self {
        Self::SendToGroup(SendToGroupMessage::new(group, data))
    }

    /// Name used in logs and observer events
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JoinGroup(_) => "joingroup",
            Self::LeaveGroup(_) => "leavegroup",
            Self::SendToGroup(_) => "sendtogroup",
            Self::Event(_) => "event",
            Self::SequenceAck(_) => "sequenceack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupMessage {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupMessage {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToGroupMessage {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
    /// When true the sender is excluded from its own broadcast
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_echo: Option<bool>,
    pub data: MessageData,
}

impl SendToGroupMessage {
    #[must_use]
    pub fn new(group: impl Into<String>, data: MessageData) -> Self {
        Self {
            group: group.into(),
            ack_id: None,
            no_echo: None,
            data,
        }
    }

    #[must_use]
    pub fn with_ack_id(mut self, ack_id: u64) -> Self {
        self.ack_id = Some(ack_id);
        self
    }

    #[must_use]
    pub fn with_no_echo(mut self, no_echo: bool) -> Self {
        self.no_echo = Some(no_echo);
        self
    }
}

impl From<SendToGroupMessage> for UpstreamMessage {
    fn from(message: SendToGroupMessage) -> Self {
        Self::SendToGroup(message)
    }
}

/// Application event addressed to the server. Handled by observers only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceAckMessage {
    pub sequence_id: u64,
}
