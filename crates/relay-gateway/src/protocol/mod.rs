//! Relay wire protocol
//!
//! Upstream and downstream envelopes, payloads, frames, and close codes.

mod close_codes;
mod downstream;
mod frame;
mod payloads;
mod upstream;

pub use close_codes::CloseCode;
pub use downstream::{
    AckError, AckMessage, ConnectedMessage, DataMessage, DisconnectedMessage, DownstreamMessage,
    SystemMessage,
};
pub use frame::{Frame, ProtocolError};
pub use payloads::{MessageData, TypedData};
pub use upstream::{
    EventMessage, JoinGroupMessage, LeaveGroupMessage, SendToGroupMessage, SequenceAckMessage,
    UpstreamMessage,
};
