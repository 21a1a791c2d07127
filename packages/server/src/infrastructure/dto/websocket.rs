//! WebSocket message DTOs.
//!
//! Every frame is a JSON text frame tagged by `type`. Field names are camelCase.
//! Signaling payloads (`desc`, `candidate`) are kept as opaque JSON values and
//! forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File descriptor as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptorDto {
    pub name: String,
    pub size: u64,
}

/// Messages sent by a browser to the broker
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Sender asks for a new session code
    CreateCode {
        request_id: Option<Value>,
        name: String,
        size: u64,
    },
    /// Receiver presents a code
    JoinCode {
        request_id: Option<Value>,
        code: String,
    },
    WebrtcOffer {
        code: String,
        desc: Value,
        /// Restrict the offer to one receiver of the session
        to: Option<String>,
    },
    WebrtcAnswer {
        code: String,
        desc: Value,
    },
    WebrtcIce {
        code: String,
        candidate: Value,
        /// Restrict the candidate to one receiver (sender side only)
        to: Option<String>,
    },
}

/// Messages sent by the broker to a browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First frame on every connection
    Welcome { connection_id: String },
    CodeCreated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Value>,
        code: String,
    },
    JoinResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Value>,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_descriptor: Option<FileDescriptorDto>,
    },
    /// Sent to the sender when a receiver joins
    ReceiverJoined { code: String },
    WebrtcOffer { desc: Value, from: String },
    WebrtcAnswer { desc: Value, from: String },
    WebrtcIce { candidate: Value, from: String },
    /// Sent to the sender when its never-joined session expired
    SessionExpired { code: String },
    /// A request could not be served (e.g. no free session code)
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<Value>,
        message: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
