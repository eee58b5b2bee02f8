//! Session transport events
//!
//! Frames on the wire are `{"event": "<name>", "data": <payload>}`.

use crate::models::Message;
use serde::{Deserialize, Serialize};

/// Frame sent by a client over its session
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Announce which user this session speaks for
    Join(String),
    SendMessage(OutgoingMessage),
}

/// Payload of a `send-message` frame
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub message: Option<String>,
}

/// Frame pushed to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    ReceiveMessage(Message),
    SendFailed { error: String },
}

/// Everything that can happen on one session, in the order it happens
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Join { email: String },
    SendMessage(OutgoingMessage),
    Disconnect,
}

impl From<ClientFrame> for SessionEvent {
    fn from(frame: ClientFrame) -> Self {
        match frame {
            ClientFrame::Join(email) => SessionEvent::Join { email },
            ClientFrame::SendMessage(outgoing) => SessionEvent::SendMessage(outgoing),
        }
    }
}
