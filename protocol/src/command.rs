use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Methods a command can carry on the wire.
///
/// Clients only ever send `Join` and `Send`; the server additionally
/// broadcasts `Leave` announcements when a participant drops out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Join,
    Send,
    Leave,
}

/// One wire command, exchanged as a JSON text frame in both directions.
///
/// Outbound commands never fill `sender` or `is_self`; the server
/// attributes sender identity when it echoes messages back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub method: Method,
    pub message: String,
    pub sender: String,
    pub is_self: bool,
}

impl Command {
    /// The join handshake command. Carries no message text.
    pub fn join() -> Self {
        Self {
            method: Method::Join,
            message: String::new(),
            sender: String::new(),
            is_self: false,
        }
    }

    /// A chat command carrying `message`.
    pub fn send(message: impl Into<String>) -> Self {
        Self {
            method: Method::Send,
            message: message.into(),
            sender: String::new(),
            is_self: false,
        }
    }

    /// Serialize to a wire text frame.
    pub fn encode(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(ParseError::Encode)
    }

    /// Parse a wire text frame.
    ///
    /// Fails on malformed JSON, a missing field, or an unknown method.
    /// Inbound `Join` and `Leave` frames may carry message text (the
    /// server announces joins and leaves that way), so no method/message
    /// invariant is enforced here.
    pub fn decode(frame: &str) -> Result<Self, ParseError> {
        serde_json::from_str(frame).map_err(ParseError::MalformedFrame)
    }
}
