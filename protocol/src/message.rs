use serde::{Deserialize, Serialize};

use crate::Command;

/// Sender name the server uses for its own announcements.
pub const SYSTEM_SENDER: &str = "System";

/// One chat line as displayed: an inbound command with the method dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub message: String,
    pub is_self: bool,
}

/// Display classification of a message, derived at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Server announcement (`sender == "System"`, whatever `is_self` says).
    System,
    /// Sent by this client.
    Own,
    /// Sent by another participant.
    Other,
}

impl Message {
    /// Classify by sender and self flag. Pure function of the fields;
    /// nothing is stored.
    pub fn kind(&self) -> MessageKind {
        if self.sender == SYSTEM_SENDER {
            MessageKind::System
        } else if self.is_self {
            MessageKind::Own
        } else {
            MessageKind::Other
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Self {
            sender: command.sender,
            message: command.message,
            is_self: command.is_self,
        }
    }
}
