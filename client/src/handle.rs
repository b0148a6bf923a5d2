use tokio::sync::mpsc;

use banter_protocol::Command;

use crate::connection::Outbound;
use crate::error::ClientError;

/// Cloneable handle for sending into a live room session.
///
/// Can be passed to input tasks and cloned freely; the session keeps
/// exclusive ownership of the connection itself.
#[derive(Clone)]
pub struct SessionHandle {
    outgoing: mpsc::UnboundedSender<Outbound>,
}

impl SessionHandle {
    pub(crate) fn new(outgoing: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { outgoing }
    }

    /// Send one chat message. Empty text is a no-op; sender identity is
    /// left to the server. Fails once the connection is closed.
    pub fn send_chat(&self, text: &str) -> Result<(), ClientError> {
        if text.is_empty() {
            return Ok(());
        }

        let frame = Command::send(text).encode()?;
        self.outgoing
            .send(Outbound::Frame(frame))
            .map_err(|_| ClientError::NotConnected)
    }

    /// Request a close. Safe to call repeatedly.
    pub fn close(&self) {
        let _ = self.outgoing.send(Outbound::Close);
    }
}
