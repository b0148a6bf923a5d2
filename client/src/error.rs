use thiserror::Error;

use banter_protocol::ParseError;

use crate::connection::ConnectionError;

/// Failures surfaced by the client. Session failures are always terminal;
/// there are no retries anywhere.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Create flow submitted with a blank room name. Rejected before any
    /// connection attempt.
    #[error("room name cannot be empty")]
    EmptyRoomName,

    /// Join flow entered without a room id. Rejected before any
    /// connection attempt.
    #[error("no room id in the entry context")]
    TargetMissing,

    /// An inbound frame could not be decoded. Session-fatal.
    #[error(transparent)]
    Protocol(#[from] ParseError),

    /// Transport-level failure. Session-fatal.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Send or handle requested with no live connection.
    #[error("no live connection")]
    NotConnected,

    /// `connect` called on a session that already left `Idle`.
    #[error("session already started")]
    AlreadyStarted,

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server-reported rejection, carrying the server's message.
    #[error("{0}")]
    Api(String),
}
