use thiserror::Error;

pub mod command;
pub mod message;

pub use command::{Command, Method};
pub use message::{Message, MessageKind, SYSTEM_SENDER};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    #[error("frame serialization failed: {0}")]
    Encode(#[source] serde_json::Error),
}
