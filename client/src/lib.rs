//! Async client for the banter chat-room service.
//!
//! One [`RoomSession`] per chat screen: it owns a single websocket
//! connection, drives the Join handshake, and maintains an append-only
//! [`Transcript`] of inbound messages. [`ApiClient`] covers the HTTP
//! endpoints around the session (auth gate, room directory, accounts).

mod api;
mod connection;
mod error;
mod handle;
mod session;
mod target;
mod transcript;

pub use banter_protocol::{Command, Message, MessageKind, Method, ParseError, SYSTEM_SENDER};

pub use api::{ApiClient, Room};
pub use connection::{Connection, ConnectionError, ConnectionEvent};
pub use error::ClientError;
pub use handle::SessionHandle;
pub use session::{RoomSession, SessionState};
pub use target::RoomTarget;
pub use transcript::Transcript;
