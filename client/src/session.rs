use banter_protocol::{Command, Message};

use crate::connection::{Connection, ConnectionError, ConnectionEvent};
use crate::error::ClientError;
use crate::handle::SessionHandle;
use crate::target::RoomTarget;
use crate::transcript::Transcript;

/// Lifecycle of one room session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    AwaitingJoinAck,
    Active,
    Closed,
    Errored,
}

impl SessionState {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

/// External events the session reacts to.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    Opened,
    Frame(String),
    ConnectionClosed,
    ConnectionError(ConnectionError),
}

/// Side effects a transition asks the driver to perform.
#[derive(Debug)]
pub(crate) enum Action {
    SendJoin,
    Append(Message),
    Close,
    Fail(ClientError),
}

/// Pure transition function of (state, event).
///
/// The protocol has no explicit join acknowledgement: the first inbound
/// frame both activates the session and lands in the transcript. A frame
/// that fails to decode is session-fatal, since there is no
/// resynchronization mechanism. Terminal states ignore every event.
pub(crate) fn transition(state: SessionState, event: SessionEvent) -> (SessionState, Vec<Action>) {
    use SessionState::*;

    if state.is_terminal() {
        return (state, Vec::new());
    }

    match event {
        SessionEvent::Opened if state == Connecting => (AwaitingJoinAck, vec![Action::SendJoin]),
        SessionEvent::Frame(frame) if matches!(state, AwaitingJoinAck | Active) => {
            match Command::decode(&frame) {
                Ok(command) => (Active, vec![Action::Append(Message::from(command))]),
                Err(e) => (
                    Errored,
                    vec![Action::Close, Action::Fail(ClientError::Protocol(e))],
                ),
            }
        }
        SessionEvent::ConnectionClosed => (Closed, vec![Action::Close]),
        SessionEvent::ConnectionError(e) => (
            Errored,
            vec![Action::Close, Action::Fail(ClientError::Connection(e))],
        ),
        _ => (state, Vec::new()),
    }
}

/// One chat-room session: owns the connection, the state machine, and
/// the transcript. Dropping the session closes the connection.
pub struct RoomSession {
    target: RoomTarget,
    state: SessionState,
    connection: Option<Connection>,
    transcript: Transcript,
}

impl RoomSession {
    /// Session for the create flow. A blank room name is rejected before
    /// any connection attempt.
    pub fn create(room_name: &str) -> Result<Self, ClientError> {
        Ok(Self::new(RoomTarget::create(room_name)?))
    }

    /// Session for the join flow. Fails with `TargetMissing` when the
    /// entry context carries no room id.
    pub fn join(room_id: Option<&str>) -> Result<Self, ClientError> {
        Ok(Self::new(RoomTarget::join(room_id)?))
    }

    fn new(target: RoomTarget) -> Self {
        Self {
            target,
            state: SessionState::Idle,
            connection: None,
            transcript: Transcript::new(),
        }
    }

    /// Open the connection and send the join handshake.
    ///
    /// Only valid from `Idle`. On success the session is
    /// `AwaitingJoinAck`; on failure it is `Errored` and must be
    /// discarded.
    pub async fn connect(&mut self, base_url: &str) -> Result<(), ClientError> {
        if self.state != SessionState::Idle {
            return Err(ClientError::AlreadyStarted);
        }

        let endpoint = self.target.endpoint(base_url)?;
        let join_frame = Command::join().encode()?;
        self.state = SessionState::Connecting;

        let connection = match Connection::open(endpoint.as_str()).await {
            Ok(connection) => connection,
            Err(e) => {
                self.state = SessionState::Errored;
                return Err(e.into());
            }
        };

        let (next, actions) = transition(self.state, SessionEvent::Opened);
        for action in actions {
            if let Action::SendJoin = action {
                if let Err(e) = connection.send(&join_frame) {
                    self.state = SessionState::Errored;
                    return Err(e.into());
                }
            }
        }

        self.state = next;
        self.connection = Some(connection);
        Ok(())
    }

    /// Send one chat message. Hard precondition: a live connection must
    /// exist (`AwaitingJoinAck` or `Active`). Empty text is a no-op.
    ///
    /// The message is not appended locally; the transcript grows only
    /// from inbound frames, so display order equals the server's
    /// broadcast order.
    pub fn send(&self, text: &str) -> Result<(), ClientError> {
        let connection = self.connection.as_ref().ok_or(ClientError::NotConnected)?;
        if text.is_empty() {
            return Ok(());
        }

        let frame = Command::send(text).encode()?;
        connection.send(&frame)?;
        Ok(())
    }

    /// Cloneable send handle for input tasks. Fails before `connect`.
    pub fn handle(&self) -> Result<SessionHandle, ClientError> {
        self.connection
            .as_ref()
            .map(Connection::handle)
            .ok_or(ClientError::NotConnected)
    }

    /// Wait for the next transcript entry.
    ///
    /// Pumps connection events through the state machine: the first
    /// inbound frame moves the session to `Active`, and every decoded
    /// frame is appended to the transcript in transport order.
    /// `Some(Err(_))` reports a session-fatal failure; the caller is
    /// expected to surface it and leave the room screen. `None` means
    /// the session has ended; no events are processed past that point.
    pub async fn next_message(&mut self) -> Option<Result<Message, ClientError>> {
        loop {
            let event = match self.connection.as_mut()?.next_event().await? {
                ConnectionEvent::Frame(frame) => SessionEvent::Frame(frame),
                ConnectionEvent::Closed => SessionEvent::ConnectionClosed,
                ConnectionEvent::Error(e) => SessionEvent::ConnectionError(e),
            };

            let (next, actions) = transition(self.state, event);
            self.state = next;

            let mut outcome = None;
            for action in actions {
                match action {
                    Action::Append(message) => {
                        self.transcript.append(message.clone());
                        outcome = Some(Ok(message));
                    }
                    Action::Close => {
                        if let Some(mut connection) = self.connection.take() {
                            connection.close();
                        }
                    }
                    Action::Fail(e) => outcome = Some(Err(e)),
                    // Opened is driven from connect(), never from here.
                    Action::SendJoin => {}
                }
            }

            match outcome {
                Some(result) => return Some(result),
                None if self.state.is_terminal() => return None,
                None => {}
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target(&self) -> &RoomTarget {
        &self.target
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Tear the session down, releasing the connection. Idempotent;
    /// `Errored` stays `Errored`, everything else ends `Closed`.
    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        if self.state != SessionState::Errored {
            self.state = SessionState::Closed;
        }
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_protocol::Method;

    fn server_frame(sender: &str, text: &str) -> String {
        Command {
            method: Method::Send,
            message: text.into(),
            sender: sender.into(),
            is_self: false,
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn opened_while_connecting_sends_join() {
        let (next, actions) = transition(SessionState::Connecting, SessionEvent::Opened);

        assert_eq!(next, SessionState::AwaitingJoinAck);
        assert!(matches!(actions.as_slice(), [Action::SendJoin]));
    }

    #[test]
    fn first_frame_activates_and_appends() {
        let event = SessionEvent::Frame(server_frame("System", "welcome"));
        let (next, actions) = transition(SessionState::AwaitingJoinAck, event);

        assert_eq!(next, SessionState::Active);
        let [Action::Append(message)] = actions.as_slice() else {
            panic!("expected a single append");
        };
        assert_eq!(message.sender, "System");
        assert_eq!(message.message, "welcome");
    }

    #[test]
    fn active_session_keeps_appending() {
        let event = SessionEvent::Frame(server_frame("ada", "hi"));
        let (next, actions) = transition(SessionState::Active, event);

        assert_eq!(next, SessionState::Active);
        assert!(matches!(actions.as_slice(), [Action::Append(_)]));
    }

    #[test]
    fn leave_announcement_is_a_system_entry() {
        let frame = Command {
            method: Method::Leave,
            message: "User ada leave the room".into(),
            sender: "System".into(),
            is_self: false,
        }
        .encode()
        .unwrap();

        let (next, actions) = transition(SessionState::Active, SessionEvent::Frame(frame));

        assert_eq!(next, SessionState::Active);
        let [Action::Append(message)] = actions.as_slice() else {
            panic!("expected a single append");
        };
        assert_eq!(message.kind(), banter_protocol::MessageKind::System);
        assert_eq!(message.message, "User ada leave the room");
    }

    #[test]
    fn inbound_order_is_transcript_order() {
        let mut state = SessionState::AwaitingJoinAck;
        let mut transcript = Transcript::new();

        for i in 0..5 {
            let event = SessionEvent::Frame(server_frame("ada", &format!("m{i}")));
            let (next, actions) = transition(state, event);
            state = next;
            for action in actions {
                if let Action::Append(message) = action {
                    transcript.append(message);
                }
            }
        }

        assert_eq!(state, SessionState::Active);
        let texts: Vec<_> = transcript.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, ["m0", "m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn malformed_frame_is_session_fatal() {
        let event = SessionEvent::Frame("{not json".into());
        let (next, actions) = transition(SessionState::Active, event);

        assert_eq!(next, SessionState::Errored);
        assert!(matches!(
            actions.as_slice(),
            [Action::Close, Action::Fail(ClientError::Protocol(_))]
        ));
    }

    #[test]
    fn transport_error_is_session_fatal() {
        let event = SessionEvent::ConnectionError(ConnectionError::Transport("io".into()));
        let (next, actions) = transition(SessionState::Active, event);

        assert_eq!(next, SessionState::Errored);
        assert!(matches!(
            actions.as_slice(),
            [Action::Close, Action::Fail(ClientError::Connection(_))]
        ));
    }

    #[test]
    fn peer_close_ends_the_session() {
        let (next, actions) = transition(SessionState::Active, SessionEvent::ConnectionClosed);

        assert_eq!(next, SessionState::Closed);
        assert!(matches!(actions.as_slice(), [Action::Close]));
    }

    #[test]
    fn terminal_states_ignore_every_event() {
        for state in [SessionState::Closed, SessionState::Errored] {
            let events = [
                SessionEvent::Opened,
                SessionEvent::Frame(server_frame("ada", "late")),
                SessionEvent::ConnectionClosed,
                SessionEvent::ConnectionError(ConnectionError::Transport("io".into())),
            ];
            for event in events {
                let (next, actions) = transition(state, event);
                assert_eq!(next, state);
                assert!(actions.is_empty());
            }
        }
    }

    #[test]
    fn frame_before_handshake_is_ignored() {
        let event = SessionEvent::Frame(server_frame("ada", "early"));
        let (next, actions) = transition(SessionState::Connecting, event);

        assert_eq!(next, SessionState::Connecting);
        assert!(actions.is_empty());
    }

    #[test]
    fn create_rejects_blank_room_name() {
        assert!(matches!(
            RoomSession::create("  "),
            Err(ClientError::EmptyRoomName)
        ));
    }

    #[test]
    fn join_requires_a_room_id() {
        assert!(matches!(
            RoomSession::join(None),
            Err(ClientError::TargetMissing)
        ));
    }

    #[test]
    fn send_requires_a_live_connection() {
        let session = RoomSession::create("sport").unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(
            session.send("hi"),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(session.handle(), Err(ClientError::NotConnected)));
    }

    #[test]
    fn close_before_connect_is_terminal() {
        let mut session = RoomSession::join(Some("42a")).unwrap();
        session.close();
        session.close();

        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.transcript().is_empty());
    }
}
