use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::handle::SessionHandle;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed")]
    Closed,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Inbound connection events, delivered strictly in transport order.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// One inbound text frame.
    Frame(String),
    /// The connection ended, locally or by the peer. Delivered once.
    Closed,
    /// Transport failure. Delivered once; no frames follow it.
    Error(ConnectionError),
}

/// Items the writer task drains to the socket.
pub(crate) enum Outbound {
    Frame(String),
    Pong(Vec<u8>),
    Close,
}

/// One duplex websocket connection.
///
/// The socket is split on open: a spawned writer task owns the sink and
/// drains an outbound channel, so send capability can be handed out as a
/// cloneable [`SessionHandle`] while the owner polls `next_event`.
pub struct Connection {
    outgoing: mpsc::UnboundedSender<Outbound>,
    incoming: SplitStream<WsStream>,
    terminated: bool,
}

impl Connection {
    /// Connect to a websocket URL. Resolving `Ok` is the open report,
    /// `Err` the error report; exactly one of the two happens.
    pub async fn open(url: &str) -> Result<Self, ConnectionError> {
        let (ws, _response) = connect_async(url)
            .await
            .map_err(ConnectionError::Handshake)?;

        let (sink, stream) = ws.split();
        let (outgoing, rx) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(rx, sink));

        Ok(Self {
            outgoing,
            incoming: stream,
            terminated: false,
        })
    }

    /// Queue a text frame. Fails once the connection is closed.
    pub fn send(&self, frame: &str) -> Result<(), ConnectionError> {
        if self.terminated {
            return Err(ConnectionError::Closed);
        }
        self.outgoing
            .send(Outbound::Frame(frame.to_owned()))
            .map_err(|_| ConnectionError::Closed)
    }

    /// Cloneable send handle over the outbound channel.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.outgoing.clone())
    }

    /// Next inbound event. Pings are answered through the writer; frames
    /// come back in the order the transport delivered them. Returns
    /// `None` forever once a terminal event has been delivered or the
    /// connection was closed locally.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        if self.terminated {
            return None;
        }

        loop {
            match self.incoming.next().await {
                Some(Ok(Message::Text(text))) => return Some(ConnectionEvent::Frame(text)),
                Some(Ok(Message::Ping(payload))) => {
                    let _ = self.outgoing.send(Outbound::Pong(payload));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.terminated = true;
                    tracing::info!("connection closed");
                    return Some(ConnectionEvent::Closed);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.terminated = true;
                    tracing::error!(error = %e, "websocket transport failure");
                    return Some(ConnectionEvent::Error(ConnectionError::Transport(
                        e.to_string(),
                    )));
                }
            }
        }
    }

    /// Close the connection. Idempotent: the writer task breaks on the
    /// first close command, so at most one close frame is ever written,
    /// and no further events are delivered here afterward.
    pub fn close(&mut self) {
        let _ = self.outgoing.send(Outbound::Close);
        self.terminated = true;
    }
}

async fn write_loop<S>(mut rx: mpsc::UnboundedReceiver<Outbound>, mut sink: S)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(item) = rx.recv().await {
        let result = match item {
            Outbound::Frame(text) => sink.send(Message::Text(text)).await,
            Outbound::Pong(payload) => sink.send(Message::Pong(payload)).await,
            Outbound::Close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "websocket send failed");
            break;
        }
    }

    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[derive(Default)]
    struct TestSink {
        sent: Vec<Message>,
    }

    impl Sink<Message> for TestSink {
        type Error = std::convert::Infallible;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
            self.get_mut().sent.push(item);
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn repeated_close_writes_one_close_frame() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Outbound::Frame("hi".into())).unwrap();
        tx.send(Outbound::Close).unwrap();
        tx.send(Outbound::Close).unwrap();
        tx.send(Outbound::Close).unwrap();

        let mut sink = TestSink::default();
        write_loop(rx, &mut sink).await;

        let closes = sink
            .sent
            .iter()
            .filter(|m| matches!(m, Message::Close(_)))
            .count();
        assert_eq!(closes, 1);
        assert!(matches!(&sink.sent[0], Message::Text(text) if text == "hi"));
    }

    #[tokio::test]
    async fn writer_ends_when_all_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel::<Outbound>();
        drop(tx);

        let mut sink = TestSink::default();
        write_loop(rx, &mut sink).await;

        assert!(sink.sent.is_empty());
    }

    #[tokio::test]
    async fn frames_are_written_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        for i in 0..4 {
            tx.send(Outbound::Frame(format!("f{i}"))).unwrap();
        }
        drop(tx);

        let mut sink = TestSink::default();
        write_loop(rx, &mut sink).await;

        let texts: Vec<_> = sink
            .sent
            .iter()
            .filter_map(|m| match m {
                Message::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["f0", "f1", "f2", "f3"]);
    }
}
