// tests/integration/test_helpers.rs

//! Test helpers: a scripted broker that speaks RESP over a real TCP socket.

use futures::{SinkExt, StreamExt};
use spinel_pubsub::core::protocol::{RespFrame, RespFrameCodec};
use spinel_pubsub::{PubSubClient, Publish};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::Framed;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Upper bound for any single step a test waits on.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// A connected client and the broker end of its socket.
pub struct TestContext {
    pub client: PubSubClient,
    pub broker: MockBroker,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_timeout(STEP_TIMEOUT).await
    }

    /// Connects a client whose connect, read and write timeouts are `timeout`.
    pub async fn with_timeout(timeout: Duration) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (client, accepted) =
            tokio::join!(PubSubClient::dial_timeout(&addr, timeout), listener.accept());
        let (socket, _) = accepted.unwrap();

        Self {
            client: client.expect("client failed to connect"),
            broker: MockBroker::new(socket),
        }
    }
}

/// The broker side of a test connection.
pub struct MockBroker {
    framed: Framed<TcpStream, RespFrameCodec>,
}

impl MockBroker {
    pub fn new(socket: TcpStream) -> Self {
        Self {
            framed: Framed::new(socket, RespFrameCodec),
        }
    }

    /// Reads the next command and asserts it equals `expected`.
    pub async fn expect_command(&mut self, expected: &[&str]) {
        let frame = tokio::time::timeout(STEP_TIMEOUT, self.framed.next())
            .await
            .expect("timed out waiting for a command")
            .expect("client closed the connection")
            .expect("client sent an undecodable frame");
        assert_eq!(frame, command_frame(expected));
    }

    /// Asserts the client closes its side without sending anything else.
    pub async fn expect_closed(&mut self) {
        let next = tokio::time::timeout(STEP_TIMEOUT, self.framed.next())
            .await
            .expect("timed out waiting for the client to close");
        assert!(next.is_none(), "expected end of stream, got {:?}", next);
    }

    pub async fn send(&mut self, frame: RespFrame) {
        self.framed.send(frame).await.unwrap();
    }

    /// Sends one `[kind, name, count]` reply per entry.
    pub async fn send_subscription_replies(&mut self, kind: &str, replies: &[(&str, i64)]) {
        for (name, count) in replies {
            self.send(subscription_reply(kind, name, *count)).await;
        }
    }

    pub async fn publish(&mut self, channel: &str, message: &str) {
        self.send(message_frame(channel, message)).await;
    }

    pub async fn pattern_publish(&mut self, pattern: &str, channel: &str, message: &str) {
        self.send(pmessage_frame(pattern, channel, message)).await;
    }

    /// Answers the next command, which must be `PING`, with `PONG`.
    pub async fn answer_ping(&mut self) {
        self.expect_command(&["PING"]).await;
        self.send(RespFrame::SimpleString("PONG".into())).await;
    }
}

pub fn bulk(s: &str) -> RespFrame {
    RespFrame::bulk(s.to_string())
}

pub fn command_frame(parts: &[&str]) -> RespFrame {
    RespFrame::Array(parts.iter().map(|p| bulk(p)).collect())
}

pub fn subscription_reply(kind: &str, name: &str, count: i64) -> RespFrame {
    RespFrame::Array(vec![bulk(kind), bulk(name), RespFrame::Integer(count)])
}

pub fn message_frame(channel: &str, message: &str) -> RespFrame {
    RespFrame::Array(vec![bulk("message"), bulk(channel), bulk(message)])
}

pub fn pmessage_frame(pattern: &str, channel: &str, message: &str) -> RespFrame {
    RespFrame::Array(vec![
        bulk("pmessage"),
        bulk(pattern),
        bulk(channel),
        bulk(message),
    ])
}

/// Waits for the next publish, failing the test if the stream ends or stalls.
pub async fn next_publish(stream: &mut ReceiverStream<Publish>) -> Publish {
    tokio::time::timeout(STEP_TIMEOUT, stream.next())
        .await
        .expect("timed out waiting for a publish")
        .expect("publish stream ended")
}

pub fn publish(channel: &str, message: &str) -> Publish {
    Publish::new(channel.to_string(), message.to_string())
}
