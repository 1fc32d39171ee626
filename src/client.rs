// src/client.rs

//! The public Pub/Sub client.
//!
//! A `PubSubClient` owns one broker connection. Subscription management and
//! `PING` are synchronous request/reply calls; published messages arrive on a
//! separate stream obtained with [`PubSubClient::take_publishes`], which should
//! be consumed from its own task. A consumer that stops reading stalls every
//! later push on the connection.

use crate::config::{ClientConfig, DEFAULT_TIMEOUT};
use crate::connection::{Multiplexer, PubSubProtocol};
use crate::core::PubSubError;
use crate::core::protocol::{Command, CommandKind, RespFrame};
use crate::core::pubsub::{Publish, ReplyCountPrimer, reply_count_slot, spawn_publish_decoder};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// A Pub/Sub connection to a RESP broker.
///
/// Every method takes `&mut self`, so calls can never overlap: each one
/// finishes, including all of its reply frames, before the next starts.
///
/// Cancelling a call (dropping its future, for instance from
/// `tokio::time::timeout`) after its command may have been written closes the
/// connection: `is_closed` turns true and later calls fail with
/// `ConnectionClosed`. Bound waits with the configured timeouts instead.
pub struct PubSubClient<S = TcpStream> {
    mux: Multiplexer<S>,
    primer: ReplyCountPrimer,
    publishes: Option<mpsc::Receiver<Publish>>,
}

impl PubSubClient<TcpStream> {
    /// Connects to `addr` using `DEFAULT_TIMEOUT`.
    pub async fn dial(addr: &str) -> Result<Self, PubSubError> {
        Self::dial_timeout(addr, DEFAULT_TIMEOUT).await
    }

    /// Connects to `addr`; `timeout` bounds the connect and every read and write.
    pub async fn dial_timeout(addr: &str, timeout: Duration) -> Result<Self, PubSubError> {
        Self::connect(&ClientConfig::new(addr).with_timeout(timeout)).await
    }

    pub async fn connect(config: &ClientConfig) -> Result<Self, PubSubError> {
        validate(config)?;
        let stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect(config.address.as_str()),
        )
        .await??;
        stream.set_nodelay(true)?;
        debug!("Connected to Pub/Sub broker at {}", config.address);
        Self::from_stream(stream, config)
    }
}

impl<S> PubSubClient<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Builds a client over an already established stream. Must be called
    /// from within a Tokio runtime; it spawns the reader and decoder tasks.
    pub fn from_stream(stream: S, config: &ClientConfig) -> Result<Self, PubSubError> {
        validate(config)?;
        let (primer, tracker) = reply_count_slot();
        let (mux, push_rx) = Multiplexer::spawn(
            stream,
            PubSubProtocol::new(tracker),
            config.read_timeout,
            config.write_timeout,
        );
        let (_decoder, publishes) = spawn_publish_decoder(push_rx);

        Ok(Self {
            mux,
            primer,
            publishes: Some(publishes),
        })
    }

    /// Hands out the stream of published messages. Returns `None` after the
    /// first call. The stream ends when the connection closes.
    pub fn take_publishes(&mut self) -> Option<ReceiverStream<Publish>> {
        self.publishes.take().map(ReceiverStream::new)
    }

    /// Subscribes to `channels` and returns the broker's subscription count
    /// after the last one.
    pub async fn subscribe(&mut self, channels: &[&str]) -> Result<i64, PubSubError> {
        self.subscription_command(CommandKind::Subscribe, channels).await
    }

    /// Unsubscribes from `channels`. At least one channel is required: the
    /// broker's "unsubscribe from everything" form is not supported.
    pub async fn unsubscribe(&mut self, channels: &[&str]) -> Result<i64, PubSubError> {
        self.subscription_command(CommandKind::Unsubscribe, channels).await
    }

    pub async fn psubscribe(&mut self, patterns: &[&str]) -> Result<i64, PubSubError> {
        self.subscription_command(CommandKind::PSubscribe, patterns).await
    }

    /// Unsubscribes from `patterns`. At least one pattern is required.
    pub async fn punsubscribe(&mut self, patterns: &[&str]) -> Result<i64, PubSubError> {
        self.subscription_command(CommandKind::PUnsubscribe, patterns).await
    }

    /// Sends `PING`. Fails only when the connection is closed or broken; the
    /// content of the reply is not inspected.
    pub async fn ping(&mut self) -> Result<(), PubSubError> {
        self.mux.cmd(Command::ping()).await.map(|_| ())
    }

    pub fn is_closed(&self) -> bool {
        self.mux.is_closed()
    }

    /// Closes the connection. The publish stream ends once any publish it is
    /// still holding has been read. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<(), PubSubError> {
        debug!("Closing Pub/Sub connection.");
        self.mux.close().await
    }

    async fn subscription_command(
        &mut self,
        kind: CommandKind,
        names: &[&str],
    ) -> Result<i64, PubSubError> {
        if names.is_empty() {
            return Err(PubSubError::WrongArgumentCount(kind.name().to_lowercase()));
        }
        if self.mux.is_closed() {
            return Err(PubSubError::ConnectionClosed);
        }

        let command = Command::new(kind, names.iter().copied());
        self.primer.prime(command.expected_replies()).await?;
        let reply = self.mux.cmd(command).await?;
        subscription_count(kind, reply)
    }
}

fn validate(config: &ClientConfig) -> Result<(), PubSubError> {
    config
        .validate()
        .map_err(|e| PubSubError::InvalidConfig(e.to_string()))
}

/// Reads the running subscription count out of a subscribe-family reply:
/// `[kind, name, count]`.
fn subscription_count(kind: CommandKind, reply: RespFrame) -> Result<i64, PubSubError> {
    match reply {
        RespFrame::Array(items) if items.len() >= 3 => {
            items[2].as_integer().ok_or_else(|| {
                PubSubError::UnexpectedReply(format!(
                    "{kind} reply has a non-integer count: {:?}",
                    items[2]
                ))
            })
        }
        RespFrame::Error(msg) => Err(PubSubError::ServerError(msg)),
        other => Err(PubSubError::UnexpectedReply(format!(
            "{kind} reply: {other:?}"
        ))),
    }
}
