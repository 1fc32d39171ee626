// src/core/pubsub/decoder.rs

//! Turns classified push frames into `Publish` records and fans them out to
//! the consumer-facing delivery channel.

use super::classifier::push_kind;
use crate::core::protocol::RespFrame;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Capacity of the delivery channel. A consumer that stops reading stalls
/// push processing for the whole connection.
pub const DELIVERY_CHANNEL_CAPACITY: usize = 1;

/// A message published on a channel this client is subscribed to, either
/// directly or through a pattern.
///
/// Channel and payload are kept as raw bytes; brokers treat both as binary
/// safe, so payloads such as msgpack or protobuf arrive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub channel: Bytes,
    pub message: Bytes,
}

impl Publish {
    pub fn new(channel: impl Into<Bytes>, message: impl Into<Bytes>) -> Self {
        Self {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// The channel name, if it is valid UTF-8.
    pub fn channel_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.channel).ok()
    }

    /// The payload, if it is valid UTF-8.
    pub fn message_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.message).ok()
    }
}

/// Extracts the channel and payload from a push frame.
///
/// Returns `None` for frames that are not pushes or whose channel or payload
/// is missing or not a string. The pattern of a `pmessage` is discarded.
pub fn decode_publish(frame: &RespFrame) -> Option<Publish> {
    let kind = push_kind(frame)?;
    let items = frame.as_array()?;
    Some(Publish {
        channel: items.get(kind.channel_index())?.as_bytes()?,
        message: items.get(kind.payload_index())?.as_bytes()?,
    })
}

/// Runs until `push_rx` closes, then drops `delivery_tx` so consumers observe
/// the end of the stream.
pub async fn run_publish_decoder(
    mut push_rx: mpsc::Receiver<RespFrame>,
    delivery_tx: mpsc::Sender<Publish>,
) {
    let mut consumer_gone = false;
    while let Some(frame) = push_rx.recv().await {
        let Some(publish) = decode_publish(&frame) else {
            debug!("Dropping malformed push frame: {:?}", frame);
            continue;
        };
        if consumer_gone {
            continue;
        }
        if delivery_tx.send(publish).await.is_err() {
            // Keep draining so the connection's read loop never blocks on us.
            debug!("Publish consumer dropped its receiver; discarding further publishes.");
            consumer_gone = true;
        }
    }
    debug!("Push channel closed; closing delivery channel.");
}

/// Spawns the decoder task and returns its handle with the delivery receiver.
pub fn spawn_publish_decoder(
    push_rx: mpsc::Receiver<RespFrame>,
) -> (JoinHandle<()>, mpsc::Receiver<Publish>) {
    let (delivery_tx, delivery_rx) = mpsc::channel(DELIVERY_CHANNEL_CAPACITY);
    let handle = tokio::spawn(run_publish_decoder(push_rx, delivery_tx));
    (handle, delivery_rx)
}
