// src/connection/adapter.rs

//! The read side of a Pub/Sub connection: pulls frames off the wire, drains
//! every reply frame owed by the in-flight command, and tells the driver
//! whether what it got is a reply or a push.

use super::io::FrameReader;
use crate::core::PubSubError;
use crate::core::protocol::RespFrame;
use crate::core::pubsub::{ReplyCountTracker, is_push};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::AsyncRead;
use tracing::trace;

/// A frame read off the connection, tagged with where it must be routed.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The (last) reply frame of the command currently in flight.
    Reply(RespFrame),
    /// An unsolicited push notification.
    Push(RespFrame),
}

/// The contract the multiplexing driver needs from a protocol: produce the
/// next routable frame. Any error returned is fatal to the connection.
#[async_trait]
pub trait FrameProtocol: Send + 'static {
    async fn read<R>(&mut self, reader: &mut FrameReader<R>) -> Result<Inbound, PubSubError>
    where
        R: AsyncRead + Unpin + Send;
}

/// `FrameProtocol` for Pub/Sub connections.
///
/// Each `read` runs a fresh small state machine: await the first frame, then
/// drain the frames still owed for the in-flight command, then return the
/// last one. Pushes that arrive in the middle of a drain are held back and
/// handed out by the following `read` calls, in arrival order. The backlog is
/// bounded by what the broker interleaves into one reply and is empty again
/// before the next frame is read off the wire.
#[derive(Debug)]
pub struct PubSubProtocol {
    tracker: ReplyCountTracker,
    deferred_pushes: VecDeque<RespFrame>,
}

impl PubSubProtocol {
    pub fn new(tracker: ReplyCountTracker) -> Self {
        Self {
            tracker,
            deferred_pushes: VecDeque::new(),
        }
    }
}

#[async_trait]
impl FrameProtocol for PubSubProtocol {
    async fn read<R>(&mut self, reader: &mut FrameReader<R>) -> Result<Inbound, PubSubError>
    where
        R: AsyncRead + Unpin + Send,
    {
        if let Some(push) = self.deferred_pushes.pop_front() {
            return Ok(Inbound::Push(push));
        }

        let first = read_retrying(reader).await?;
        if is_push(&first) {
            return Ok(Inbound::Push(first));
        }

        // The frame just read is one of the owed replies.
        let mut owed = self.tracker.take_or_zero().saturating_sub(1);
        let mut reply = first;
        while owed > 0 {
            // A rejected command is answered with a single error frame.
            if matches!(reply, RespFrame::Error(_)) {
                trace!("Error reply ends the drain with {} frame(s) unclaimed", owed);
                break;
            }
            let frame = read_retrying(reader).await?;
            if is_push(&frame) {
                self.deferred_pushes.push_back(frame);
                continue;
            }
            reply = frame;
            owed -= 1;
        }
        Ok(Inbound::Reply(reply))
    }
}

/// Reads one frame, treating an idle timeout as a reason to keep waiting.
async fn read_retrying<R>(reader: &mut FrameReader<R>) -> Result<RespFrame, PubSubError>
where
    R: AsyncRead + Unpin + Send,
{
    loop {
        match reader.read_frame().await {
            Err(PubSubError::Timeout) => {
                trace!("Read timed out on idle connection; retrying.");
            }
            other => return other,
        }
    }
}
