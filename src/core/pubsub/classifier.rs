// src/core/pubsub/classifier.rs

//! Decides whether an inbound frame is a push notification or a command reply.

use crate::core::protocol::RespFrame;

/// Tag of a push for a directly subscribed channel: `[message, channel, payload]`.
pub const MESSAGE_TAG: &str = "message";
/// Tag of a push for a pattern subscription: `[pmessage, pattern, channel, payload]`.
pub const PMESSAGE_TAG: &str = "pmessage";

/// The two kinds of push notification a broker sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Message,
    PMessage,
}

impl PushKind {
    /// Index of the channel name within the push array.
    pub fn channel_index(&self) -> usize {
        match self {
            PushKind::Message => 1,
            PushKind::PMessage => 2,
        }
    }

    /// Index of the payload within the push array.
    pub fn payload_index(&self) -> usize {
        self.channel_index() + 1
    }
}

/// Returns the push kind of `frame`, or `None` for anything that is not an
/// array of at least three elements tagged `message` or `pmessage`.
pub fn push_kind(frame: &RespFrame) -> Option<PushKind> {
    let items = frame.as_array()?;
    if items.len() < 3 {
        return None;
    }
    match items[0].as_str()? {
        MESSAGE_TAG => Some(PushKind::Message),
        PMESSAGE_TAG => Some(PushKind::PMessage),
        _ => None,
    }
}

/// True if `frame` is an unsolicited push rather than a command reply.
pub fn is_push(frame: &RespFrame) -> bool {
    push_kind(frame).is_some()
}
