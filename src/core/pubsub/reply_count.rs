// src/core/pubsub/reply_count.rs

//! A single-slot handoff carrying "how many reply frames the next command
//! produces" from the write side to the read side.
//!
//! The write side primes the slot right before sending a subscribe-family
//! command; the read side takes it when the first reply frame of that command
//! arrives. The slot is empty between calls.

use crate::core::PubSubError;
use tokio::sync::mpsc;

/// Creates a connected primer/tracker pair sharing one slot.
pub fn reply_count_slot() -> (ReplyCountPrimer, ReplyCountTracker) {
    let (tx, rx) = mpsc::channel(1);
    (ReplyCountPrimer { tx }, ReplyCountTracker { rx })
}

/// Write half of the slot, held by the client facade.
#[derive(Debug, Clone)]
pub struct ReplyCountPrimer {
    tx: mpsc::Sender<usize>,
}

impl ReplyCountPrimer {
    /// Stores `count` in the slot, waiting if it is still occupied.
    ///
    /// Fails with `ConnectionClosed` once the read side has been dropped.
    pub async fn prime(&self, count: usize) -> Result<(), PubSubError> {
        self.tx
            .send(count)
            .await
            .map_err(|_| PubSubError::ConnectionClosed)
    }
}

/// Read half of the slot, owned by the connection's read path.
#[derive(Debug)]
pub struct ReplyCountTracker {
    rx: mpsc::Receiver<usize>,
}

impl ReplyCountTracker {
    /// Takes the primed count without waiting; 0 when nothing was primed.
    pub fn take_or_zero(&mut self) -> usize {
        self.rx.try_recv().unwrap_or(0)
    }
}
