// src/connection/mod.rs

//! The connection layer: frame I/O over a split stream, the Pub/Sub read
//! state machine, and the driver that routes replies and pushes.

mod adapter;
mod driver;
mod io;

pub use adapter::{FrameProtocol, Inbound, PubSubProtocol};
pub use driver::{Multiplexer, PUSH_CHANNEL_CAPACITY};
pub use io::{FrameReader, FrameWriter};
