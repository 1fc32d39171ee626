// src/core/mod.rs

//! Protocol types, Pub/Sub logic and errors shared by the connection layer and
//! the client facade.

pub mod errors;
pub mod protocol;
pub mod pubsub;

pub use errors::PubSubError;
pub use protocol::{Command, CommandKind, RespFrame};
pub use pubsub::Publish;
