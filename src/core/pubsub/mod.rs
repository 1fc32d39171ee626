// src/core/pubsub/mod.rs

//! Client-side Pub/Sub logic: telling pushes from replies, counting owed
//! reply frames, and decoding published messages.

pub mod classifier;
pub mod decoder;
pub mod reply_count;

pub use classifier::{PushKind, is_push, push_kind};
pub use decoder::{Publish, decode_publish, run_publish_decoder, spawn_publish_decoder};
pub use reply_count::{ReplyCountPrimer, ReplyCountTracker, reply_count_slot};
