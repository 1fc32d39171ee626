// src/lib.rs

//! A channel-based Pub/Sub client for SpinelDB and other RESP brokers.
//!
//! ```no_run
//! use futures::StreamExt;
//! use spinel_pubsub::PubSubClient;
//!
//! # async fn run() -> Result<(), spinel_pubsub::PubSubError> {
//! let mut client = PubSubClient::dial("127.0.0.1:6379").await?;
//! let mut publishes = client.take_publishes().expect("stream is taken once");
//! tokio::spawn(async move {
//!     while let Some(publish) = publishes.next().await {
//!         println!("{:?}: {:?}", publish.channel, publish.message_str());
//!     }
//! });
//! client.subscribe(&["news", "alerts"]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod core;

// Re-export
pub use crate::client::PubSubClient;
pub use crate::config::{ClientConfig, DEFAULT_TIMEOUT};
pub use crate::core::{Publish, PubSubError};
