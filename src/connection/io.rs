// src/connection/io.rs

//! Timeout-aware frame reader and writer over the two halves of a stream.

use crate::core::PubSubError;
use crate::core::protocol::{RespFrame, RespFrameCodec};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};

/// Reads whole `RespFrame`s, reporting an idle timeout as `PubSubError::Timeout`
/// so callers can tell it apart from a broken connection.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: FramedRead<R, RespFrameCodec>,
    timeout: Duration,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self {
            inner: FramedRead::new(reader, RespFrameCodec),
            timeout,
        }
    }

    /// Waits up to the configured timeout for the next frame.
    ///
    /// Partially received frames stay buffered across timeouts, so retrying
    /// after `Timeout` never loses bytes. End of stream maps to
    /// `ConnectionClosed`.
    pub async fn read_frame(&mut self) -> Result<RespFrame, PubSubError> {
        match tokio::time::timeout(self.timeout, self.inner.next()).await {
            Err(_) => Err(PubSubError::Timeout),
            Ok(None) => Err(PubSubError::ConnectionClosed),
            Ok(Some(result)) => result,
        }
    }
}

/// Writes and flushes `RespFrame`s with a per-write timeout.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: FramedWrite<W, RespFrameCodec>,
    timeout: Duration,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W, timeout: Duration) -> Self {
        Self {
            inner: FramedWrite::new(writer, RespFrameCodec),
            timeout,
        }
    }

    pub async fn write_frame(&mut self, frame: RespFrame) -> Result<(), PubSubError> {
        tokio::time::timeout(self.timeout, self.inner.send(frame)).await?
    }

    /// Shuts down the write direction of the underlying stream.
    pub async fn shutdown(&mut self) -> Result<(), PubSubError> {
        self.inner.get_mut().shutdown().await?;
        Ok(())
    }
}
