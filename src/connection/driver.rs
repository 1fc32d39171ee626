// src/connection/driver.rs

//! A request/response multiplexer for one connection whose inbound stream
//! mixes command replies with unsolicited pushes.
//!
//! Writes happen on the caller's task. A background reader task asks the
//! `FrameProtocol` for the next `Inbound` frame and routes it: replies complete
//! the oldest pending command, pushes go to the push channel.

use super::adapter::{FrameProtocol, Inbound};
use super::io::{FrameReader, FrameWriter};
use crate::core::PubSubError;
use crate::core::protocol::{Command, RespFrame};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Capacity of the channel carrying push frames to their consumer.
pub const PUSH_CHANNEL_CAPACITY: usize = 1;

/// Commands waiting for their reply, oldest first.
///
/// `closed` lives under the same lock so a command can never register after
/// the reader task has failed the queue.
#[derive(Debug, Default)]
struct PendingReplies {
    waiters: VecDeque<oneshot::Sender<RespFrame>>,
    closed: bool,
}

type SharedPending = Arc<Mutex<PendingReplies>>;

/// Closes the connection unless the command it guards ran to completion.
///
/// A `cmd` future dropped between registering its waiter and receiving its
/// reply leaves the reply accounting out of step with the wire, so nothing
/// later on this connection can be trusted.
struct InFlight {
    pending: SharedPending,
    shutdown_tx: broadcast::Sender<()>,
    finished: bool,
}

impl InFlight {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("Command did not complete; closing connection.");
        self.pending.lock().closed = true;
        let _ = self.shutdown_tx.send(());
    }
}

/// Drives a single connection on behalf of a synchronous caller.
///
/// Dropping it drops the shutdown sender, which also stops the reader task.
pub struct Multiplexer<S> {
    writer: FrameWriter<WriteHalf<S>>,
    pending: SharedPending,
    shutdown_tx: broadcast::Sender<()>,
    reader_task: Option<JoinHandle<()>>,
    closed: bool,
}

impl<S> Multiplexer<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Splits `stream`, spawns the reader task and returns the multiplexer with
    /// the receiving end of the push channel.
    pub fn spawn<P: FrameProtocol>(
        stream: S,
        protocol: P,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> (Self, mpsc::Receiver<RespFrame>) {
        let (read_half, write_half) = tokio::io::split(stream);
        let (push_tx, push_rx) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let pending = SharedPending::default();

        let reader = FrameReader::new(read_half, read_timeout);
        let reader_task = tokio::spawn(read_loop(
            protocol,
            reader,
            pending.clone(),
            push_tx,
            shutdown_rx,
        ));

        let mux = Self {
            writer: FrameWriter::new(write_half, write_timeout),
            pending,
            shutdown_tx,
            reader_task: Some(reader_task),
            closed: false,
        };
        (mux, push_rx)
    }

    /// Writes `command` and waits for its reply.
    ///
    /// Only one command may be in flight at a time; `&mut self` enforces it.
    /// Errors from the write are fatal and close the connection, and so is
    /// dropping the returned future before it resolves.
    pub async fn cmd(&mut self, command: Command) -> Result<RespFrame, PubSubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            if self.closed || pending.closed {
                return Err(PubSubError::ConnectionClosed);
            }
            pending.waiters.push_back(reply_tx);
        }

        let in_flight = InFlight {
            pending: self.pending.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
            finished: false,
        };

        debug!("Sending {} with {} argument(s)", command.kind, command.args.len());
        if let Err(e) = self.writer.write_frame(command.into()).await {
            warn!("Write failed, closing connection: {}", e);
            // Dropping `in_flight` unfinished closes the connection.
            return Err(e);
        }

        let reply = reply_rx.await.map_err(|_| PubSubError::ConnectionClosed);
        in_flight.finish();
        reply
    }

    /// True once `close` was called, a command failed or was abandoned, or the
    /// reader task has stopped.
    pub fn is_closed(&self) -> bool {
        self.closed || self.pending.lock().closed
    }

    /// Stops the reader task, waits for it and shuts the write half down.
    /// Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<(), PubSubError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.reader_task.take() {
            handle.await?;
        }

        match self.writer.shutdown().await {
            Ok(()) => Ok(()),
            // The peer may already be gone; the connection is closed either way.
            Err(PubSubError::Io(e)) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Reads until shutdown or a fatal error, then fails every pending command.
/// Dropping `push_tx` on exit closes the push channel.
async fn read_loop<P, R>(
    mut protocol: P,
    mut reader: FrameReader<R>,
    pending: SharedPending,
    push_tx: mpsc::Sender<RespFrame>,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    P: FrameProtocol,
    R: AsyncRead + Unpin + Send,
{
    debug!("Connection reader started.");
    loop {
        let inbound = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                debug!("Connection reader received shutdown signal.");
                break;
            }
            result = protocol.read(&mut reader) => result,
        };

        match inbound {
            Ok(Inbound::Push(frame)) => {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    sent = push_tx.send(frame) => {
                        if sent.is_err() {
                            debug!("Push receiver dropped; discarding push frame.");
                        }
                    }
                }
            }
            Ok(Inbound::Reply(frame)) => {
                let waiter = pending.lock().waiters.pop_front();
                match waiter {
                    Some(waiter) => {
                        if waiter.send(frame).is_err() {
                            debug!("Caller stopped waiting; discarding its reply.");
                        }
                    }
                    None => warn!("Discarding reply with no command waiting for it: {:?}", frame),
                }
            }
            Err(e) => {
                if e == PubSubError::ConnectionClosed {
                    debug!("Connection closed by peer.");
                } else {
                    warn!("Read failed, closing connection: {}", e);
                }
                break;
            }
        }
    }

    let mut pending = pending.lock();
    pending.closed = true;
    pending.waiters.clear();
}
