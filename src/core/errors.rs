// src/core/errors.rs

//! Defines the error type shared by every layer of the client.

use std::sync::Arc;
use thiserror::Error;

/// All failures a Pub/Sub client can observe.
///
/// Connection-level variants (`Io`, `ConnectionClosed`, `IncompleteData`,
/// `SyntaxError`) are fatal: once one surfaces from a read or a write the
/// connection is torn down. Reply-level variants (`UnexpectedReply`,
/// `ServerError`) leave the connection usable.
#[derive(Error, Debug)]
pub enum PubSubError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("Syntax error in RESP stream")]
    SyntaxError,

    #[error("Operation timed out")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Server replied with error: {0}")]
    ServerError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

impl PubSubError {
    /// Returns true if the error leaves the connection unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PubSubError::Io(_)
                | PubSubError::IncompleteData
                | PubSubError::SyntaxError
                | PubSubError::ConnectionClosed
        )
    }
}

// `std::io::Error` is not cloneable, hence the `Arc` and the manual impl.
impl Clone for PubSubError {
    fn clone(&self) -> Self {
        match self {
            PubSubError::Io(e) => PubSubError::Io(Arc::clone(e)),
            PubSubError::IncompleteData => PubSubError::IncompleteData,
            PubSubError::SyntaxError => PubSubError::SyntaxError,
            PubSubError::Timeout => PubSubError::Timeout,
            PubSubError::ConnectionClosed => PubSubError::ConnectionClosed,
            PubSubError::WrongArgumentCount(s) => PubSubError::WrongArgumentCount(s.clone()),
            PubSubError::UnexpectedReply(s) => PubSubError::UnexpectedReply(s.clone()),
            PubSubError::ServerError(s) => PubSubError::ServerError(s.clone()),
            PubSubError::InvalidConfig(s) => PubSubError::InvalidConfig(s.clone()),
            PubSubError::Internal(s) => PubSubError::Internal(s.clone()),
        }
    }
}

impl PartialEq for PubSubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PubSubError::Io(e1), PubSubError::Io(e2)) => e1.kind() == e2.kind(),
            (PubSubError::WrongArgumentCount(s1), PubSubError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (PubSubError::UnexpectedReply(s1), PubSubError::UnexpectedReply(s2)) => s1 == s2,
            (PubSubError::ServerError(s1), PubSubError::ServerError(s2)) => s1 == s2,
            (PubSubError::InvalidConfig(s1), PubSubError::InvalidConfig(s2)) => s1 == s2,
            (PubSubError::Internal(s1), PubSubError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for PubSubError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => PubSubError::Timeout,
            _ => PubSubError::Io(Arc::new(e)),
        }
    }
}

impl From<tokio::time::error::Elapsed> for PubSubError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        PubSubError::Timeout
    }
}

impl From<tokio::task::JoinError> for PubSubError {
    fn from(e: tokio::task::JoinError) -> Self {
        PubSubError::Internal(format!("background task failed: {e}"))
    }
}
