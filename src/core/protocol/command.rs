// src/core/protocol/command.rs

//! The commands a Pub/Sub client can issue and their wire representation.

use super::RespFrame;
use std::fmt;

/// The commands this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Subscribe,
    Unsubscribe,
    PSubscribe,
    PUnsubscribe,
    Ping,
}

impl CommandKind {
    /// The command name as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Subscribe => "SUBSCRIBE",
            CommandKind::Unsubscribe => "UNSUBSCRIBE",
            CommandKind::PSubscribe => "PSUBSCRIBE",
            CommandKind::PUnsubscribe => "PUNSUBSCRIBE",
            CommandKind::Ping => "PING",
        }
    }

    /// True for commands the broker answers with one reply frame per argument.
    pub fn replies_per_argument(&self) -> bool {
        !matches!(self, CommandKind::Ping)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command ready to be written to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Vec<String>,
}

impl Command {
    pub fn new<I, S>(kind: CommandKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ping() -> Self {
        Self {
            kind: CommandKind::Ping,
            args: Vec::new(),
        }
    }

    /// How many reply frames the broker sends back for this command.
    pub fn expected_replies(&self) -> usize {
        if self.kind.replies_per_argument() {
            self.args.len()
        } else {
            1
        }
    }
}

/// Flattens the command into a RESP array of bulk strings.
impl From<Command> for RespFrame {
    fn from(cmd: Command) -> Self {
        let mut parts = Vec::with_capacity(cmd.args.len() + 1);
        parts.push(RespFrame::bulk(cmd.kind.name()));
        parts.extend(cmd.args.into_iter().map(RespFrame::bulk));
        RespFrame::Array(parts)
    }
}
