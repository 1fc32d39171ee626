// src/core/protocol/resp_frame.rs

//! The RESP (REdis Serialization Protocol) frame type and its `tokio_util`
//! codec. Broker replies and push notifications are both decoded into
//! `RespFrame`s; outgoing commands are encoded from them.

use crate::core::PubSubError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Limits applied to untrusted input from the broker.
const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024;
const MAX_NESTING_DEPTH: usize = 64;

/// A single decoded RESP value.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

impl RespFrame {
    /// Builds a bulk string frame from anything byte-like.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespFrame::BulkString(data.into())
    }

    /// Returns the frame as text if it is a simple or bulk string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespFrame::SimpleString(s) => Some(s),
            RespFrame::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Returns the raw bytes of a simple or bulk string, whatever their encoding.
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            RespFrame::SimpleString(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
            RespFrame::BulkString(b) => Some(b.clone()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespFrame::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RespFrame]> {
        match self {
            RespFrame::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Encodes the frame into a standalone byte vector.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, PubSubError> {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }
}

/// `tokio_util::codec` implementation for `RespFrame`s.
#[derive(Debug, Default, Clone, Copy)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = PubSubError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => write_line(dst, b'+', s.as_bytes()),
            RespFrame::Error(s) => write_line(dst, b'-', s.as_bytes()),
            RespFrame::Integer(i) => write_line(dst, b':', i.to_string().as_bytes()),
            RespFrame::BulkString(b) => {
                write_line(dst, b'$', b.len().to_string().as_bytes());
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => dst.extend_from_slice(b"$-1\r\n"),
            RespFrame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
            RespFrame::Array(items) => {
                write_line(dst, b'*', items.len().to_string().as_bytes());
                for frame in items {
                    self.encode(frame, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = PubSubError;

    /// Decodes one complete frame, or returns `Ok(None)` and leaves `src`
    /// untouched when more bytes are needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut cursor = &src[..];
        match parse_frame(&mut cursor, 0) {
            Ok(frame) => {
                let consumed = src.len() - cursor.len();
                src.advance(consumed);
                Ok(Some(frame))
            }
            Err(PubSubError::IncompleteData) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn write_line(dst: &mut BytesMut, prefix: u8, body: &[u8]) {
    dst.reserve(1 + body.len() + CRLF_LEN);
    dst.extend_from_slice(&[prefix]);
    dst.extend_from_slice(body);
    dst.extend_from_slice(CRLF);
}

/// Parses a frame starting at `cursor`, advancing it past the consumed bytes.
fn parse_frame(cursor: &mut &[u8], depth: usize) -> Result<RespFrame, PubSubError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(PubSubError::SyntaxError);
    }
    let Some((&prefix, rest)) = cursor.split_first() else {
        return Err(PubSubError::IncompleteData);
    };
    *cursor = rest;

    match prefix {
        b'+' => Ok(RespFrame::SimpleString(read_text_line(cursor)?)),
        b'-' => Ok(RespFrame::Error(read_text_line(cursor)?)),
        b':' => Ok(RespFrame::Integer(read_number(cursor)?)),
        b'$' => parse_bulk_string(cursor),
        b'*' => parse_array(cursor, depth),
        _ => Err(PubSubError::SyntaxError),
    }
}

fn parse_bulk_string(cursor: &mut &[u8]) -> Result<RespFrame, PubSubError> {
    let len = read_number(cursor)?;
    if len == -1 {
        return Ok(RespFrame::Null);
    }
    let len = usize::try_from(len).map_err(|_| PubSubError::SyntaxError)?;
    if len > MAX_BULK_STRING_SIZE {
        return Err(PubSubError::SyntaxError);
    }
    if cursor.len() < len + CRLF_LEN {
        return Err(PubSubError::IncompleteData);
    }
    if &cursor[len..len + CRLF_LEN] != CRLF {
        return Err(PubSubError::SyntaxError);
    }

    let data = Bytes::copy_from_slice(&cursor[..len]);
    *cursor = &cursor[len + CRLF_LEN..];
    Ok(RespFrame::BulkString(data))
}

fn parse_array(cursor: &mut &[u8], depth: usize) -> Result<RespFrame, PubSubError> {
    let len = read_number(cursor)?;
    if len == -1 {
        return Ok(RespFrame::NullArray);
    }
    let len = usize::try_from(len).map_err(|_| PubSubError::SyntaxError)?;
    if len > MAX_FRAME_ELEMENTS {
        return Err(PubSubError::SyntaxError);
    }

    // Capacity is capped so a bogus length cannot force a huge allocation
    // before the elements actually arrive.
    let mut items = Vec::with_capacity(len.min(64));
    for _ in 0..len {
        items.push(parse_frame(cursor, depth + 1)?);
    }
    Ok(RespFrame::Array(items))
}

/// Consumes bytes up to and including the next CRLF, returning the line body.
fn read_line<'a>(cursor: &mut &'a [u8]) -> Result<&'a [u8], PubSubError> {
    let pos = cursor
        .windows(CRLF_LEN)
        .position(|window| window == CRLF)
        .ok_or(PubSubError::IncompleteData)?;
    let line = &cursor[..pos];
    *cursor = &cursor[pos + CRLF_LEN..];
    Ok(line)
}

fn read_text_line(cursor: &mut &[u8]) -> Result<String, PubSubError> {
    read_line(cursor).map(|line| String::from_utf8_lossy(line).into_owned())
}

fn read_number(cursor: &mut &[u8]) -> Result<i64, PubSubError> {
    let line = read_line(cursor)?;
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(PubSubError::SyntaxError)
}
