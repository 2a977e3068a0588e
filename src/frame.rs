//! The variable-width frame header that segments a TCP half-stream into
//! discrete application messages.
//!
//! ```text
//! bits 0..13   ProtocolId (14-bit unsigned)
//! bits 14..15  LenSize (2-bit: 0..3)
//! next LenSize bytes  MsgLen (big-endian unsigned, 0..3 bytes)
//! next MsgLen bytes   Body
//! ```

use byteorder::{BigEndian, ByteOrder};

/// A single, fully-framed application message: a protocol ID and its raw,
/// not-yet-decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// 14-bit protocol identifier for the message.
    pub protocol_id: u16,
    /// Exactly `msg_len` bytes of message body.
    pub body: Vec<u8>,
}

/// Incrementally frames raw bytes from one direction of a TCP connection
/// into [`RawMessage`]s.
///
/// Bytes arrive via [`FrameParser::push`] in arbitrary chunk sizes (as
/// reassembled TCP segments arrive); [`FrameParser::next_message`] yields
/// complete messages as soon as enough bytes have accumulated, and
/// otherwise returns `None` without consuming anything, so the caller can
/// push more data and try again.
#[derive(Debug, Default)]
pub struct FrameParser {
    buf: Vec<u8>,
}

impl FrameParser {
    /// Creates an empty frame parser.
    pub fn new() -> Self {
        FrameParser { buf: Vec::new() }
    }

    /// Appends more bytes from the half-stream.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered but not yet consumed into a message.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// True if bytes are buffered that do not yet form a complete frame.
    ///
    /// The caller uses this at end-of-stream to decide whether to report an
    /// [`UnexpectedEof`](super::wire::WireError::UnexpectedEof)-shaped
    /// condition for a truncated trailing frame.
    pub fn has_partial_frame(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Attempts to decode the next complete message out of the buffer.
    ///
    /// Returns `Ok(None)` if not enough bytes have been pushed yet to form a
    /// complete frame; this is not an error, just "come back after the next
    /// push".
    pub fn next_message(&mut self) -> Option<RawMessage> {
        if self.buf.len() < 2 {
            return None;
        }

        let header = BigEndian::read_u16(&self.buf[0..2]);
        let protocol_id = header >> 2;
        let len_size = (header & 0x3) as usize;
        let header_len = 2 + len_size;

        if self.buf.len() < header_len {
            return None;
        }

        let msg_len: u32 = match len_size {
            0 => 0,
            1 => self.buf[2] as u32,
            2 => BigEndian::read_u16(&self.buf[2..4]) as u32,
            3 => {
                ((self.buf[2] as u32) << 16) | ((self.buf[3] as u32) << 8) | (self.buf[4] as u32)
            }
            _ => unreachable!("len_size is a 2-bit field, always 0..=3"),
        };

        let total_len = header_len + msg_len as usize;
        if self.buf.len() < total_len {
            return None;
        }

        let body = self.buf[header_len..total_len].to_vec();
        self.buf.drain(0..total_len);

        Some(RawMessage { protocol_id, body })
    }
}
