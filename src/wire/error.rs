//! Errors raised by the primitive readers and the frame parser.

use thiserror::Error;

/// An error encountered while reading primitive values or frame headers off
/// the wire.
#[derive(Error, Debug)]
pub enum WireError {
    /// The cursor ran out of bytes before a value or frame could be fully
    /// read.
    #[error("unexpected end of stream (need {needed} bytes, have {available})")]
    UnexpectedEof {
        /// Bytes required to complete the read.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// A varint did not terminate within its bit budget.
    #[error("varint did not terminate within {max_bytes} bytes at offset {offset}")]
    VarintOverflow {
        /// Maximum number of bytes allowed for this varint kind.
        max_bytes: usize,
        /// Byte offset into the body where the varint started.
        offset: usize,
    },
    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// The result type used throughout the wire-level readers.
pub type Result<T> = std::result::Result<T, WireError>;
