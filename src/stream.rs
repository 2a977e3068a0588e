//! Per-half-stream worker: turns a channel of reassembled TCP payload
//! chunks into decoded, dispatched messages.
//!
//! One [`StreamWorker`] runs on its own OS thread per TCP half-stream, per
//! the scheduling model: it owns its frame parser and blocks only on its
//! inbound byte-chunk channel and, when routing, on the dispatcher's sink
//! channel.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use log::{debug, error, warn};

use crate::decode::{decode_message, DecodeError};
use crate::dispatch::Dispatcher;
use crate::frame::FrameParser;
use crate::schema::{MessageCatalog, TypeCatalog};
use crate::wire::WireError;

/// Identifies a half-stream for logging, e.g. `"10.0.0.1:54321 -> game-server:5555"`.
pub type StreamLabel = String;

/// Owns one direction's framing and decode state across its lifetime.
#[derive(Debug)]
pub struct StreamWorker {
    label: StreamLabel,
    parser: FrameParser,
    messages: Arc<MessageCatalog>,
    types: Arc<TypeCatalog>,
    dispatcher: Arc<Dispatcher>,
}

impl StreamWorker {
    pub fn new(
        label: StreamLabel,
        messages: Arc<MessageCatalog>,
        types: Arc<TypeCatalog>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        StreamWorker {
            label,
            parser: FrameParser::new(),
            messages,
            types,
            dispatcher,
        }
    }

    /// Drives the worker to completion: reads chunks from `inbound` until
    /// the channel closes, framing, decoding and dispatching messages as
    /// they complete. Returns once the stream ends, logging a warning if a
    /// partial frame was left buffered at close.
    pub fn run(&mut self, inbound: Receiver<Vec<u8>>) {
        for chunk in inbound {
            self.parser.push(&chunk);
            if !self.drain_ready_messages() {
                return;
            }
        }

        if self.parser.has_partial_frame() {
            warn!(
                "{}: stream closed with {} buffered bytes not forming a complete frame",
                self.label,
                self.parser.buffered_len()
            );
        }
    }

    /// Decodes and dispatches every complete frame currently buffered.
    /// Returns `false` if a framing-level failure means this half-stream
    /// must stop (desynchronised byte accounting).
    fn drain_ready_messages(&mut self) -> bool {
        while let Some(raw) = self.parser.next_message() {
            match decode_message(&raw, &self.messages, &self.types) {
                Ok(decoded) => {
                    if decoded.trailing_bytes != 0 {
                        warn!(
                            "{}: {} had {} trailing bytes after decoding",
                            self.label, decoded.name, decoded.trailing_bytes
                        );
                    }
                    self.dispatcher.route(decoded);
                }
                Err(err) if is_stream_fatal(&err) => {
                    error!(
                        "{}: protocolID {} decode failed fatally: {err}; closing stream",
                        self.label, raw.protocol_id
                    );
                    return false;
                }
                Err(err) => {
                    debug!(
                        "{}: dropping protocolID {}: {err}",
                        self.label, raw.protocol_id
                    );
                }
            }
        }
        true
    }
}

/// Framing-level failures desynchronise byte accounting for the rest of the
/// stream and cannot be recovered from by skipping the single message;
/// everything else is contained to the one message.
fn is_stream_fatal(err: &DecodeError) -> bool {
    matches!(
        err,
        DecodeError::Wire(WireError::UnexpectedEof { .. } | WireError::VarintOverflow { .. })
    )
}
