//! A schema-driven decoder for the game protocol carried over TCP port
//! 5555: ingesting an externally-supplied protocol description, framing a
//! byte stream into discrete messages, and recursively decoding each one
//! into a tagged value tree.
//!
//! This crate is purely byte-oriented: it never opens a socket or reads a
//! packet itself. Supplying bytes (from a live capture, a pcap file, or a
//! test fixture) is the caller's job; see the `sniffcap` binary for a
//! capture-and-dispatch frontend built on top of it.

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

pub mod decode;
pub mod dispatch;
pub mod frame;
pub mod schema;
pub mod stream;
pub mod wire;

pub use decode::{decode_message, Decoded, DecodeError, DecodedValue};
pub use dispatch::{Dispatcher, RouteOutcome};
pub use frame::{FrameParser, RawMessage};
pub use schema::{load_from_path, load_from_slice, MessageCatalog, SchemaError, TypeCatalog};
pub use stream::StreamWorker;
pub use wire::{ByteCursor, WireError};

/// Well-known TCP port the protocol is served on.
pub const DEFAULT_PORT: u16 = 5555;
