//! Low-level wire primitives: fixed-width and variable-length integer
//! readers, string decoding, and the shared [`WireError`] type.

mod error;
mod primitive;

pub use error::{Result, WireError};
pub use primitive::ByteCursor;
