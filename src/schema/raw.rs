//! `serde`-deserialised mirror of the on-disk protocol description.
//!
//! These types are a literal reflection of the JSON shape; no flattening or
//! resolution happens here. [`super::catalog::load_from_slice`] consumes
//! these to build the decode-oriented [`super::catalog::MessageCatalog`] and
//! [`super::catalog::TypeCatalog`].

use serde::Deserialize;

/// Top-level shape of the protocol description file: two arrays of objects,
/// `messages` and `types`.
#[derive(Debug, Deserialize)]
pub struct RawDescription {
    #[serde(default)]
    pub messages: Vec<RawObject>,
    #[serde(default)]
    pub types: Vec<RawObject>,
}

/// A single message or composite type definition, prior to inheritance
/// flattening.
#[derive(Debug, Deserialize)]
pub struct RawObject {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(rename = "protocolID")]
    pub protocol_id: u16,
    #[serde(rename = "super", default)]
    pub super_name: String,
    #[serde(default)]
    pub super_serialize: bool,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

/// A single field within a [`RawObject`], as it appears on disk.
#[derive(Debug, Deserialize, Clone)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub is_vector: bool,
    #[serde(default)]
    pub prefixed_by_type_id: bool,
    #[serde(default)]
    pub constant_length: i64,
    #[serde(default)]
    pub write_method: String,
    /// On-wire position among the object's own fields; `-1` marks a field
    /// that the loader must drop (e.g. a boolean-byte-wrapper slot).
    pub position: i32,
}
