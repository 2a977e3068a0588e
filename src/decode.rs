//! Schema-driven decoding of a framed message body into a [`DecodedValue`]
//! tree, walking the precomputed [`DecodePlan`] for its schema.

use thiserror::Error;

use crate::frame::RawMessage;
use crate::schema::{DecodePlan, LenSpec, MessageCatalog, MessageSchema, PrimitiveKind, TypeCatalog};
use crate::wire::{ByteCursor, WireError};

/// A tagged value tree produced by the decoder: one leaf variant per
/// primitive kind, plus composites (ordered name→value pairs, preserving
/// on-wire field order) and sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// A `Boolean` field.
    Bool(bool),
    /// A `readByte` field.
    U8(u8),
    /// A fixed-width 16-bit signed field.
    I16(i16),
    /// A `readShort`/`readVarShort` field.
    U16(u16),
    /// A `readInt`/`readVarInt` field.
    I32(i32),
    /// A `readUnsignedInt` field.
    U32(u32),
    /// A fixed-width 64-bit signed field.
    I64(i64),
    /// A `readVarUint`/`readVarLong` field.
    U64(u64),
    /// A `readDouble`/`readFloat` field.
    F64(f64),
    /// A length-prefixed UTF-8 `String` field.
    String(String),
    /// A composite's fields, in declared (inherited-first) order.
    Composite(Vec<(String, DecodedValue)>),
    /// A vector field's elements, in wire order.
    Sequence(Vec<DecodedValue>),
}

/// The result of decoding a single [`RawMessage`]: its value tree, plus any
/// bytes left over after the last declared field was read.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Name of the message schema the body was decoded against.
    pub name: String,
    /// The decoded value tree.
    pub value: DecodedValue,
    /// Non-zero when the body was longer than the schema's fields account
    /// for. Diagnostic only — the decoded prefix above is still valid.
    pub trailing_bytes: usize,
}

/// A failure while decoding a single message. Per the error handling
/// policy, the caller should discard just this message and keep reading
/// the stream, except where noted.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The message's `protocolID` has no entry in the message catalog.
    #[error("no message schema registered for protocolID {protocol_id}")]
    UnknownMessage {
        /// The unrecognised protocol ID.
        protocol_id: u16,
    },
    /// A polymorphic field's wire-carried type ID has no entry in the type
    /// catalog.
    #[error("no type schema registered for type id {type_id}")]
    UnknownTypeId {
        /// The unrecognised type ID.
        type_id: u16,
    },
    /// A primitive read failed (EOF or varint overflow) or a string was
    /// not valid UTF-8.
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Decodes a single raw message against the given catalogs.
pub fn decode_message(
    raw: &RawMessage,
    messages: &MessageCatalog,
    types: &TypeCatalog,
) -> Result<Decoded, DecodeError> {
    let schema = messages
        .get(raw.protocol_id)
        .ok_or(DecodeError::UnknownMessage {
            protocol_id: raw.protocol_id,
        })?;

    let mut cursor = ByteCursor::new(&raw.body);
    let value = decode_composite(schema, &mut cursor, types)?;
    let trailing_bytes = cursor.remaining();

    Ok(Decoded {
        name: schema.name.clone(),
        value,
        trailing_bytes,
    })
}

fn decode_composite(
    schema: &MessageSchema,
    cursor: &mut ByteCursor<'_>,
    types: &TypeCatalog,
) -> Result<DecodedValue, DecodeError> {
    let mut fields = Vec::with_capacity(schema.fields.len());
    for (field, plan) in schema.fields.iter().zip(schema.plans.iter()) {
        let value = decode_plan(plan, cursor, types)?;
        fields.push((field.name.clone(), value));
    }
    Ok(DecodedValue::Composite(fields))
}

fn decode_plan(
    plan: &DecodePlan,
    cursor: &mut ByteCursor<'_>,
    types: &TypeCatalog,
) -> Result<DecodedValue, DecodeError> {
    match plan {
        DecodePlan::Primitive(kind) => decode_primitive(*kind, cursor),
        DecodePlan::Composite(protocol_id) => {
            let schema = lookup_type(types, *protocol_id)?;
            decode_composite(schema, cursor, types)
        }
        DecodePlan::PolymorphicComposite(_) => {
            let type_id = cursor.read_u16()?;
            let schema = lookup_type(types, type_id)?;
            decode_composite(schema, cursor, types)
        }
        DecodePlan::Vector(element, len_spec) => {
            let count = match len_spec {
                LenSpec::Prefixed16 => cursor.read_u16()? as usize,
                LenSpec::Fixed(n) => *n,
            };
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_plan(element, cursor, types)?);
            }
            Ok(DecodedValue::Sequence(items))
        }
    }
}

fn lookup_type(types: &TypeCatalog, type_id: u16) -> Result<&MessageSchema, DecodeError> {
    types.get(type_id).ok_or(DecodeError::UnknownTypeId { type_id })
}

fn decode_primitive(
    kind: PrimitiveKind,
    cursor: &mut ByteCursor<'_>,
) -> Result<DecodedValue, DecodeError> {
    Ok(match kind {
        PrimitiveKind::Bool => DecodedValue::Bool(cursor.read_bool()?),
        PrimitiveKind::U8 => DecodedValue::U8(cursor.read_u8()?),
        PrimitiveKind::I16 => DecodedValue::I16(cursor.read_i16()?),
        PrimitiveKind::U16 => DecodedValue::U16(cursor.read_u16()?),
        PrimitiveKind::I32 => DecodedValue::I32(cursor.read_i32()?),
        PrimitiveKind::U32 => DecodedValue::U32(cursor.read_u32()?),
        PrimitiveKind::I64 => DecodedValue::I64(cursor.read_i64()?),
        PrimitiveKind::U64 => DecodedValue::U64(cursor.read_u64()?),
        PrimitiveKind::F64 => DecodedValue::F64(cursor.read_f64()?),
        PrimitiveKind::String => DecodedValue::String(cursor.read_string()?),
        PrimitiveKind::VarShort => DecodedValue::U16(cursor.read_var_short()?.0),
        PrimitiveKind::VarInt => DecodedValue::I32(cursor.read_var_int()?.0),
        PrimitiveKind::VarUint => DecodedValue::U32(cursor.read_var_uint()?.0),
        PrimitiveKind::VarLong => DecodedValue::U64(cursor.read_var_long()?.0),
    })
}
