//! The field-type resolver: converts a [`FieldSpec`] into a [`DecodePlan`]
//! once, at catalog build time, so the decoder never re-inspects raw type
//! strings while walking message bodies.

use super::catalog::FieldSpec;
use super::error::SchemaError;

/// The concrete wire/result type of a primitive field, fully resolved from
/// its declared `type` and `read_func`.
///
/// Signedness here follows the source protocol's actual resolver rather
/// than the `int`/`uint` declaration: only `readUnsignedInt` and
/// `readInt`/`readVarInt` carry independent signedness; `readByte`,
/// `readShort` and `readVarShort` are unsigned regardless of the field's
/// declared `int`/`uint` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Single byte, zero is false.
    Bool,
    /// Single unsigned byte.
    U8,
    /// Fixed-width 16-bit signed integer. Reserved for forward compatibility
    /// with read functions not exercised by the current schema corpus.
    I16,
    /// Fixed-width 16-bit unsigned integer (`readShort`), or `readVarShort`.
    U16,
    /// Fixed-width 32-bit signed integer (`readInt`).
    I32,
    /// Fixed-width 32-bit unsigned integer (`readUnsignedInt`).
    U32,
    /// Fixed-width 64-bit signed integer. Reserved for forward
    /// compatibility.
    I64,
    /// Fixed-width 64-bit unsigned integer. Reserved for forward
    /// compatibility.
    U64,
    /// Big-endian IEEE-754 double (`readDouble`/`readFloat`).
    F64,
    /// `u16`-length-prefixed UTF-8 string.
    String,
    /// `readVarShort`, decoded via the 7-bit varint algorithm (unsigned).
    VarShort,
    /// `readVarInt`, with the protocol's sign-correction quirk applied.
    VarInt,
    /// `readVarUint` quirk: decode as `VarInt`, reinterpret as unsigned.
    VarUint,
    /// `readVarLong`, no sign correction.
    VarLong,
}

/// How a vector field's element count is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenSpec {
    /// A `u16` length prefix precedes the elements.
    Prefixed16,
    /// The element count is fixed by the schema; no length prefix on the
    /// wire.
    Fixed(usize),
}

/// A fully-resolved decode instruction for one field, derived once from its
/// [`FieldSpec`] at catalog build time.
#[derive(Debug, Clone)]
pub enum DecodePlan {
    /// Read a single primitive value.
    Primitive(PrimitiveKind),
    /// Recursively decode a nested composite using the schema at this
    /// protocol ID in the type catalog.
    Composite(u16),
    /// Read a length (per `LenSpec`) then decode that many elements with
    /// the nested plan.
    Vector(Box<DecodePlan>, LenSpec),
    /// A composite field (or vector element) preceded on the wire by a
    /// `u16` type ID that selects the concrete subtype to decode. The
    /// protocol ID here is the nominal base type, kept only for
    /// diagnostics — the wire's type ID is what actually gets decoded.
    PolymorphicComposite(u16),
}

/// Resolves a single field's [`DecodePlan`], given the name→protocol-ID
/// index for composite type lookups.
///
/// `object_name` and the field's own name are used only to build
/// descriptive errors.
pub fn resolve_field(
    object_name: &str,
    field: &FieldSpec,
    name_index: &std::collections::HashMap<String, u16>,
) -> Result<DecodePlan, SchemaError> {
    let element = resolve_element(object_name, field, name_index)?;

    let element = if field.prefixed_by_type_id {
        match element {
            DecodePlan::Composite(base) => DecodePlan::PolymorphicComposite(base),
            other => other,
        }
    } else {
        element
    };

    Ok(if field.is_vector {
        let length = match field.constant_length {
            Some(n) if n > 0 => LenSpec::Fixed(n),
            _ => LenSpec::Prefixed16,
        };
        DecodePlan::Vector(Box::new(element), length)
    } else {
        element
    })
}

fn resolve_element(
    object_name: &str,
    field: &FieldSpec,
    name_index: &std::collections::HashMap<String, u16>,
) -> Result<DecodePlan, SchemaError> {
    let unsupported = || SchemaError::UnsupportedField {
        object: object_name.to_owned(),
        field: field.name.clone(),
        type_name: field.type_name.clone(),
        read_func: field.read_func.clone(),
    };

    match field.type_name.as_str() {
        "Boolean" => Ok(DecodePlan::Primitive(PrimitiveKind::Bool)),
        "String" => Ok(DecodePlan::Primitive(PrimitiveKind::String)),
        "Number" => match field.read_func.as_str() {
            "readDouble" | "readFloat" => Ok(DecodePlan::Primitive(PrimitiveKind::F64)),
            "readVarLong" => Ok(DecodePlan::Primitive(PrimitiveKind::VarLong)),
            _ => Err(unsupported()),
        },
        "int" | "uint" => match field.read_func.as_str() {
            "readByte" => Ok(DecodePlan::Primitive(PrimitiveKind::U8)),
            "readShort" => Ok(DecodePlan::Primitive(PrimitiveKind::U16)),
            "readVarShort" => Ok(DecodePlan::Primitive(PrimitiveKind::VarShort)),
            "readUnsignedInt" => Ok(DecodePlan::Primitive(PrimitiveKind::U32)),
            "readInt" => Ok(DecodePlan::Primitive(PrimitiveKind::I32)),
            "readVarInt" => Ok(DecodePlan::Primitive(PrimitiveKind::VarInt)),
            _ => Err(unsupported()),
        },
        other => match name_index.get(other) {
            Some(&protocol_id) => Ok(DecodePlan::Composite(protocol_id)),
            None => Err(SchemaError::UnresolvedType {
                object: object_name.to_owned(),
                field: field.name.clone(),
                type_name: other.to_owned(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn field(type_name: &str, read_func: &str) -> FieldSpec {
        FieldSpec {
            name: "f".to_owned(),
            type_name: type_name.to_owned(),
            read_func: read_func.to_owned(),
            is_vector: false,
            prefixed_by_type_id: false,
            constant_length: None,
        }
    }

    #[test]
    fn boolean_maps_to_primitive_bool() {
        let idx = HashMap::new();
        let plan = resolve_field("Obj", &field("Boolean", ""), &idx).unwrap();
        assert!(matches!(plan, DecodePlan::Primitive(PrimitiveKind::Bool)));
    }

    #[test]
    fn read_short_is_unsigned_regardless_of_declared_sign() {
        let idx = HashMap::new();
        let plan = resolve_field("Obj", &field("int", "readShort"), &idx).unwrap();
        assert!(matches!(plan, DecodePlan::Primitive(PrimitiveKind::U16)));
    }

    #[test]
    fn read_var_short_resolves_to_varshort_not_fixed_width() {
        let idx = HashMap::new();
        let plan = resolve_field("Obj", &field("int", "readVarShort"), &idx).unwrap();
        assert!(matches!(plan, DecodePlan::Primitive(PrimitiveKind::VarShort)));
    }

    #[test]
    fn read_var_int_applies_sign_correction_kind() {
        let idx = HashMap::new();
        let plan = resolve_field("Obj", &field("uint", "readVarInt"), &idx).unwrap();
        assert!(matches!(plan, DecodePlan::Primitive(PrimitiveKind::VarInt)));
    }

    #[test]
    fn composite_field_resolves_via_name_index() {
        let mut idx = HashMap::new();
        idx.insert("ThingType".to_owned(), 42u16);
        let plan = resolve_field("Obj", &field("ThingType", ""), &idx).unwrap();
        assert!(matches!(plan, DecodePlan::Composite(42)));
    }

    #[test]
    fn unresolved_composite_type_errors() {
        let idx = HashMap::new();
        let err = resolve_field("Obj", &field("MissingType", ""), &idx).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedType { .. }));
    }

    #[test]
    fn vector_wraps_element_with_prefixed_length() {
        let idx = HashMap::new();
        let mut f = field("Boolean", "");
        f.is_vector = true;
        let plan = resolve_field("Obj", &f, &idx).unwrap();
        match plan {
            DecodePlan::Vector(elem, LenSpec::Prefixed16) => {
                assert!(matches!(*elem, DecodePlan::Primitive(PrimitiveKind::Bool)));
            }
            other => panic!("expected prefixed vector, got {:?}", other),
        }
    }

    #[test]
    fn vector_with_constant_length_is_fixed() {
        let idx = HashMap::new();
        let mut f = field("Boolean", "");
        f.is_vector = true;
        f.constant_length = Some(4);
        let plan = resolve_field("Obj", &f, &idx).unwrap();
        match plan {
            DecodePlan::Vector(_, LenSpec::Fixed(4)) => {}
            other => panic!("expected fixed-length vector, got {:?}", other),
        }
    }

    #[test]
    fn prefixed_by_type_id_wraps_composite_only() {
        let mut idx = HashMap::new();
        idx.insert("BaseThing".to_owned(), 7u16);
        let mut f = field("BaseThing", "");
        f.prefixed_by_type_id = true;
        let plan = resolve_field("Obj", &f, &idx).unwrap();
        assert!(matches!(plan, DecodePlan::PolymorphicComposite(7)));
    }

    #[test]
    fn polymorphic_vector_wraps_element_then_length() {
        let mut idx = HashMap::new();
        idx.insert("BaseThing".to_owned(), 7u16);
        let mut f = field("BaseThing", "");
        f.prefixed_by_type_id = true;
        f.is_vector = true;
        let plan = resolve_field("Obj", &f, &idx).unwrap();
        match plan {
            DecodePlan::Vector(elem, LenSpec::Prefixed16) => {
                assert!(matches!(*elem, DecodePlan::PolymorphicComposite(7)));
            }
            other => panic!("expected polymorphic vector, got {:?}", other),
        }
    }
}
