//! Protocol schema ingestion: parsing the on-disk description, flattening
//! inheritance, and resolving each field into a decode plan.

mod catalog;
mod error;
mod plan;
mod raw;

pub use catalog::{load_from_path, load_from_slice, FieldSpec, MessageCatalog, MessageSchema, TypeCatalog};
pub use error::{Result, SchemaError};
pub use plan::{DecodePlan, LenSpec, PrimitiveKind};

use std::io::{self, Write};

use serde_json::{json, Map, Value};

/// Which on-disk shape [`dump`] should render a catalog into.
///
/// The source's own distillation tool produced two mutually incompatible
/// shapes across its history; this lets either downstream consumer be
/// served from the same in-memory catalog without the loader having to
/// commit to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpShape {
    /// An object keyed by `"0"`, `"1"`, … (string-encoded protocol IDs).
    IndexedMap,
    /// An array of objects, each carrying its fields under `"fields"`.
    FieldsArray,
}

/// Renders a catalog back out as JSON in the requested historical shape,
/// for diagnostics or interop with tools built against the original
/// distillation tool's output.
pub fn dump<W: Write>(
    messages: &MessageCatalog,
    shape: DumpShape,
    mut out: W,
) -> io::Result<()> {
    let value = match shape {
        DumpShape::IndexedMap => {
            let mut map = Map::new();
            for schema in messages.iter() {
                map.insert(schema.protocol_id.to_string(), schema_to_json(schema));
            }
            Value::Object(map)
        }
        DumpShape::FieldsArray => {
            let array: Vec<Value> = messages.iter().map(schema_to_json).collect();
            json!({ "fields": array })
        }
    };
    let rendered = serde_json::to_string_pretty(&value)?;
    out.write_all(rendered.as_bytes())
}

fn schema_to_json(schema: &MessageSchema) -> Value {
    let fields: Vec<Value> = schema
        .fields
        .iter()
        .map(|f| {
            json!({
                "name": f.name,
                "type": f.type_name,
                "isVector": f.is_vector,
                "prefixedByTypeID": f.prefixed_by_type_id,
            })
        })
        .collect();
    json!({
        "name": schema.name,
        "protocolID": schema.protocol_id,
        "fields": fields,
    })
}
