//! Inheritance-flattened message and type catalogs, keyed by protocol ID.
//!
//! Loading happens in three passes: parse the raw JSON ([`super::raw`]),
//! flatten each object's field list by walking its `super` chain, then
//! resolve every flattened field into a [`super::plan::DecodePlan`] so the
//! decoder never has to look at a type name again.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::error::SchemaError;
use super::plan::{resolve_field, DecodePlan};
use super::raw::{RawDescription, RawField, RawObject};

/// A single field, flattened and ready for decoding.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Identifier for the decoded value.
    pub name: String,
    /// Declared type name: a primitive tag or a composite type's name.
    pub type_name: String,
    /// The derived reader function, e.g. `readVarShort`.
    pub read_func: String,
    /// If true, the field is a sequence of `type_name`.
    pub is_vector: bool,
    /// If true, a 16-bit type ID precedes the value (or each element).
    pub prefixed_by_type_id: bool,
    /// If present, the vector's fixed element count (no wire length prefix).
    pub constant_length: Option<usize>,
}

impl FieldSpec {
    fn from_raw(raw: &RawField) -> Self {
        let read_func = derive_read_func(&raw.write_method);
        FieldSpec {
            name: raw.name.clone(),
            type_name: raw.type_name.clone(),
            read_func,
            is_vector: raw.is_vector,
            prefixed_by_type_id: raw.prefixed_by_type_id,
            constant_length: if raw.constant_length > 0 {
                Some(raw.constant_length as usize)
            } else {
                None
            },
        }
    }
}

/// `writeShort` → `readShort`, mirroring the source's string-slice
/// derivation (`"read" + write_method[5:]`) without panicking on a
/// malformed or absent prefix.
fn derive_read_func(write_method: &str) -> String {
    match write_method.strip_prefix("write") {
        Some(rest) => format!("read{rest}"),
        None => String::new(),
    }
}

/// A fully-resolved message or composite-type schema: its flattened field
/// list and, parallel to it, the precomputed decode plan for each field.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    /// Unique within its catalog.
    pub name: String,
    /// Wire identifier; the key this schema is stored under.
    pub protocol_id: u16,
    /// Flattened fields, inherited-first, in on-wire order.
    pub fields: Vec<FieldSpec>,
    /// Precomputed decode plan, one entry per `fields` at the same index.
    pub plans: Vec<DecodePlan>,
}

/// All top-level dispatchable messages, keyed by protocol ID.
#[derive(Debug, Default)]
pub struct MessageCatalog {
    by_id: HashMap<u16, MessageSchema>,
    by_name: HashMap<String, u16>,
}

impl MessageCatalog {
    /// Looks up a message schema by its wire protocol ID.
    pub fn get(&self, protocol_id: u16) -> Option<&MessageSchema> {
        self.by_id.get(&protocol_id)
    }

    /// Looks up a message's protocol ID by name.
    pub fn protocol_id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Number of message schemas in the catalog.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if the catalog holds no message schemas.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates all message schemas, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &MessageSchema> {
        self.by_id.values()
    }
}

/// All composite types (reusable structures referenced by fields), keyed by
/// protocol ID.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    by_id: HashMap<u16, MessageSchema>,
    by_name: HashMap<String, u16>,
}

impl TypeCatalog {
    /// Looks up a composite type's schema by its wire protocol ID.
    pub fn get(&self, protocol_id: u16) -> Option<&MessageSchema> {
        self.by_id.get(&protocol_id)
    }

    /// Looks up a composite type's protocol ID by name.
    pub fn protocol_id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Number of type schemas in the catalog.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if the catalog holds no type schemas.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates all type schemas, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &MessageSchema> {
        self.by_id.values()
    }
}

/// Loads and resolves a schema file from disk.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<(MessageCatalog, TypeCatalog), SchemaError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_from_slice(&bytes)
}

/// Loads and resolves a schema already held in memory.
pub fn load_from_slice(bytes: &[u8]) -> Result<(MessageCatalog, TypeCatalog), SchemaError> {
    let raw: RawDescription = serde_json::from_slice(bytes)?;

    let type_objects = index_by_name(&raw.types);
    let flattened_types = flatten_all(&raw.types, &type_objects)?;
    let type_name_index = build_name_index(&raw.types)?;

    let message_objects = index_by_name(&raw.messages);
    let flattened_messages = flatten_all(&raw.messages, &message_objects)?;
    // Messages don't resolve composite fields against their own names, but
    // still need the duplicate-protocolID check `build_name_index` performs.
    build_name_index(&raw.messages)?;

    let types = build_catalog::<TypeCatalog>(
        &raw.types,
        &flattened_types,
        &type_name_index,
        |by_id, by_name, schema| {
            by_name.insert(schema.name.clone(), schema.protocol_id);
            by_id.insert(schema.protocol_id, schema);
        },
    )?;

    let messages = build_catalog::<MessageCatalog>(
        &raw.messages,
        &flattened_messages,
        &type_name_index,
        |by_id, by_name, schema| {
            by_name.insert(schema.name.clone(), schema.protocol_id);
            by_id.insert(schema.protocol_id, schema);
        },
    )?;

    Ok((messages, types))
}

fn index_by_name(objects: &[RawObject]) -> HashMap<&str, &RawObject> {
    objects.iter().map(|o| (o.name.as_str(), o)).collect()
}

/// Flattens every object's own fields, ordered by `position`, then prepends
/// its ancestors' flattened fields when `super_serialize` is set. Mirrors
/// the source's `superRecurse`.
fn flatten_all(
    objects: &[RawObject],
    by_name: &HashMap<&str, &RawObject>,
) -> Result<HashMap<String, Vec<RawField>>, SchemaError> {
    let mut out = HashMap::with_capacity(objects.len());
    for object in objects {
        let fields = flatten_one(object, by_name, &mut Vec::new())?;
        out.insert(object.name.clone(), fields);
    }
    Ok(out)
}

fn flatten_one(
    object: &RawObject,
    by_name: &HashMap<&str, &RawObject>,
    visiting: &mut Vec<String>,
) -> Result<Vec<RawField>, SchemaError> {
    if visiting.contains(&object.name) {
        return Err(SchemaError::InheritanceCycle {
            object: object.name.clone(),
        });
    }
    visiting.push(object.name.clone());

    let mut own: Vec<RawField> = object
        .fields
        .iter()
        .filter(|f| f.position != -1)
        .cloned()
        .collect();
    own.sort_by_key(|f| f.position);

    let result = if object.super_serialize && !object.super_name.is_empty() {
        let parent = by_name
            .get(object.super_name.as_str())
            .ok_or_else(|| SchemaError::UnresolvedSuper {
                object: object.name.clone(),
                super_name: object.super_name.clone(),
            })?;
        let mut parent_fields = flatten_one(parent, by_name, visiting)?;
        parent_fields.extend(own);
        Ok(parent_fields)
    } else {
        Ok(own)
    };

    visiting.pop();
    result
}

fn build_name_index(objects: &[RawObject]) -> Result<HashMap<String, u16>, SchemaError> {
    let mut index = HashMap::with_capacity(objects.len());
    let mut seen_ids: HashMap<u16, String> = HashMap::with_capacity(objects.len());
    for object in objects {
        if let Some(first) = seen_ids.get(&object.protocol_id) {
            return Err(SchemaError::DuplicateProtocolId {
                protocol_id: object.protocol_id,
                first: first.clone(),
                second: object.name.clone(),
            });
        }
        seen_ids.insert(object.protocol_id, object.name.clone());
        index.insert(object.name.clone(), object.protocol_id);
    }
    Ok(index)
}

fn build_catalog<C>(
    objects: &[RawObject],
    flattened: &HashMap<String, Vec<RawField>>,
    name_index: &HashMap<String, u16>,
    mut insert: impl FnMut(&mut HashMap<u16, MessageSchema>, &mut HashMap<String, u16>, MessageSchema),
) -> Result<C, SchemaError>
where
    C: CatalogFromParts,
{
    let mut by_id = HashMap::with_capacity(objects.len());
    let mut by_name = HashMap::with_capacity(objects.len());

    for object in objects {
        let raw_fields = &flattened[&object.name];
        let mut fields = Vec::with_capacity(raw_fields.len());
        let mut plans = Vec::with_capacity(raw_fields.len());
        for raw in raw_fields {
            let field = FieldSpec::from_raw(raw);
            let plan = resolve_field(&object.name, &field, name_index)?;
            fields.push(field);
            plans.push(plan);
        }
        let schema = MessageSchema {
            name: object.name.clone(),
            protocol_id: object.protocol_id,
            fields,
            plans,
        };
        insert(&mut by_id, &mut by_name, schema);
    }

    Ok(C::from_parts(by_id, by_name))
}

/// Lets [`build_catalog`] stay generic over [`MessageCatalog`] and
/// [`TypeCatalog`], which are otherwise identical in shape.
trait CatalogFromParts {
    fn from_parts(by_id: HashMap<u16, MessageSchema>, by_name: HashMap<String, u16>) -> Self;
}

impl CatalogFromParts for MessageCatalog {
    fn from_parts(by_id: HashMap<u16, MessageSchema>, by_name: HashMap<String, u16>) -> Self {
        MessageCatalog { by_id, by_name }
    }
}

impl CatalogFromParts for TypeCatalog {
    fn from_parts(by_id: HashMap<u16, MessageSchema>, by_name: HashMap<String, u16>) -> Self {
        TypeCatalog { by_id, by_name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn schema(extra: &str) -> String {
        format!(
            r#"{{
                "messages": [
                    {{
                        "name": "HelloMessage",
                        "protocolID": 1,
                        "fields": [
                            {{"name": "value", "type": "int", "write_method": "writeByte", "position": 0}}
                        ]
                    }}
                ],
                "types": [
                    {{
                        "name": "Base",
                        "protocolID": 100,
                        "fields": [
                            {{"name": "id", "type": "uint", "write_method": "writeShort", "position": 0}}
                        ]
                    }}
                    {extra}
                ]
            }}"#
        )
    }

    #[test]
    fn loads_simple_catalogs() {
        let json = schema("");
        let (messages, types) = load_from_slice(json.as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(types.len(), 1);
        let hello = messages.get(1).unwrap();
        assert_eq!(hello.name, "HelloMessage");
        assert_eq!(hello.fields[0].read_func, "readByte");
    }

    #[test]
    fn flattens_super_chain_before_own_fields() {
        let extra = r#","Derived": "placeholder""#;
        let _ = extra;
        let json = r#"{
            "messages": [],
            "types": [
                {
                    "name": "Base",
                    "protocolID": 100,
                    "fields": [
                        {"name": "id", "type": "uint", "write_method": "writeShort", "position": 0}
                    ]
                },
                {
                    "name": "Derived",
                    "protocolID": 101,
                    "super": "Base",
                    "super_serialize": true,
                    "fields": [
                        {"name": "extra", "type": "Boolean", "write_method": "writeBoolean", "position": 0}
                    ]
                }
            ]
        }"#;
        let (_, types) = load_from_slice(json.as_bytes()).unwrap();
        let derived = types.get(101).unwrap();
        assert_eq!(derived.fields.len(), 2);
        assert_eq!(derived.fields[0].name, "id");
        assert_eq!(derived.fields[1].name, "extra");
    }

    #[test]
    fn fields_with_position_negative_one_are_dropped() {
        let json = r#"{
            "messages": [],
            "types": [
                {
                    "name": "Wrapped",
                    "protocolID": 5,
                    "fields": [
                        {"name": "skip_me", "type": "Boolean", "write_method": "writeBoolean", "position": -1},
                        {"name": "kept", "type": "Boolean", "write_method": "writeBoolean", "position": 0}
                    ]
                }
            ]
        }"#;
        let (_, types) = load_from_slice(json.as_bytes()).unwrap();
        let wrapped = types.get(5).unwrap();
        assert_eq!(wrapped.fields.len(), 1);
        assert_eq!(wrapped.fields[0].name, "kept");
    }

    #[test]
    fn duplicate_protocol_id_is_rejected() {
        let json = r#"{
            "messages": [],
            "types": [
                {"name": "A", "protocolID": 9, "fields": []},
                {"name": "B", "protocolID": 9, "fields": []}
            ]
        }"#;
        let err = load_from_slice(json.as_bytes()).unwrap_err();
        assert_matches!(err, SchemaError::DuplicateProtocolId { .. });
    }

    #[test]
    fn duplicate_protocol_id_among_messages_is_rejected() {
        let json = r#"{
            "messages": [
                {"name": "A", "protocolID": 9, "fields": []},
                {"name": "B", "protocolID": 9, "fields": []}
            ],
            "types": []
        }"#;
        let err = load_from_slice(json.as_bytes()).unwrap_err();
        assert_matches!(err, SchemaError::DuplicateProtocolId { .. });
    }

    #[test]
    fn unresolved_super_is_rejected() {
        let json = r#"{
            "messages": [],
            "types": [
                {
                    "name": "Derived",
                    "protocolID": 1,
                    "super": "Missing",
                    "super_serialize": true,
                    "fields": []
                }
            ]
        }"#;
        let err = load_from_slice(json.as_bytes()).unwrap_err();
        assert_matches!(err, SchemaError::UnresolvedSuper { .. });
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let json = r#"{
            "messages": [],
            "types": [
                {
                    "name": "A",
                    "protocolID": 1,
                    "super": "B",
                    "super_serialize": true,
                    "fields": []
                },
                {
                    "name": "B",
                    "protocolID": 2,
                    "super": "A",
                    "super_serialize": true,
                    "fields": []
                }
            ]
        }"#;
        let err = load_from_slice(json.as_bytes()).unwrap_err();
        assert_matches!(err, SchemaError::InheritanceCycle { .. });
    }

    #[test]
    fn unresolved_field_type_is_rejected() {
        let json = r#"{
            "messages": [
                {
                    "name": "Hello",
                    "protocolID": 1,
                    "fields": [
                        {"name": "thing", "type": "NoSuchType", "write_method": "writeObject", "position": 0}
                    ]
                }
            ],
            "types": []
        }"#;
        let err = load_from_slice(json.as_bytes()).unwrap_err();
        assert_matches!(err, SchemaError::UnresolvedType { .. });
    }

    #[test]
    fn composite_field_resolves_against_type_catalog() {
        let json = r#"{
            "messages": [
                {
                    "name": "Hello",
                    "protocolID": 1,
                    "fields": [
                        {"name": "base", "type": "Base", "write_method": "writeObject", "position": 0}
                    ]
                }
            ],
            "types": [
                {"name": "Base", "protocolID": 100, "fields": []}
            ]
        }"#;
        let (messages, _) = load_from_slice(json.as_bytes()).unwrap();
        let hello = messages.get(1).unwrap();
        assert_matches!(hello.plans[0], DecodePlan::Composite(100));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("schema.json");
        std::fs::write(&file_path, schema("")).unwrap();
        let (messages, _) = load_from_path(&file_path).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = load_from_path("/nonexistent/path/schema.json").unwrap_err();
        assert_matches!(err, SchemaError::Io { .. });
    }
}
