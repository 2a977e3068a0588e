//! Errors raised while loading and resolving a protocol schema.

use thiserror::Error;

/// A fatal error encountered while loading or resolving a protocol schema.
///
/// All variants are fatal at startup: the process should not begin
/// capturing traffic with a schema that failed to load.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file could not be read from disk.
    #[error("failed to read schema file {path}: {source}")]
    Io {
        /// Path that failed to open or read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The schema JSON did not match the expected shape.
    #[error("malformed schema JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Two objects in the same catalog (messages or types) declared the
    /// same `protocolID`.
    #[error("duplicate protocolID {protocol_id} between {first:?} and {second:?}")]
    DuplicateProtocolId {
        /// The colliding protocol ID.
        protocol_id: u16,
        /// Name of the object that first claimed it.
        first: String,
        /// Name of the object that collided with it.
        second: String,
    },
    /// A field's `type` referenced a composite type that does not exist in
    /// the type catalog.
    #[error("field {field} of {object} references unresolved type {type_name:?}")]
    UnresolvedType {
        /// Name of the object containing the offending field.
        object: String,
        /// Name of the offending field.
        field: String,
        /// The type name that could not be resolved.
        type_name: String,
    },
    /// An object's `super` named an object that does not exist in the same
    /// catalog.
    #[error("{object} declares super {super_name:?}, which does not exist")]
    UnresolvedSuper {
        /// Name of the object with the dangling `super`.
        object: String,
        /// The unresolved parent name.
        super_name: String,
    },
    /// Following `super` links from an object eventually reaches itself.
    #[error("inheritance cycle detected starting at {object}")]
    InheritanceCycle {
        /// Name of the object where the cycle was first observed.
        object: String,
    },
    /// A field's `(type, write_method)` combination has no corresponding
    /// decode plan.
    #[error("unsupported field {field} of {object}: type={type_name:?} read_func={read_func:?}")]
    UnsupportedField {
        /// Name of the object containing the offending field.
        object: String,
        /// Name of the offending field.
        field: String,
        /// The field's declared type name.
        type_name: String,
        /// The derived reader function name.
        read_func: String,
    },
}

/// The result type used throughout schema loading.
pub type Result<T> = std::result::Result<T, SchemaError>;
