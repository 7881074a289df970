//! Error types for Compact serialization.

use std::any::TypeId;
use std::sync::Arc;

use thiserror::Error;

use crate::serialization::compact::{FieldKind, Schema};

/// The main error type for Compact serialization.
#[derive(Debug, Error)]
pub enum CompactError {
    /// The schema derived for a type is not yet known to be replicated on
    /// every cluster member. The caller must replicate it and re-run the
    /// operation that required serialization.
    #[error(
        "schema {} for type '{type_name}' is not replicated to the cluster yet",
        .schema.schema_id()
    )]
    SchemaNotReplicated {
        /// The freshly derived schema.
        schema: Arc<Schema>,
        /// Compact type name of the originating type.
        type_name: String,
        /// Rust type the schema was derived from.
        type_id: TypeId,
    },

    /// A decode needs a schema that is not present locally. The caller must
    /// fetch it from the cluster and retry the decode with the same bytes.
    #[error("schema {schema_id} is not known locally")]
    SchemaNotFound {
        /// Id of the missing schema.
        schema_id: i64,
    },

    /// Replication exhausted its attempt budget without covering every member.
    #[error(
        "schema {schema_id} of type '{type_name}' cannot be replicated in the cluster after \
         {attempts} attempts; the client might be connected to two halves of a cluster \
         that is experiencing a split-brain"
    )]
    SchemaReplicationFailed {
        /// Id of the schema that could not be replicated.
        schema_id: i64,
        /// Compact type name of the schema.
        type_name: String,
        /// Number of send attempts made.
        attempts: u32,
    },

    /// A read referenced a field the schema does not contain.
    #[error("unknown field name '{field}' for schema of type '{type_name}'")]
    UnknownField {
        /// Requested field name.
        field: String,
        /// Type name of the schema.
        type_name: String,
    },

    /// A read requested a kind the stored field cannot be read as.
    #[error("mismatched field types for '{field}': requested {requested}, found {actual}")]
    FieldKindMismatch {
        /// Field name.
        field: String,
        /// Kind implied by the accessor.
        requested: FieldKind,
        /// Kind recorded in the schema.
        actual: FieldKind,
    },

    /// A null value was met by an accessor that cannot represent it.
    #[error(
        "a null value cannot be read via {method} for field '{field}', use {nullable_method} instead"
    )]
    UnexpectedNull {
        /// Field name.
        field: String,
        /// Accessor that was used.
        method: &'static str,
        /// Accessor that can represent the null.
        nullable_method: &'static str,
    },

    /// A writer was asked to write the same field twice.
    #[error("field '{field}' was already written")]
    DuplicateField {
        /// Field name.
        field: String,
    },

    /// A writer was asked to write a field the schema does not declare.
    #[error("field '{field}' of kind {kind} is not declared in the schema of type '{type_name}'")]
    UndeclaredField {
        /// Field name.
        field: String,
        /// Kind that was written.
        kind: FieldKind,
        /// Type name of the schema.
        type_name: String,
    },

    /// Two structurally different schemas share one id.
    #[error("schema id collision for id {schema_id}: '{existing}' vs '{incoming}'")]
    SchemaIdCollision {
        /// The colliding id.
        schema_id: i64,
        /// Type name of the registered schema.
        existing: String,
        /// Type name of the new schema.
        incoming: String,
    },

    /// One user type produced two different schemas.
    #[error(
        "type '{type_name}' is already bound to schema {existing}, refusing schema {incoming}"
    )]
    SchemaTypeConflict {
        /// Compact type name.
        type_name: String,
        /// Id of the registered schema.
        existing: i64,
        /// Id of the new schema.
        incoming: i64,
    },

    /// No serializer is registered for a type name found in the data.
    #[error("no compact serializer is registered for type name '{type_name}'")]
    MissingSerializer {
        /// Type name from the schema.
        type_name: String,
    },

    /// The data holds a different type than the one requested.
    #[error("type mismatch: expected '{expected}', found '{actual}'")]
    TypeMismatch {
        /// Type name requested by the caller.
        expected: String,
        /// Type name stored in the schema.
        actual: String,
    },

    /// Malformed or truncated input and other encoding failures.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration errors (invalid settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failures reported by the cluster invocation layer.
    #[error("connection error: {0}")]
    Connection(String),

    /// The owning client is shutting down.
    #[error("client is shutting down")]
    ClientShutdown,
}

impl CompactError {
    /// Returns true for the two signals that drive schema coordination.
    pub fn is_schema_signal(&self) -> bool {
        matches!(
            self,
            Self::SchemaNotReplicated { .. } | Self::SchemaNotFound { .. }
        )
    }
}

/// A specialized `Result` type for Compact operations.
pub type Result<T> = std::result::Result<T, CompactError>;
