//! Core types for Compact serialization: field kinds, schemas, the binary
//! record format and the local schema registry.

pub mod error;
pub mod serialization;

pub use error::{CompactError, Result};
pub use serialization::{
    ByteOrder, Compact, CompactReader, CompactSerializer, CompactWriter, DataInput, DataOutput,
    FieldKind, GenericRecord, ObjectDataInput, ObjectDataOutput, Schema, SchemaRegistry,
};
