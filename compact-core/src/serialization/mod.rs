//! Serialization framework for the Compact binary format.

mod data_input;
mod data_output;
pub mod compact;

pub use compact::{
    Compact, CompactObject, CompactReader, CompactReaderExt, CompactRegistration,
    CompactSerializer, CompactWriter, CompactWriterExt, DefaultCompactReader,
    DefaultCompactWriter, FieldDescriptor, FieldKind, FieldValue, GenericRecord, Schema,
    SchemaEvolutionResult, SchemaEvolutionValidator, SchemaRegistry, SchemaResolver,
    SchemaState, SchemaWriter,
};
pub use data_input::{DataInput, ObjectDataInput};
pub use data_output::{DataOutput, ObjectDataOutput};

/// Byte order of multi-byte values on the wire.
///
/// Big-endian unless a client is configured otherwise; every party that
/// shares data must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}
