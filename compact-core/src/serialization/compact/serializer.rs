//! Top-level Compact serializer.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CompactError, Result};
use crate::serialization::{ByteOrder, DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};

use super::{
    Compact, CompactReader, DefaultCompactReader, DefaultCompactWriter, GenericRecord,
    SchemaRegistry, SchemaResolver,
};

type ReadFn = fn(&mut dyn CompactReader) -> Result<Box<dyn Any + Send>>;

/// Type-erased deserializer for one compact type, used when the type to
/// decode is only known from the schema in the data.
#[derive(Clone, Copy)]
pub struct CompactRegistration {
    type_name: &'static str,
    type_id: TypeId,
    read: ReadFn,
}

impl CompactRegistration {
    /// Creates the registration of `T`.
    pub fn of<T: Compact + Default>() -> Self {
        Self {
            type_name: T::get_type_name(),
            type_id: TypeId::of::<T>(),
            read: |reader| {
                let mut value = T::default();
                value.read(reader)?;
                Ok(Box::new(value))
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl std::fmt::Debug for CompactRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompactRegistration")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Serializer for Compact format.
///
/// Encoding produces `[i64 schema id][record]`. The schema itself never
/// travels with the data; both sides resolve it through the registry.
///
/// Encoding fails with [`CompactError::SchemaNotReplicated`] until the
/// schema of the value has been replicated, and decoding fails with
/// [`CompactError::SchemaNotFound`] until the schema of the data is known
/// locally. Both are retried by the caller after the schema is sorted out.
#[derive(Debug)]
pub struct CompactSerializer {
    registry: Arc<SchemaRegistry>,
    byte_order: ByteOrder,
    registrations: HashMap<&'static str, CompactRegistration>,
}

impl CompactSerializer {
    /// Creates a big-endian serializer backed by `registry`.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_byte_order(registry, ByteOrder::default())
    }

    pub fn with_byte_order(registry: Arc<SchemaRegistry>, byte_order: ByteOrder) -> Self {
        Self {
            registry,
            byte_order,
            registrations: HashMap::new(),
        }
    }

    /// Registers a type for [`CompactSerializer::deserialize_any`].
    pub fn register(&mut self, registration: CompactRegistration) {
        self.registrations.insert(registration.type_name, registration);
    }

    /// Returns true if a type with the given compact type name is registered.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registrations.contains_key(type_name)
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Serializes a value to bytes.
    pub fn serialize<T: Compact>(&self, value: &T) -> Result<Vec<u8>> {
        let schema = self.registry.schema_for_object(value)?;
        let mut output = ObjectDataOutput::with_byte_order(self.byte_order);
        output.write_long(schema.schema_id())?;
        let mut writer = DefaultCompactWriter::new(&mut output, schema, self.registry.as_ref());
        value.write(&mut writer)?;
        writer.end()?;
        Ok(output.into_bytes())
    }

    /// Deserializes bytes into a value of type `T`.
    ///
    /// Fails with [`CompactError::TypeMismatch`] if the data was written by
    /// another type.
    pub fn deserialize<T: Compact + Default>(&self, data: &[u8]) -> Result<T> {
        let mut reader = self.reader(data)?;
        let actual = reader.schema().type_name();
        if actual != T::get_type_name() {
            return Err(CompactError::TypeMismatch {
                expected: T::get_type_name().to_string(),
                actual: actual.to_string(),
            });
        }
        let mut value = T::default();
        value.read(&mut reader)?;
        Ok(value)
    }

    /// Deserializes bytes into whichever registered type wrote them.
    pub fn deserialize_any(&self, data: &[u8]) -> Result<Box<dyn Any + Send>> {
        let mut reader = self.reader(data)?;
        let type_name = reader.schema().type_name();
        let registration =
            self.registrations
                .get(type_name)
                .ok_or_else(|| CompactError::MissingSerializer {
                    type_name: type_name.to_string(),
                })?;
        (registration.read)(&mut reader)
    }

    /// Decodes bytes into a [`GenericRecord`] without needing the type.
    pub fn to_generic_record(&self, data: &[u8]) -> Result<GenericRecord> {
        let mut reader = self.reader(data)?;
        GenericRecord::read_from(&mut reader)
    }

    fn reader<'a>(&'a self, data: &'a [u8]) -> Result<DefaultCompactReader<'a>> {
        let mut input = ObjectDataInput::with_byte_order(data, self.byte_order);
        let schema_id = input.read_long()?;
        let schema = self.registry.schema_by_id(schema_id)?;
        DefaultCompactReader::new(input, schema, self.registry.as_ref())
    }
}
