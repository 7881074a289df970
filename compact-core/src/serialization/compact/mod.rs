//! Compact serialization framework for schema-based serialization.
//!
//! User types implement [`Compact`] by writing and reading their fields
//! through the object-safe [`CompactWriter`] and [`CompactReader`] traits.
//! Nested compact values go through the typed helpers of
//! [`CompactWriterExt`] and [`CompactReaderExt`].

mod codec;
mod evolution;
mod field_kind;
mod generic_record;
mod offset_table;
mod rabin;
mod reader;
mod registry;
mod schema;
mod schema_writer;
mod serializer;
mod writer;

use std::any::TypeId;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};

pub use evolution::{SchemaEvolutionResult, SchemaEvolutionValidator};
pub use field_kind::FieldKind;
pub use generic_record::{FieldValue, GenericRecord};
pub use rabin::{schema_fingerprint, RABIN_FINGERPRINT_INIT};
pub use reader::DefaultCompactReader;
pub use registry::{SchemaRegistry, SchemaState};
pub use schema::{FieldDescriptor, Schema};
pub use schema_writer::SchemaWriter;
pub use serializer::{CompactRegistration, CompactSerializer};
pub use writer::DefaultCompactWriter;

/// Trait for types that can be serialized using Compact serialization.
///
/// `write` must write the same set of fields with the same kinds on every
/// call; the schema of the type is derived from it.
pub trait Compact: Send + Sync + 'static {
    /// Returns the type name for this Compact type.
    fn get_type_name() -> &'static str
    where
        Self: Sized;

    /// Writes this object's fields to the given writer.
    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()>;

    /// Reads this object's fields from the given reader.
    fn read(&mut self, reader: &mut dyn CompactReader) -> Result<()>;
}

/// Object-safe view of a [`Compact`] value, used where the concrete type
/// is erased such as nested fields and schema resolution.
pub trait CompactObject: Send + Sync {
    /// Compact type name of the value.
    fn compact_type_name(&self) -> &'static str;

    /// Rust type of the value.
    fn compact_type_id(&self) -> TypeId;

    /// Writes the value's fields.
    fn write_compact_fields(&self, writer: &mut dyn CompactWriter) -> Result<()>;
}

impl<T: Compact> CompactObject for T {
    fn compact_type_name(&self) -> &'static str {
        T::get_type_name()
    }

    fn compact_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn write_compact_fields(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        self.write(writer)
    }
}

/// Supplies schemas to writers and readers of nested compact values.
pub trait SchemaResolver: Send + Sync {
    /// Returns the schema of `value` if it may be written, or
    /// [`CompactError::SchemaNotReplicated`] if it must be replicated first.
    fn schema_for_object(&self, value: &dyn CompactObject) -> Result<Arc<Schema>>;

    /// Returns the schema with the given id, or
    /// [`CompactError::SchemaNotFound`] if it is not known locally.
    fn schema_by_id(&self, schema_id: i64) -> Result<Arc<Schema>>;
}

/// Trait for writing Compact fields during serialization.
pub trait CompactWriter {
    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()>;

    fn write_int8(&mut self, name: &str, value: i8) -> Result<()>;

    fn write_int16(&mut self, name: &str, value: i16) -> Result<()>;

    fn write_int32(&mut self, name: &str, value: i32) -> Result<()>;

    fn write_int64(&mut self, name: &str, value: i64) -> Result<()>;

    fn write_float32(&mut self, name: &str, value: f32) -> Result<()>;

    fn write_float64(&mut self, name: &str, value: f64) -> Result<()>;

    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()>;

    fn write_decimal(&mut self, name: &str, value: Option<Decimal>) -> Result<()>;

    fn write_time(&mut self, name: &str, value: Option<NaiveTime>) -> Result<()>;

    fn write_date(&mut self, name: &str, value: Option<NaiveDate>) -> Result<()>;

    fn write_timestamp(&mut self, name: &str, value: Option<NaiveDateTime>) -> Result<()>;

    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<DateTime<FixedOffset>>,
    ) -> Result<()>;

    /// Writes a nested compact value. See [`CompactWriterExt::write_compact`]
    /// for the typed form.
    fn write_compact_dyn(&mut self, name: &str, value: Option<&dyn CompactObject>) -> Result<()>;

    fn write_array_of_boolean(&mut self, name: &str, value: Option<&[bool]>) -> Result<()>;

    fn write_array_of_int8(&mut self, name: &str, value: Option<&[i8]>) -> Result<()>;

    fn write_array_of_int16(&mut self, name: &str, value: Option<&[i16]>) -> Result<()>;

    fn write_array_of_int32(&mut self, name: &str, value: Option<&[i32]>) -> Result<()>;

    fn write_array_of_int64(&mut self, name: &str, value: Option<&[i64]>) -> Result<()>;

    fn write_array_of_float32(&mut self, name: &str, value: Option<&[f32]>) -> Result<()>;

    fn write_array_of_float64(&mut self, name: &str, value: Option<&[f64]>) -> Result<()>;

    fn write_array_of_string(&mut self, name: &str, value: Option<&[Option<String>]>) -> Result<()>;

    fn write_array_of_decimal(&mut self, name: &str, value: Option<&[Option<Decimal>]>)
        -> Result<()>;

    fn write_array_of_time(&mut self, name: &str, value: Option<&[Option<NaiveTime>]>)
        -> Result<()>;

    fn write_array_of_date(&mut self, name: &str, value: Option<&[Option<NaiveDate>]>)
        -> Result<()>;

    fn write_array_of_timestamp(
        &mut self,
        name: &str,
        value: Option<&[Option<NaiveDateTime>]>,
    ) -> Result<()>;

    fn write_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<&[Option<DateTime<FixedOffset>>]>,
    ) -> Result<()>;

    /// Writes an array of nested compact values. All non-null items must be
    /// of the same type.
    fn write_array_of_compact_dyn(
        &mut self,
        name: &str,
        value: Option<&[Option<&dyn CompactObject>]>,
    ) -> Result<()>;

    fn write_nullable_boolean(&mut self, name: &str, value: Option<bool>) -> Result<()>;

    fn write_nullable_int8(&mut self, name: &str, value: Option<i8>) -> Result<()>;

    fn write_nullable_int16(&mut self, name: &str, value: Option<i16>) -> Result<()>;

    fn write_nullable_int32(&mut self, name: &str, value: Option<i32>) -> Result<()>;

    fn write_nullable_int64(&mut self, name: &str, value: Option<i64>) -> Result<()>;

    fn write_nullable_float32(&mut self, name: &str, value: Option<f32>) -> Result<()>;

    fn write_nullable_float64(&mut self, name: &str, value: Option<f64>) -> Result<()>;

    fn write_array_of_nullable_boolean(
        &mut self,
        name: &str,
        value: Option<&[Option<bool>]>,
    ) -> Result<()>;

    fn write_array_of_nullable_int8(&mut self, name: &str, value: Option<&[Option<i8>]>)
        -> Result<()>;

    fn write_array_of_nullable_int16(
        &mut self,
        name: &str,
        value: Option<&[Option<i16>]>,
    ) -> Result<()>;

    fn write_array_of_nullable_int32(
        &mut self,
        name: &str,
        value: Option<&[Option<i32>]>,
    ) -> Result<()>;

    fn write_array_of_nullable_int64(
        &mut self,
        name: &str,
        value: Option<&[Option<i64>]>,
    ) -> Result<()>;

    fn write_array_of_nullable_float32(
        &mut self,
        name: &str,
        value: Option<&[Option<f32>]>,
    ) -> Result<()>;

    fn write_array_of_nullable_float64(
        &mut self,
        name: &str,
        value: Option<&[Option<f64>]>,
    ) -> Result<()>;
}

/// Typed helpers for writing nested compact values.
pub trait CompactWriterExt: CompactWriter {
    /// Writes a nested compact value.
    fn write_compact<T: Compact>(&mut self, name: &str, value: Option<&T>) -> Result<()> {
        self.write_compact_dyn(name, value.map(|v| v as &dyn CompactObject))
    }

    /// Writes an array of nested compact values.
    fn write_array_of_compact<T: Compact>(
        &mut self,
        name: &str,
        value: Option<&[Option<T>]>,
    ) -> Result<()> {
        match value {
            Some(items) => {
                let items: Vec<Option<&dyn CompactObject>> = items
                    .iter()
                    .map(|item| item.as_ref().map(|v| v as &dyn CompactObject))
                    .collect();
                self.write_array_of_compact_dyn(name, Some(&items))
            }
            None => self.write_array_of_compact_dyn(name, None),
        }
    }
}

impl<W: CompactWriter + ?Sized> CompactWriterExt for W {}

/// Generates `_or_default` accessors that fall back to the given default
/// when the field is absent or stored with a kind the accessor can not read.
macro_rules! or_default_accessors {
    ($($method:ident => $read:ident($kind:expr) -> $ty:ty;)*) => {
        $(
            fn $method(&mut self, name: &str, default: $ty) -> Result<$ty> {
                if self.field_kind(name).is_readable_as($kind) {
                    self.$read(name)
                } else {
                    Ok(default)
                }
            }
        )*
    };
}

/// Trait for reading Compact fields during deserialization.
///
/// Reads are random access: fields can be read in any order, any number of
/// times. A non-nullable accessor can read the nullable variant of its kind
/// and fails with [`CompactError::UnexpectedNull`] if the value is null.
///
/// The `_or_default` accessors return the default only when the field is
/// absent or its kind can not be read by the accessor. A nullable field read
/// through the non-nullable accessor is readable, so a null stored there
/// still fails with `UnexpectedNull`; use the `read_nullable_*` accessor to
/// observe it.
pub trait CompactReader {
    /// Returns the schema the data was written with.
    fn schema(&self) -> &Arc<Schema>;

    /// Returns the kind of the field, or `NotAvailable` if it does not exist.
    fn field_kind(&self, name: &str) -> FieldKind {
        self.schema().field_kind(name)
    }

    fn read_boolean(&mut self, name: &str) -> Result<bool>;

    fn read_int8(&mut self, name: &str) -> Result<i8>;

    fn read_int16(&mut self, name: &str) -> Result<i16>;

    fn read_int32(&mut self, name: &str) -> Result<i32>;

    fn read_int64(&mut self, name: &str) -> Result<i64>;

    fn read_float32(&mut self, name: &str) -> Result<f32>;

    fn read_float64(&mut self, name: &str) -> Result<f64>;

    fn read_string(&mut self, name: &str) -> Result<Option<String>>;

    fn read_decimal(&mut self, name: &str) -> Result<Option<Decimal>>;

    fn read_time(&mut self, name: &str) -> Result<Option<NaiveTime>>;

    fn read_date(&mut self, name: &str) -> Result<Option<NaiveDate>>;

    fn read_timestamp(&mut self, name: &str) -> Result<Option<NaiveDateTime>>;

    fn read_timestamp_with_timezone(&mut self, name: &str)
        -> Result<Option<DateTime<FixedOffset>>>;

    /// Positions a reader on a nested compact value and hands it to `read`.
    /// Returns false without calling `read` when the value is null.
    fn read_compact_with(
        &mut self,
        name: &str,
        read: &mut dyn FnMut(&mut dyn CompactReader) -> Result<()>,
    ) -> Result<bool>;

    fn read_array_of_boolean(&mut self, name: &str) -> Result<Option<Vec<bool>>>;

    fn read_array_of_int8(&mut self, name: &str) -> Result<Option<Vec<i8>>>;

    fn read_array_of_int16(&mut self, name: &str) -> Result<Option<Vec<i16>>>;

    fn read_array_of_int32(&mut self, name: &str) -> Result<Option<Vec<i32>>>;

    fn read_array_of_int64(&mut self, name: &str) -> Result<Option<Vec<i64>>>;

    fn read_array_of_float32(&mut self, name: &str) -> Result<Option<Vec<f32>>>;

    fn read_array_of_float64(&mut self, name: &str) -> Result<Option<Vec<f64>>>;

    fn read_array_of_string(&mut self, name: &str) -> Result<Option<Vec<Option<String>>>>;

    fn read_array_of_decimal(&mut self, name: &str) -> Result<Option<Vec<Option<Decimal>>>>;

    fn read_array_of_time(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveTime>>>>;

    fn read_array_of_date(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveDate>>>>;

    fn read_array_of_timestamp(&mut self, name: &str)
        -> Result<Option<Vec<Option<NaiveDateTime>>>>;

    fn read_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<DateTime<FixedOffset>>>>>;

    /// Hands a reader for every item of a nested compact array to `read`,
    /// or `None` for null items. Returns false when the array is null.
    fn read_array_of_compact_with(
        &mut self,
        name: &str,
        read: &mut dyn FnMut(Option<&mut dyn CompactReader>) -> Result<()>,
    ) -> Result<bool>;

    fn read_nullable_boolean(&mut self, name: &str) -> Result<Option<bool>>;

    fn read_nullable_int8(&mut self, name: &str) -> Result<Option<i8>>;

    fn read_nullable_int16(&mut self, name: &str) -> Result<Option<i16>>;

    fn read_nullable_int32(&mut self, name: &str) -> Result<Option<i32>>;

    fn read_nullable_int64(&mut self, name: &str) -> Result<Option<i64>>;

    fn read_nullable_float32(&mut self, name: &str) -> Result<Option<f32>>;

    fn read_nullable_float64(&mut self, name: &str) -> Result<Option<f64>>;

    fn read_array_of_nullable_boolean(&mut self, name: &str) -> Result<Option<Vec<Option<bool>>>>;

    fn read_array_of_nullable_int8(&mut self, name: &str) -> Result<Option<Vec<Option<i8>>>>;

    fn read_array_of_nullable_int16(&mut self, name: &str) -> Result<Option<Vec<Option<i16>>>>;

    fn read_array_of_nullable_int32(&mut self, name: &str) -> Result<Option<Vec<Option<i32>>>>;

    fn read_array_of_nullable_int64(&mut self, name: &str) -> Result<Option<Vec<Option<i64>>>>;

    fn read_array_of_nullable_float32(&mut self, name: &str) -> Result<Option<Vec<Option<f32>>>>;

    fn read_array_of_nullable_float64(&mut self, name: &str) -> Result<Option<Vec<Option<f64>>>>;

    or_default_accessors! {
        read_boolean_or_default => read_boolean(FieldKind::Boolean) -> bool;
        read_int8_or_default => read_int8(FieldKind::Int8) -> i8;
        read_int16_or_default => read_int16(FieldKind::Int16) -> i16;
        read_int32_or_default => read_int32(FieldKind::Int32) -> i32;
        read_int64_or_default => read_int64(FieldKind::Int64) -> i64;
        read_float32_or_default => read_float32(FieldKind::Float32) -> f32;
        read_float64_or_default => read_float64(FieldKind::Float64) -> f64;
        read_string_or_default => read_string(FieldKind::String) -> Option<String>;
        read_decimal_or_default => read_decimal(FieldKind::Decimal) -> Option<Decimal>;
        read_time_or_default => read_time(FieldKind::Time) -> Option<NaiveTime>;
        read_date_or_default => read_date(FieldKind::Date) -> Option<NaiveDate>;
        read_timestamp_or_default => read_timestamp(FieldKind::Timestamp) -> Option<NaiveDateTime>;
        read_timestamp_with_timezone_or_default =>
            read_timestamp_with_timezone(FieldKind::TimestampWithTimezone)
            -> Option<DateTime<FixedOffset>>;
        read_array_of_boolean_or_default =>
            read_array_of_boolean(FieldKind::ArrayOfBoolean) -> Option<Vec<bool>>;
        read_array_of_int8_or_default =>
            read_array_of_int8(FieldKind::ArrayOfInt8) -> Option<Vec<i8>>;
        read_array_of_int16_or_default =>
            read_array_of_int16(FieldKind::ArrayOfInt16) -> Option<Vec<i16>>;
        read_array_of_int32_or_default =>
            read_array_of_int32(FieldKind::ArrayOfInt32) -> Option<Vec<i32>>;
        read_array_of_int64_or_default =>
            read_array_of_int64(FieldKind::ArrayOfInt64) -> Option<Vec<i64>>;
        read_array_of_float32_or_default =>
            read_array_of_float32(FieldKind::ArrayOfFloat32) -> Option<Vec<f32>>;
        read_array_of_float64_or_default =>
            read_array_of_float64(FieldKind::ArrayOfFloat64) -> Option<Vec<f64>>;
        read_array_of_string_or_default =>
            read_array_of_string(FieldKind::ArrayOfString) -> Option<Vec<Option<String>>>;
        read_array_of_decimal_or_default =>
            read_array_of_decimal(FieldKind::ArrayOfDecimal) -> Option<Vec<Option<Decimal>>>;
        read_array_of_time_or_default =>
            read_array_of_time(FieldKind::ArrayOfTime) -> Option<Vec<Option<NaiveTime>>>;
        read_array_of_date_or_default =>
            read_array_of_date(FieldKind::ArrayOfDate) -> Option<Vec<Option<NaiveDate>>>;
        read_array_of_timestamp_or_default =>
            read_array_of_timestamp(FieldKind::ArrayOfTimestamp)
            -> Option<Vec<Option<NaiveDateTime>>>;
        read_array_of_timestamp_with_timezone_or_default =>
            read_array_of_timestamp_with_timezone(FieldKind::ArrayOfTimestampWithTimezone)
            -> Option<Vec<Option<DateTime<FixedOffset>>>>;
        read_nullable_boolean_or_default =>
            read_nullable_boolean(FieldKind::NullableBoolean) -> Option<bool>;
        read_nullable_int8_or_default => read_nullable_int8(FieldKind::NullableInt8) -> Option<i8>;
        read_nullable_int16_or_default =>
            read_nullable_int16(FieldKind::NullableInt16) -> Option<i16>;
        read_nullable_int32_or_default =>
            read_nullable_int32(FieldKind::NullableInt32) -> Option<i32>;
        read_nullable_int64_or_default =>
            read_nullable_int64(FieldKind::NullableInt64) -> Option<i64>;
        read_nullable_float32_or_default =>
            read_nullable_float32(FieldKind::NullableFloat32) -> Option<f32>;
        read_nullable_float64_or_default =>
            read_nullable_float64(FieldKind::NullableFloat64) -> Option<f64>;
        read_array_of_nullable_boolean_or_default =>
            read_array_of_nullable_boolean(FieldKind::ArrayOfNullableBoolean)
            -> Option<Vec<Option<bool>>>;
        read_array_of_nullable_int8_or_default =>
            read_array_of_nullable_int8(FieldKind::ArrayOfNullableInt8)
            -> Option<Vec<Option<i8>>>;
        read_array_of_nullable_int16_or_default =>
            read_array_of_nullable_int16(FieldKind::ArrayOfNullableInt16)
            -> Option<Vec<Option<i16>>>;
        read_array_of_nullable_int32_or_default =>
            read_array_of_nullable_int32(FieldKind::ArrayOfNullableInt32)
            -> Option<Vec<Option<i32>>>;
        read_array_of_nullable_int64_or_default =>
            read_array_of_nullable_int64(FieldKind::ArrayOfNullableInt64)
            -> Option<Vec<Option<i64>>>;
        read_array_of_nullable_float32_or_default =>
            read_array_of_nullable_float32(FieldKind::ArrayOfNullableFloat32)
            -> Option<Vec<Option<f32>>>;
        read_array_of_nullable_float64_or_default =>
            read_array_of_nullable_float64(FieldKind::ArrayOfNullableFloat64)
            -> Option<Vec<Option<f64>>>;
    }
}

/// Typed helpers for reading nested compact values.
pub trait CompactReaderExt: CompactReader {
    /// Reads a nested compact value of type `T`.
    ///
    /// Fails with [`CompactError::TypeMismatch`] if the nested data was
    /// written by a different type.
    fn read_compact<T: Compact + Default>(&mut self, name: &str) -> Result<Option<T>> {
        let mut value = None;
        self.read_compact_with(name, &mut |reader| {
            value = Some(read_typed::<T>(reader)?);
            Ok(())
        })?;
        Ok(value)
    }

    /// Reads an array of nested compact values of type `T`.
    fn read_array_of_compact<T: Compact + Default>(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<T>>>> {
        let mut items = Vec::new();
        let present = self.read_array_of_compact_with(name, &mut |reader| {
            items.push(reader.map(read_typed::<T>).transpose()?);
            Ok(())
        })?;
        Ok(present.then_some(items))
    }

    fn read_compact_or_default<T: Compact + Default>(
        &mut self,
        name: &str,
        default: Option<T>,
    ) -> Result<Option<T>> {
        if self.field_kind(name) == FieldKind::Compact {
            self.read_compact(name)
        } else {
            Ok(default)
        }
    }

    fn read_array_of_compact_or_default<T: Compact + Default>(
        &mut self,
        name: &str,
        default: Option<Vec<Option<T>>>,
    ) -> Result<Option<Vec<Option<T>>>> {
        if self.field_kind(name) == FieldKind::ArrayOfCompact {
            self.read_array_of_compact(name)
        } else {
            Ok(default)
        }
    }
}

impl<R: CompactReader + ?Sized> CompactReaderExt for R {}

fn read_typed<T: Compact + Default>(reader: &mut dyn CompactReader) -> Result<T> {
    let actual = reader.schema().type_name();
    if actual != T::get_type_name() {
        return Err(CompactError::TypeMismatch {
            expected: T::get_type_name().to_string(),
            actual: actual.to_string(),
        });
    }
    let mut value = T::default();
    value.read(reader)?;
    Ok(value)
}

#[cfg(test)]
pub(crate) mod test_support;
