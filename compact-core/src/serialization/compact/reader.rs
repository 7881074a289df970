//! Binary reader for Compact records.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, ObjectDataInput};

use super::codec;
use super::offset_table::OffsetTable;
use super::{CompactReader, FieldDescriptor, FieldKind, Schema, SchemaResolver};

const DATA_LENGTH_SIZE: usize = 4;

/// Fixed-size value types, with their nullable and array kinds.
trait Primitive: Sized {
    const KIND: FieldKind;
    const NULLABLE_KIND: FieldKind;
    const ARRAY_KIND: FieldKind;
    const NULLABLE_ARRAY_KIND: FieldKind;
    const METHOD: &'static str;
    const NULLABLE_METHOD: &'static str;
    const ARRAY_METHOD: &'static str;
    const NULLABLE_ARRAY_METHOD: &'static str;

    fn read_fixed(input: &mut ObjectDataInput<'_>, position: usize, bit_offset: i8)
        -> Result<Self>;

    fn read_value(input: &mut ObjectDataInput<'_>) -> Result<Self>;

    fn read_array(input: &mut ObjectDataInput<'_>) -> Result<Vec<Self>>;
}

impl Primitive for bool {
    const KIND: FieldKind = FieldKind::Boolean;
    const NULLABLE_KIND: FieldKind = FieldKind::NullableBoolean;
    const ARRAY_KIND: FieldKind = FieldKind::ArrayOfBoolean;
    const NULLABLE_ARRAY_KIND: FieldKind = FieldKind::ArrayOfNullableBoolean;
    const METHOD: &'static str = "read_boolean";
    const NULLABLE_METHOD: &'static str = "read_nullable_boolean";
    const ARRAY_METHOD: &'static str = "read_array_of_boolean";
    const NULLABLE_ARRAY_METHOD: &'static str = "read_array_of_nullable_boolean";

    fn read_fixed(input: &mut ObjectDataInput<'_>, position: usize, bit_offset: i8) -> Result<bool> {
        let byte = input.read_byte_at(position)? as u8;
        Ok(byte & (1 << bit_offset) != 0)
    }

    fn read_value(input: &mut ObjectDataInput<'_>) -> Result<bool> {
        input.read_bool()
    }

    fn read_array(input: &mut ObjectDataInput<'_>) -> Result<Vec<bool>> {
        codec::read_boolean_array(input)
    }
}

macro_rules! numeric_primitive {
    ($ty:ty, $suffix:literal, $kind:ident, $nullable:ident, $array:ident, $nullable_array:ident,
     $read:ident, $read_at:ident) => {
        impl Primitive for $ty {
            const KIND: FieldKind = FieldKind::$kind;
            const NULLABLE_KIND: FieldKind = FieldKind::$nullable;
            const ARRAY_KIND: FieldKind = FieldKind::$array;
            const NULLABLE_ARRAY_KIND: FieldKind = FieldKind::$nullable_array;
            const METHOD: &'static str = concat!("read_", $suffix);
            const NULLABLE_METHOD: &'static str = concat!("read_nullable_", $suffix);
            const ARRAY_METHOD: &'static str = concat!("read_array_of_", $suffix);
            const NULLABLE_ARRAY_METHOD: &'static str =
                concat!("read_array_of_nullable_", $suffix);

            fn read_fixed(
                input: &mut ObjectDataInput<'_>,
                position: usize,
                _bit_offset: i8,
            ) -> Result<$ty> {
                input.$read_at(position)
            }

            fn read_value(input: &mut ObjectDataInput<'_>) -> Result<$ty> {
                input.$read()
            }

            fn read_array(input: &mut ObjectDataInput<'_>) -> Result<Vec<$ty>> {
                codec::read_fixed_array(input, ObjectDataInput::$read)
            }
        }
    };
}

numeric_primitive!(i8, "int8", Int8, NullableInt8, ArrayOfInt8, ArrayOfNullableInt8, read_byte, read_byte_at);
numeric_primitive!(i16, "int16", Int16, NullableInt16, ArrayOfInt16, ArrayOfNullableInt16, read_short, read_short_at);
numeric_primitive!(i32, "int32", Int32, NullableInt32, ArrayOfInt32, ArrayOfNullableInt32, read_int, read_int_at);
numeric_primitive!(i64, "int64", Int64, NullableInt64, ArrayOfInt64, ArrayOfNullableInt64, read_long, read_long_at);
numeric_primitive!(f32, "float32", Float32, NullableFloat32, ArrayOfFloat32, ArrayOfNullableFloat32, read_float, read_float_at);
numeric_primitive!(f64, "float64", Float64, NullableFloat64, ArrayOfFloat64, ArrayOfNullableFloat64, read_double, read_double_at);

fn lookup<'s>(schema: &'s Schema, name: &str) -> Result<&'s FieldDescriptor> {
    schema.field(name).ok_or_else(|| CompactError::UnknownField {
        field: name.to_string(),
        type_name: schema.type_name().to_string(),
    })
}

fn mismatch(name: &str, requested: FieldKind, actual: FieldKind) -> CompactError {
    CompactError::FieldKindMismatch {
        field: name.to_string(),
        requested,
        actual,
    }
}

fn unexpected_null(name: &str, method: &'static str, nullable_method: &'static str) -> CompactError {
    CompactError::UnexpectedNull {
        field: name.to_string(),
        method,
        nullable_method,
    }
}

/// Default implementation of `CompactReader`.
///
/// Every read is positional against the schema layout, so fields can be
/// read in any order without decoding the rest of the record.
pub struct DefaultCompactReader<'a> {
    input: ObjectDataInput<'a>,
    schema: Arc<Schema>,
    resolver: &'a dyn SchemaResolver,
    data_start: usize,
    offsets: Option<OffsetTable>,
}

impl<'a> DefaultCompactReader<'a> {
    /// Creates a reader for the record starting at the current position of
    /// `input`, which must have been written with `schema`.
    pub fn new(
        mut input: ObjectDataInput<'a>,
        schema: Arc<Schema>,
        resolver: &'a dyn SchemaResolver,
    ) -> Result<Self> {
        let record_start = input.position();
        let (data_start, offsets) = if schema.var_sized_field_count() == 0 {
            (record_start, None)
        } else {
            let data_length = input.read_int()?;
            let data_start = record_start + DATA_LENGTH_SIZE;
            let table = OffsetTable::after(
                &input,
                data_start,
                data_length,
                schema.var_sized_field_count(),
            )?;
            (data_start, Some(table))
        };
        if data_start + schema.fix_sized_fields_length() > input.len() {
            return Err(CompactError::Serialization(format!(
                "record of type '{}' is truncated",
                schema.type_name()
            )));
        }
        Ok(Self {
            input,
            schema,
            resolver,
            data_start,
            offsets,
        })
    }

    fn fixed_position(&self, field: &FieldDescriptor) -> usize {
        self.data_start + field.offset() as usize
    }

    fn var_position(&mut self, field: &FieldDescriptor) -> Result<Option<usize>> {
        let table = self.offsets.ok_or_else(|| {
            CompactError::Serialization(format!(
                "record of type '{}' has no offset table",
                self.schema.type_name()
            ))
        })?;
        let offset = table.get(&mut self.input, field.index() as usize)?;
        Ok(offset.map(|offset| self.data_start + offset))
    }

    fn read_var<T>(
        &mut self,
        field: &FieldDescriptor,
        decode: impl FnOnce(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.var_position(field)? {
            Some(position) => self.input.read_at(position, decode).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the absolute position of every item of a variable-item array.
    fn item_positions(&mut self, position: usize) -> Result<Vec<Option<usize>>> {
        self.input.read_at(position, |input| {
            let data_length = input.read_int()?;
            let count = codec::read_count(input)?;
            let items_start = input.position();
            let table = OffsetTable::after(input, items_start, data_length, count)?;
            (0..count)
                .map(|i| Ok(table.get(input, i)?.map(|offset| items_start + offset)))
                .collect()
        })
    }

    fn read_var_items<T>(
        &mut self,
        field: &FieldDescriptor,
        decode: fn(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<Vec<Option<T>>>> {
        let Some(position) = self.var_position(field)? else {
            return Ok(None);
        };
        let positions = self.item_positions(position)?;
        positions
            .into_iter()
            .map(|item| {
                item.map(|position| self.input.read_at(position, decode))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn nested_reader(&self, position: usize) -> Result<DefaultCompactReader<'a>> {
        let mut input = ObjectDataInput::with_byte_order(self.input.data(), self.input.byte_order());
        input.set_position(position)?;
        let schema_id = input.read_long()?;
        let schema = self.resolver.schema_by_id(schema_id)?;
        DefaultCompactReader::new(input, schema, self.resolver)
    }

    fn read_primitive<T: Primitive>(&mut self, name: &str) -> Result<T> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        match field.kind() {
            kind if kind == T::KIND => {
                let position = self.fixed_position(field);
                T::read_fixed(&mut self.input, position, field.bit_offset())
            }
            kind if kind == T::NULLABLE_KIND => self
                .read_var(field, T::read_value)?
                .ok_or_else(|| unexpected_null(name, T::METHOD, T::NULLABLE_METHOD)),
            other => Err(mismatch(name, T::KIND, other)),
        }
    }

    fn read_nullable_primitive<T: Primitive>(&mut self, name: &str) -> Result<Option<T>> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        match field.kind() {
            kind if kind == T::KIND => {
                let position = self.fixed_position(field);
                T::read_fixed(&mut self.input, position, field.bit_offset()).map(Some)
            }
            kind if kind == T::NULLABLE_KIND => self.read_var(field, T::read_value),
            other => Err(mismatch(name, T::NULLABLE_KIND, other)),
        }
    }

    fn read_primitive_array<T: Primitive>(&mut self, name: &str) -> Result<Option<Vec<T>>> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        match field.kind() {
            kind if kind == T::ARRAY_KIND => self.read_var(field, T::read_array),
            kind if kind == T::NULLABLE_ARRAY_KIND => {
                let Some(items) = self.read_var_items(field, T::read_value)? else {
                    return Ok(None);
                };
                items
                    .into_iter()
                    .map(|item| {
                        item.ok_or_else(|| {
                            unexpected_null(name, T::ARRAY_METHOD, T::NULLABLE_ARRAY_METHOD)
                        })
                    })
                    .collect::<Result<Vec<T>>>()
                    .map(Some)
            }
            other => Err(mismatch(name, T::ARRAY_KIND, other)),
        }
    }

    fn read_nullable_primitive_array<T: Primitive>(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<T>>>> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        match field.kind() {
            kind if kind == T::ARRAY_KIND => Ok(self
                .read_var(field, T::read_array)?
                .map(|items| items.into_iter().map(Some).collect())),
            kind if kind == T::NULLABLE_ARRAY_KIND => self.read_var_items(field, T::read_value),
            other => Err(mismatch(name, T::NULLABLE_ARRAY_KIND, other)),
        }
    }

    fn read_variable<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        decode: fn(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        if field.kind() != kind {
            return Err(mismatch(name, kind, field.kind()));
        }
        self.read_var(field, decode)
    }

    fn read_variable_array<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        decode: fn(&mut ObjectDataInput<'a>) -> Result<T>,
    ) -> Result<Option<Vec<Option<T>>>> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        if field.kind() != kind {
            return Err(mismatch(name, kind, field.kind()));
        }
        self.read_var_items(field, decode)
    }

    fn compact_position(&mut self, name: &str, kind: FieldKind) -> Result<Option<usize>> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        if field.kind() != kind {
            return Err(mismatch(name, kind, field.kind()));
        }
        self.var_position(field)
    }
}

impl std::fmt::Debug for DefaultCompactReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCompactReader")
            .field("type_name", &self.schema.type_name())
            .field("schema_id", &self.schema.schema_id())
            .field("data_start", &self.data_start)
            .finish()
    }
}

impl CompactReader for DefaultCompactReader<'_> {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn read_boolean(&mut self, name: &str) -> Result<bool> {
        self.read_primitive(name)
    }

    fn read_int8(&mut self, name: &str) -> Result<i8> {
        self.read_primitive(name)
    }

    fn read_int16(&mut self, name: &str) -> Result<i16> {
        self.read_primitive(name)
    }

    fn read_int32(&mut self, name: &str) -> Result<i32> {
        self.read_primitive(name)
    }

    fn read_int64(&mut self, name: &str) -> Result<i64> {
        self.read_primitive(name)
    }

    fn read_float32(&mut self, name: &str) -> Result<f32> {
        self.read_primitive(name)
    }

    fn read_float64(&mut self, name: &str) -> Result<f64> {
        self.read_primitive(name)
    }

    fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        self.read_variable(name, FieldKind::String, ObjectDataInput::read_string)
    }

    fn read_decimal(&mut self, name: &str) -> Result<Option<Decimal>> {
        self.read_variable(name, FieldKind::Decimal, codec::read_decimal)
    }

    fn read_time(&mut self, name: &str) -> Result<Option<NaiveTime>> {
        self.read_variable(name, FieldKind::Time, codec::read_time)
    }

    fn read_date(&mut self, name: &str) -> Result<Option<NaiveDate>> {
        self.read_variable(name, FieldKind::Date, codec::read_date)
    }

    fn read_timestamp(&mut self, name: &str) -> Result<Option<NaiveDateTime>> {
        self.read_variable(name, FieldKind::Timestamp, codec::read_timestamp)
    }

    fn read_timestamp_with_timezone(
        &mut self,
        name: &str,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        self.read_variable(
            name,
            FieldKind::TimestampWithTimezone,
            codec::read_timestamp_with_timezone,
        )
    }

    fn read_compact_with(
        &mut self,
        name: &str,
        read: &mut dyn FnMut(&mut dyn CompactReader) -> Result<()>,
    ) -> Result<bool> {
        let Some(position) = self.compact_position(name, FieldKind::Compact)? else {
            return Ok(false);
        };
        let mut nested = self.nested_reader(position)?;
        read(&mut nested)?;
        Ok(true)
    }

    fn read_array_of_boolean(&mut self, name: &str) -> Result<Option<Vec<bool>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_int8(&mut self, name: &str) -> Result<Option<Vec<i8>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_int16(&mut self, name: &str) -> Result<Option<Vec<i16>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_int32(&mut self, name: &str) -> Result<Option<Vec<i32>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_int64(&mut self, name: &str) -> Result<Option<Vec<i64>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_float32(&mut self, name: &str) -> Result<Option<Vec<f32>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_float64(&mut self, name: &str) -> Result<Option<Vec<f64>>> {
        self.read_primitive_array(name)
    }

    fn read_array_of_string(&mut self, name: &str) -> Result<Option<Vec<Option<String>>>> {
        self.read_variable_array(name, FieldKind::ArrayOfString, ObjectDataInput::read_string)
    }

    fn read_array_of_decimal(&mut self, name: &str) -> Result<Option<Vec<Option<Decimal>>>> {
        self.read_variable_array(name, FieldKind::ArrayOfDecimal, codec::read_decimal)
    }

    fn read_array_of_time(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveTime>>>> {
        self.read_variable_array(name, FieldKind::ArrayOfTime, codec::read_time)
    }

    fn read_array_of_date(&mut self, name: &str) -> Result<Option<Vec<Option<NaiveDate>>>> {
        self.read_variable_array(name, FieldKind::ArrayOfDate, codec::read_date)
    }

    fn read_array_of_timestamp(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<NaiveDateTime>>>> {
        self.read_variable_array(name, FieldKind::ArrayOfTimestamp, codec::read_timestamp)
    }

    fn read_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
    ) -> Result<Option<Vec<Option<DateTime<FixedOffset>>>>> {
        self.read_variable_array(
            name,
            FieldKind::ArrayOfTimestampWithTimezone,
            codec::read_timestamp_with_timezone,
        )
    }

    fn read_array_of_compact_with(
        &mut self,
        name: &str,
        read: &mut dyn FnMut(Option<&mut dyn CompactReader>) -> Result<()>,
    ) -> Result<bool> {
        let Some(position) = self.compact_position(name, FieldKind::ArrayOfCompact)? else {
            return Ok(false);
        };
        for item in self.item_positions(position)? {
            match item {
                Some(position) => {
                    let mut nested = self.nested_reader(position)?;
                    read(Some(&mut nested as &mut dyn CompactReader))?;
                }
                None => read(None)?,
            }
        }
        Ok(true)
    }

    fn read_nullable_boolean(&mut self, name: &str) -> Result<Option<bool>> {
        self.read_nullable_primitive(name)
    }

    fn read_nullable_int8(&mut self, name: &str) -> Result<Option<i8>> {
        self.read_nullable_primitive(name)
    }

    fn read_nullable_int16(&mut self, name: &str) -> Result<Option<i16>> {
        self.read_nullable_primitive(name)
    }

    fn read_nullable_int32(&mut self, name: &str) -> Result<Option<i32>> {
        self.read_nullable_primitive(name)
    }

    fn read_nullable_int64(&mut self, name: &str) -> Result<Option<i64>> {
        self.read_nullable_primitive(name)
    }

    fn read_nullable_float32(&mut self, name: &str) -> Result<Option<f32>> {
        self.read_nullable_primitive(name)
    }

    fn read_nullable_float64(&mut self, name: &str) -> Result<Option<f64>> {
        self.read_nullable_primitive(name)
    }

    fn read_array_of_nullable_boolean(&mut self, name: &str) -> Result<Option<Vec<Option<bool>>>> {
        self.read_nullable_primitive_array(name)
    }

    fn read_array_of_nullable_int8(&mut self, name: &str) -> Result<Option<Vec<Option<i8>>>> {
        self.read_nullable_primitive_array(name)
    }

    fn read_array_of_nullable_int16(&mut self, name: &str) -> Result<Option<Vec<Option<i16>>>> {
        self.read_nullable_primitive_array(name)
    }

    fn read_array_of_nullable_int32(&mut self, name: &str) -> Result<Option<Vec<Option<i32>>>> {
        self.read_nullable_primitive_array(name)
    }

    fn read_array_of_nullable_int64(&mut self, name: &str) -> Result<Option<Vec<Option<i64>>>> {
        self.read_nullable_primitive_array(name)
    }

    fn read_array_of_nullable_float32(&mut self, name: &str) -> Result<Option<Vec<Option<f32>>>> {
        self.read_nullable_primitive_array(name)
    }

    fn read_array_of_nullable_float64(&mut self, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        self.read_nullable_primitive_array(name)
    }
}
