//! Derives a schema by running a type's write logic without encoding values.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};

use super::{CompactObject, CompactWriter, FieldDescriptor, FieldKind, Schema};

/// A [`CompactWriter`] that records the name and kind of every field written
/// and ignores the values.
#[derive(Debug)]
pub struct SchemaWriter {
    type_name: String,
    fields: Vec<FieldDescriptor>,
    names: HashSet<String>,
}

impl SchemaWriter {
    /// Creates a new schema writer for the given type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Derives the schema of a compact value.
    pub fn schema_of(value: &dyn CompactObject) -> Result<Schema> {
        let mut writer = Self::new(value.compact_type_name());
        value.write_compact_fields(&mut writer)?;
        writer.build()
    }

    /// Builds the schema from the recorded fields.
    pub fn build(self) -> Result<Schema> {
        Schema::new(self.type_name, self.fields)
    }

    fn add_field(&mut self, name: &str, kind: FieldKind) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            return Err(CompactError::DuplicateField {
                field: name.to_string(),
            });
        }
        self.fields.push(FieldDescriptor::new(name, kind));
        Ok(())
    }
}

impl CompactWriter for SchemaWriter {
    fn write_boolean(&mut self, name: &str, _value: bool) -> Result<()> {
        self.add_field(name, FieldKind::Boolean)
    }

    fn write_int8(&mut self, name: &str, _value: i8) -> Result<()> {
        self.add_field(name, FieldKind::Int8)
    }

    fn write_int16(&mut self, name: &str, _value: i16) -> Result<()> {
        self.add_field(name, FieldKind::Int16)
    }

    fn write_int32(&mut self, name: &str, _value: i32) -> Result<()> {
        self.add_field(name, FieldKind::Int32)
    }

    fn write_int64(&mut self, name: &str, _value: i64) -> Result<()> {
        self.add_field(name, FieldKind::Int64)
    }

    fn write_float32(&mut self, name: &str, _value: f32) -> Result<()> {
        self.add_field(name, FieldKind::Float32)
    }

    fn write_float64(&mut self, name: &str, _value: f64) -> Result<()> {
        self.add_field(name, FieldKind::Float64)
    }

    fn write_string(&mut self, name: &str, _value: Option<&str>) -> Result<()> {
        self.add_field(name, FieldKind::String)
    }

    fn write_decimal(&mut self, name: &str, _value: Option<Decimal>) -> Result<()> {
        self.add_field(name, FieldKind::Decimal)
    }

    fn write_time(&mut self, name: &str, _value: Option<NaiveTime>) -> Result<()> {
        self.add_field(name, FieldKind::Time)
    }

    fn write_date(&mut self, name: &str, _value: Option<NaiveDate>) -> Result<()> {
        self.add_field(name, FieldKind::Date)
    }

    fn write_timestamp(&mut self, name: &str, _value: Option<NaiveDateTime>) -> Result<()> {
        self.add_field(name, FieldKind::Timestamp)
    }

    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        _value: Option<DateTime<FixedOffset>>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::TimestampWithTimezone)
    }

    fn write_compact_dyn(&mut self, name: &str, _value: Option<&dyn CompactObject>) -> Result<()> {
        self.add_field(name, FieldKind::Compact)
    }

    fn write_array_of_boolean(&mut self, name: &str, _value: Option<&[bool]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfBoolean)
    }

    fn write_array_of_int8(&mut self, name: &str, _value: Option<&[i8]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt8)
    }

    fn write_array_of_int16(&mut self, name: &str, _value: Option<&[i16]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt16)
    }

    fn write_array_of_int32(&mut self, name: &str, _value: Option<&[i32]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt32)
    }

    fn write_array_of_int64(&mut self, name: &str, _value: Option<&[i64]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfInt64)
    }

    fn write_array_of_float32(&mut self, name: &str, _value: Option<&[f32]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfFloat32)
    }

    fn write_array_of_float64(&mut self, name: &str, _value: Option<&[f64]>) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfFloat64)
    }

    fn write_array_of_string(
        &mut self,
        name: &str,
        _value: Option<&[Option<String>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfString)
    }

    fn write_array_of_decimal(
        &mut self,
        name: &str,
        _value: Option<&[Option<Decimal>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfDecimal)
    }

    fn write_array_of_time(
        &mut self,
        name: &str,
        _value: Option<&[Option<NaiveTime>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfTime)
    }

    fn write_array_of_date(
        &mut self,
        name: &str,
        _value: Option<&[Option<NaiveDate>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfDate)
    }

    fn write_array_of_timestamp(
        &mut self,
        name: &str,
        _value: Option<&[Option<NaiveDateTime>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfTimestamp)
    }

    fn write_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
        _value: Option<&[Option<DateTime<FixedOffset>>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfTimestampWithTimezone)
    }

    fn write_array_of_compact_dyn(
        &mut self,
        name: &str,
        _value: Option<&[Option<&dyn CompactObject>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfCompact)
    }

    fn write_nullable_boolean(&mut self, name: &str, _value: Option<bool>) -> Result<()> {
        self.add_field(name, FieldKind::NullableBoolean)
    }

    fn write_nullable_int8(&mut self, name: &str, _value: Option<i8>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt8)
    }

    fn write_nullable_int16(&mut self, name: &str, _value: Option<i16>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt16)
    }

    fn write_nullable_int32(&mut self, name: &str, _value: Option<i32>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt32)
    }

    fn write_nullable_int64(&mut self, name: &str, _value: Option<i64>) -> Result<()> {
        self.add_field(name, FieldKind::NullableInt64)
    }

    fn write_nullable_float32(&mut self, name: &str, _value: Option<f32>) -> Result<()> {
        self.add_field(name, FieldKind::NullableFloat32)
    }

    fn write_nullable_float64(&mut self, name: &str, _value: Option<f64>) -> Result<()> {
        self.add_field(name, FieldKind::NullableFloat64)
    }

    fn write_array_of_nullable_boolean(
        &mut self,
        name: &str,
        _value: Option<&[Option<bool>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableBoolean)
    }

    fn write_array_of_nullable_int8(
        &mut self,
        name: &str,
        _value: Option<&[Option<i8>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableInt8)
    }

    fn write_array_of_nullable_int16(
        &mut self,
        name: &str,
        _value: Option<&[Option<i16>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableInt16)
    }

    fn write_array_of_nullable_int32(
        &mut self,
        name: &str,
        _value: Option<&[Option<i32>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableInt32)
    }

    fn write_array_of_nullable_int64(
        &mut self,
        name: &str,
        _value: Option<&[Option<i64>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableInt64)
    }

    fn write_array_of_nullable_float32(
        &mut self,
        name: &str,
        _value: Option<&[Option<f32>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableFloat32)
    }

    fn write_array_of_nullable_float64(
        &mut self,
        name: &str,
        _value: Option<&[Option<f64>]>,
    ) -> Result<()> {
        self.add_field(name, FieldKind::ArrayOfNullableFloat64)
    }
}
