//! GenericRecord for schema-driven access to Compact data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};

use super::{CompactReader, FieldDescriptor, FieldKind, Schema};

macro_rules! field_values {
    ($($variant:ident($ty:ty) => $read:ident;)*) => {
        /// A decoded field value, one variant per supported field kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum FieldValue {
            $($variant($ty),)*
            Compact(Option<GenericRecord>),
            ArrayOfCompact(Option<Vec<Option<GenericRecord>>>),
        }

        impl FieldValue {
            /// Returns the kind of the value.
            pub fn kind(&self) -> FieldKind {
                match self {
                    $(Self::$variant(_) => FieldKind::$variant,)*
                    Self::Compact(_) => FieldKind::Compact,
                    Self::ArrayOfCompact(_) => FieldKind::ArrayOfCompact,
                }
            }

            fn read(reader: &mut dyn CompactReader, field: &FieldDescriptor) -> Result<Self> {
                let name = field.name();
                match field.kind() {
                    $(FieldKind::$variant => reader.$read(name).map(Self::$variant),)*
                    FieldKind::Compact => {
                        let mut nested = None;
                        reader.read_compact_with(name, &mut |r| {
                            nested = Some(GenericRecord::read_from(r)?);
                            Ok(())
                        })?;
                        Ok(Self::Compact(nested))
                    }
                    FieldKind::ArrayOfCompact => {
                        let mut items = Vec::new();
                        let present = reader.read_array_of_compact_with(name, &mut |r| {
                            items.push(r.map(GenericRecord::read_from).transpose()?);
                            Ok(())
                        })?;
                        Ok(Self::ArrayOfCompact(present.then_some(items)))
                    }
                    other => Err(CompactError::Serialization(format!(
                        "field '{}' has unsupported kind {}",
                        name, other
                    ))),
                }
            }
        }
    };
}

field_values! {
    Boolean(bool) => read_boolean;
    Int8(i8) => read_int8;
    Int16(i16) => read_int16;
    Int32(i32) => read_int32;
    Int64(i64) => read_int64;
    Float32(f32) => read_float32;
    Float64(f64) => read_float64;
    String(Option<String>) => read_string;
    Decimal(Option<Decimal>) => read_decimal;
    Time(Option<NaiveTime>) => read_time;
    Date(Option<NaiveDate>) => read_date;
    Timestamp(Option<NaiveDateTime>) => read_timestamp;
    TimestampWithTimezone(Option<DateTime<FixedOffset>>) => read_timestamp_with_timezone;
    ArrayOfBoolean(Option<Vec<bool>>) => read_array_of_boolean;
    ArrayOfInt8(Option<Vec<i8>>) => read_array_of_int8;
    ArrayOfInt16(Option<Vec<i16>>) => read_array_of_int16;
    ArrayOfInt32(Option<Vec<i32>>) => read_array_of_int32;
    ArrayOfInt64(Option<Vec<i64>>) => read_array_of_int64;
    ArrayOfFloat32(Option<Vec<f32>>) => read_array_of_float32;
    ArrayOfFloat64(Option<Vec<f64>>) => read_array_of_float64;
    ArrayOfString(Option<Vec<Option<String>>>) => read_array_of_string;
    ArrayOfDecimal(Option<Vec<Option<Decimal>>>) => read_array_of_decimal;
    ArrayOfTime(Option<Vec<Option<NaiveTime>>>) => read_array_of_time;
    ArrayOfDate(Option<Vec<Option<NaiveDate>>>) => read_array_of_date;
    ArrayOfTimestamp(Option<Vec<Option<NaiveDateTime>>>) => read_array_of_timestamp;
    ArrayOfTimestampWithTimezone(Option<Vec<Option<DateTime<FixedOffset>>>>) =>
        read_array_of_timestamp_with_timezone;
    NullableBoolean(Option<bool>) => read_nullable_boolean;
    NullableInt8(Option<i8>) => read_nullable_int8;
    NullableInt16(Option<i16>) => read_nullable_int16;
    NullableInt32(Option<i32>) => read_nullable_int32;
    NullableInt64(Option<i64>) => read_nullable_int64;
    NullableFloat32(Option<f32>) => read_nullable_float32;
    NullableFloat64(Option<f64>) => read_nullable_float64;
    ArrayOfNullableBoolean(Option<Vec<Option<bool>>>) => read_array_of_nullable_boolean;
    ArrayOfNullableInt8(Option<Vec<Option<i8>>>) => read_array_of_nullable_int8;
    ArrayOfNullableInt16(Option<Vec<Option<i16>>>) => read_array_of_nullable_int16;
    ArrayOfNullableInt32(Option<Vec<Option<i32>>>) => read_array_of_nullable_int32;
    ArrayOfNullableInt64(Option<Vec<Option<i64>>>) => read_array_of_nullable_int64;
    ArrayOfNullableFloat32(Option<Vec<Option<f32>>>) => read_array_of_nullable_float32;
    ArrayOfNullableFloat64(Option<Vec<Option<f64>>>) => read_array_of_nullable_float64;
}

macro_rules! primitive_getters {
    ($($get:ident / $get_nullable:ident: $ty:ty, $kind:ident, $nullable:ident;)*) => {
        $(
            /// Returns the field value, reading the nullable variant if the
            /// record stores one.
            pub fn $get(&self, name: &str) -> Result<$ty> {
                match self.value(name)? {
                    FieldValue::$kind(v) | FieldValue::$nullable(Some(v)) => Ok(*v),
                    FieldValue::$nullable(None) => Err(CompactError::UnexpectedNull {
                        field: name.to_string(),
                        method: stringify!($get),
                        nullable_method: stringify!($get_nullable),
                    }),
                    other => Err(mismatch(name, FieldKind::$kind, other.kind())),
                }
            }

            pub fn $get_nullable(&self, name: &str) -> Result<Option<$ty>> {
                match self.value(name)? {
                    FieldValue::$kind(v) => Ok(Some(*v)),
                    FieldValue::$nullable(v) => Ok(*v),
                    other => Err(mismatch(name, FieldKind::$nullable, other.kind())),
                }
            }
        )*
    };
}

fn mismatch(name: &str, requested: FieldKind, actual: FieldKind) -> CompactError {
    CompactError::FieldKindMismatch {
        field: name.to_string(),
        requested,
        actual,
    }
}

/// A fully decoded Compact record that does not need the originating type.
///
/// Useful for inspecting data whose type is not registered locally, or for
/// tools that work across many types.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRecord {
    schema: Arc<Schema>,
    values: HashMap<String, FieldValue>,
}

impl GenericRecord {
    /// Decodes every field of the record behind `reader`.
    pub fn read_from(reader: &mut dyn CompactReader) -> Result<Self> {
        let schema = Arc::clone(reader.schema());
        let values = schema
            .fields()
            .iter()
            .map(|field| Ok((field.name().to_string(), FieldValue::read(reader, field)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { schema, values })
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn schema_id(&self) -> i64 {
        self.schema.schema_id()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the kind of the field, or `NotAvailable` if it does not exist.
    pub fn field_kind(&self, name: &str) -> FieldKind {
        self.schema.field_kind(name)
    }

    /// Field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.fields().iter().map(|f| f.name())
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    /// Returns the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    fn value(&self, name: &str) -> Result<&FieldValue> {
        self.values.get(name).ok_or_else(|| CompactError::UnknownField {
            field: name.to_string(),
            type_name: self.type_name().to_string(),
        })
    }

    primitive_getters! {
        get_boolean / get_nullable_boolean: bool, Boolean, NullableBoolean;
        get_int8 / get_nullable_int8: i8, Int8, NullableInt8;
        get_int16 / get_nullable_int16: i16, Int16, NullableInt16;
        get_int32 / get_nullable_int32: i32, Int32, NullableInt32;
        get_int64 / get_nullable_int64: i64, Int64, NullableInt64;
        get_float32 / get_nullable_float32: f32, Float32, NullableFloat32;
        get_float64 / get_nullable_float64: f64, Float64, NullableFloat64;
    }

    pub fn get_string(&self, name: &str) -> Result<Option<&str>> {
        match self.value(name)? {
            FieldValue::String(v) => Ok(v.as_deref()),
            other => Err(mismatch(name, FieldKind::String, other.kind())),
        }
    }

    pub fn get_decimal(&self, name: &str) -> Result<Option<Decimal>> {
        match self.value(name)? {
            FieldValue::Decimal(v) => Ok(*v),
            other => Err(mismatch(name, FieldKind::Decimal, other.kind())),
        }
    }

    /// Returns a nested record.
    pub fn get_generic_record(&self, name: &str) -> Result<Option<&GenericRecord>> {
        match self.value(name)? {
            FieldValue::Compact(v) => Ok(v.as_ref()),
            other => Err(mismatch(name, FieldKind::Compact, other.kind())),
        }
    }

    pub fn get_array_of_generic_record(
        &self,
        name: &str,
    ) -> Result<Option<&[Option<GenericRecord>]>> {
        match self.value(name)? {
            FieldValue::ArrayOfCompact(v) => Ok(v.as_deref()),
            other => Err(mismatch(name, FieldKind::ArrayOfCompact, other.kind())),
        }
    }
}
