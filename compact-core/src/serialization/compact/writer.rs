//! Binary writer for Compact records.

use std::any::TypeId;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};
use crate::serialization::{DataOutput, ObjectDataOutput};

use super::codec;
use super::offset_table::write_offsets;
use super::{CompactObject, CompactWriter, FieldKind, Schema, SchemaResolver};

const DATA_LENGTH_SIZE: usize = 4;

#[derive(Debug, Clone, Copy)]
struct FieldSlot {
    offset: i32,
    index: i32,
    bit_offset: i8,
}

/// Default implementation of `CompactWriter`.
///
/// Writes one record into a shared output: fixed-size fields go to their
/// reserved place in the fixed region, variable-size fields are appended and
/// located through the offset table written by [`DefaultCompactWriter::end`].
pub struct DefaultCompactWriter<'a> {
    output: &'a mut ObjectDataOutput,
    schema: Arc<Schema>,
    resolver: &'a dyn SchemaResolver,
    data_start: usize,
    field_offsets: Vec<i32>,
    written: Vec<bool>,
}

impl<'a> DefaultCompactWriter<'a> {
    /// Starts a record at the current end of `output` and reserves its fixed
    /// region.
    pub fn new(
        output: &'a mut ObjectDataOutput,
        schema: Arc<Schema>,
        resolver: &'a dyn SchemaResolver,
    ) -> Self {
        let has_var_fields = schema.var_sized_field_count() > 0;
        let prefix = if has_var_fields { DATA_LENGTH_SIZE } else { 0 };
        let data_start = output.len() + prefix;
        output.write_zero_bytes(prefix + schema.fix_sized_fields_length());
        Self {
            output,
            data_start,
            field_offsets: vec![-1; schema.var_sized_field_count()],
            written: vec![false; schema.field_count()],
            schema,
            resolver,
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Completes the record by writing the data length and the offset table.
    pub fn end(self) -> Result<()> {
        if self.schema.var_sized_field_count() == 0 {
            return Ok(());
        }
        let data_length = self.output.len() - self.data_start;
        write_offsets(self.output, data_length, &self.field_offsets)?;
        self.output
            .write_int_at(self.data_start - DATA_LENGTH_SIZE, data_length as i32)
    }

    fn declare(&mut self, name: &str, kind: FieldKind) -> Result<FieldSlot> {
        let position = self
            .schema
            .field_position(name)
            .ok_or_else(|| CompactError::UndeclaredField {
                field: name.to_string(),
                kind,
                type_name: self.schema.type_name().to_string(),
            })?;
        let field = &self.schema.fields()[position];
        if field.kind() != kind {
            return Err(CompactError::FieldKindMismatch {
                field: name.to_string(),
                requested: kind,
                actual: field.kind(),
            });
        }
        let slot = FieldSlot {
            offset: field.offset(),
            index: field.index(),
            bit_offset: field.bit_offset(),
        };
        if std::mem::replace(&mut self.written[position], true) {
            return Err(CompactError::DuplicateField {
                field: name.to_string(),
            });
        }
        Ok(slot)
    }

    fn fixed_position(&mut self, name: &str, kind: FieldKind) -> Result<usize> {
        let slot = self.declare(name, kind)?;
        Ok(self.data_start + slot.offset as usize)
    }

    fn write_variable<T>(
        &mut self,
        name: &str,
        kind: FieldKind,
        value: Option<T>,
        write: impl FnOnce(&mut Self, T) -> Result<()>,
    ) -> Result<()> {
        let slot = self.declare(name, kind)?;
        match value {
            Some(value) => {
                self.field_offsets[slot.index as usize] =
                    (self.output.len() - self.data_start) as i32;
                write(self, value)
            }
            None => {
                self.field_offsets[slot.index as usize] = -1;
                Ok(())
            }
        }
    }

    /// Writes `[data_length][count][items][offsets]` with offsets relative to
    /// the first item.
    fn write_var_items<T>(
        &mut self,
        items: &[Option<T>],
        mut write_item: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        let data_length_position = self.output.len();
        self.output.write_zero_bytes(DATA_LENGTH_SIZE);
        self.output.write_int(items.len() as i32)?;
        let items_start = self.output.len();
        let mut offsets = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Some(item) => {
                    offsets.push((self.output.len() - items_start) as i32);
                    write_item(self, item)?;
                }
                None => offsets.push(-1),
            }
        }
        let data_length = self.output.len() - items_start;
        write_offsets(self.output, data_length, &offsets)?;
        self.output
            .write_int_at(data_length_position, data_length as i32)
    }

    /// Writes `[schema_id][record]` for a nested value.
    fn write_nested(&mut self, value: &dyn CompactObject) -> Result<()> {
        let schema = self.resolver.schema_for_object(value)?;
        self.output.write_long(schema.schema_id())?;
        let mut nested = DefaultCompactWriter::new(&mut *self.output, schema, self.resolver);
        value.write_compact_fields(&mut nested)?;
        nested.end()
    }
}

impl std::fmt::Debug for DefaultCompactWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCompactWriter")
            .field("type_name", &self.schema.type_name())
            .field("data_start", &self.data_start)
            .field("field_offsets", &self.field_offsets)
            .finish()
    }
}

impl CompactWriter for DefaultCompactWriter<'_> {
    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        let slot = self.declare(name, FieldKind::Boolean)?;
        let position = self.data_start + slot.offset as usize;
        self.output
            .write_bit_at(position, slot.bit_offset as u8, value)
    }

    fn write_int8(&mut self, name: &str, value: i8) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int8)?;
        self.output.write_byte_at(position, value)
    }

    fn write_int16(&mut self, name: &str, value: i16) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int16)?;
        self.output.write_short_at(position, value)
    }

    fn write_int32(&mut self, name: &str, value: i32) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int32)?;
        self.output.write_int_at(position, value)
    }

    fn write_int64(&mut self, name: &str, value: i64) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Int64)?;
        self.output.write_long_at(position, value)
    }

    fn write_float32(&mut self, name: &str, value: f32) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Float32)?;
        self.output.write_float_at(position, value)
    }

    fn write_float64(&mut self, name: &str, value: f64) -> Result<()> {
        let position = self.fixed_position(name, FieldKind::Float64)?;
        self.output.write_double_at(position, value)
    }

    fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.write_variable(name, FieldKind::String, value, |w, v| {
            w.output.write_string(v)
        })
    }

    fn write_decimal(&mut self, name: &str, value: Option<Decimal>) -> Result<()> {
        self.write_variable(name, FieldKind::Decimal, value, |w, v| {
            codec::write_decimal(w.output, &v)
        })
    }

    fn write_time(&mut self, name: &str, value: Option<NaiveTime>) -> Result<()> {
        self.write_variable(name, FieldKind::Time, value, |w, v| {
            codec::write_time(w.output, &v)
        })
    }

    fn write_date(&mut self, name: &str, value: Option<NaiveDate>) -> Result<()> {
        self.write_variable(name, FieldKind::Date, value, |w, v| {
            codec::write_date(w.output, &v)
        })
    }

    fn write_timestamp(&mut self, name: &str, value: Option<NaiveDateTime>) -> Result<()> {
        self.write_variable(name, FieldKind::Timestamp, value, |w, v| {
            codec::write_timestamp(w.output, &v)
        })
    }

    fn write_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<DateTime<FixedOffset>>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::TimestampWithTimezone, value, |w, v| {
            codec::write_timestamp_with_timezone(w.output, &v)
        })
    }

    fn write_compact_dyn(&mut self, name: &str, value: Option<&dyn CompactObject>) -> Result<()> {
        self.write_variable(name, FieldKind::Compact, value, |w, v| w.write_nested(v))
    }

    fn write_array_of_boolean(&mut self, name: &str, value: Option<&[bool]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfBoolean, value, |w, v| {
            codec::write_boolean_array(w.output, v)
        })
    }

    fn write_array_of_int8(&mut self, name: &str, value: Option<&[i8]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt8, value, |w, v| {
            codec::write_fixed_array(w.output, v, ObjectDataOutput::write_byte)
        })
    }

    fn write_array_of_int16(&mut self, name: &str, value: Option<&[i16]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt16, value, |w, v| {
            codec::write_fixed_array(w.output, v, ObjectDataOutput::write_short)
        })
    }

    fn write_array_of_int32(&mut self, name: &str, value: Option<&[i32]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt32, value, |w, v| {
            codec::write_fixed_array(w.output, v, ObjectDataOutput::write_int)
        })
    }

    fn write_array_of_int64(&mut self, name: &str, value: Option<&[i64]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfInt64, value, |w, v| {
            codec::write_fixed_array(w.output, v, ObjectDataOutput::write_long)
        })
    }

    fn write_array_of_float32(&mut self, name: &str, value: Option<&[f32]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfFloat32, value, |w, v| {
            codec::write_fixed_array(w.output, v, ObjectDataOutput::write_float)
        })
    }

    fn write_array_of_float64(&mut self, name: &str, value: Option<&[f64]>) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfFloat64, value, |w, v| {
            codec::write_fixed_array(w.output, v, ObjectDataOutput::write_double)
        })
    }

    fn write_array_of_string(
        &mut self,
        name: &str,
        value: Option<&[Option<String>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfString, value, |w, items| {
            w.write_var_items(items, |w, item| w.output.write_string(item))
        })
    }

    fn write_array_of_decimal(
        &mut self,
        name: &str,
        value: Option<&[Option<Decimal>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfDecimal, value, |w, items| {
            w.write_var_items(items, |w, item| codec::write_decimal(w.output, item))
        })
    }

    fn write_array_of_time(
        &mut self,
        name: &str,
        value: Option<&[Option<NaiveTime>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfTime, value, |w, items| {
            w.write_var_items(items, |w, item| codec::write_time(w.output, item))
        })
    }

    fn write_array_of_date(
        &mut self,
        name: &str,
        value: Option<&[Option<NaiveDate>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfDate, value, |w, items| {
            w.write_var_items(items, |w, item| codec::write_date(w.output, item))
        })
    }

    fn write_array_of_timestamp(
        &mut self,
        name: &str,
        value: Option<&[Option<NaiveDateTime>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfTimestamp, value, |w, items| {
            w.write_var_items(items, |w, item| codec::write_timestamp(w.output, item))
        })
    }

    fn write_array_of_timestamp_with_timezone(
        &mut self,
        name: &str,
        value: Option<&[Option<DateTime<FixedOffset>>]>,
    ) -> Result<()> {
        self.write_variable(
            name,
            FieldKind::ArrayOfTimestampWithTimezone,
            value,
            |w, items| {
                w.write_var_items(items, |w, item| {
                    codec::write_timestamp_with_timezone(w.output, item)
                })
            },
        )
    }

    fn write_array_of_compact_dyn(
        &mut self,
        name: &str,
        value: Option<&[Option<&dyn CompactObject>]>,
    ) -> Result<()> {
        if let Some(items) = value {
            let mut item_type: Option<TypeId> = None;
            for item in items.iter().flatten() {
                let type_id = item.compact_type_id();
                if *item_type.get_or_insert(type_id) != type_id {
                    return Err(CompactError::Serialization(format!(
                        "array of compact field '{}' contains items of different types",
                        name
                    )));
                }
            }
        }
        self.write_variable(name, FieldKind::ArrayOfCompact, value, |w, items| {
            w.write_var_items(items, |w, item| w.write_nested(*item))
        })
    }

    fn write_nullable_boolean(&mut self, name: &str, value: Option<bool>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableBoolean, value, |w, v| {
            w.output.write_bool(v)
        })
    }

    fn write_nullable_int8(&mut self, name: &str, value: Option<i8>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt8, value, |w, v| {
            w.output.write_byte(v)
        })
    }

    fn write_nullable_int16(&mut self, name: &str, value: Option<i16>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt16, value, |w, v| {
            w.output.write_short(v)
        })
    }

    fn write_nullable_int32(&mut self, name: &str, value: Option<i32>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt32, value, |w, v| {
            w.output.write_int(v)
        })
    }

    fn write_nullable_int64(&mut self, name: &str, value: Option<i64>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableInt64, value, |w, v| {
            w.output.write_long(v)
        })
    }

    fn write_nullable_float32(&mut self, name: &str, value: Option<f32>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableFloat32, value, |w, v| {
            w.output.write_float(v)
        })
    }

    fn write_nullable_float64(&mut self, name: &str, value: Option<f64>) -> Result<()> {
        self.write_variable(name, FieldKind::NullableFloat64, value, |w, v| {
            w.output.write_double(v)
        })
    }

    fn write_array_of_nullable_boolean(
        &mut self,
        name: &str,
        value: Option<&[Option<bool>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableBoolean, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_bool(item))
        })
    }

    fn write_array_of_nullable_int8(
        &mut self,
        name: &str,
        value: Option<&[Option<i8>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableInt8, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_byte(item))
        })
    }

    fn write_array_of_nullable_int16(
        &mut self,
        name: &str,
        value: Option<&[Option<i16>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableInt16, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_short(item))
        })
    }

    fn write_array_of_nullable_int32(
        &mut self,
        name: &str,
        value: Option<&[Option<i32>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableInt32, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_int(item))
        })
    }

    fn write_array_of_nullable_int64(
        &mut self,
        name: &str,
        value: Option<&[Option<i64>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableInt64, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_long(item))
        })
    }

    fn write_array_of_nullable_float32(
        &mut self,
        name: &str,
        value: Option<&[Option<f32>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableFloat32, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_float(item))
        })
    }

    fn write_array_of_nullable_float64(
        &mut self,
        name: &str,
        value: Option<&[Option<f64>]>,
    ) -> Result<()> {
        self.write_variable(name, FieldKind::ArrayOfNullableFloat64, value, |w, items| {
            w.write_var_items(items, |w, &item| w.output.write_double(item))
        })
    }
}
