//! Offset tables that locate variable-size values inside a record.

use crate::error::{CompactError, Result};
use crate::serialization::{DataOutput, ObjectDataInput, ObjectDataOutput};

/// Width of one offset table entry, chosen from the length of the data
/// region the offsets point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffsetWidth {
    Byte,
    Short,
    Int,
}

impl OffsetWidth {
    pub(crate) fn for_data_length(data_length: usize) -> Self {
        if data_length < u8::MAX as usize {
            Self::Byte
        } else if data_length < u16::MAX as usize {
            Self::Short
        } else {
            Self::Int
        }
    }

    pub(crate) fn size(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int => 4,
        }
    }
}

/// Appends one entry per offset; negative offsets mark null values.
pub(crate) fn write_offsets(
    output: &mut ObjectDataOutput,
    data_length: usize,
    offsets: &[i32],
) -> Result<()> {
    match OffsetWidth::for_data_length(data_length) {
        OffsetWidth::Byte => {
            for &offset in offsets {
                output.write_byte(if offset < 0 { -1 } else { offset as u8 as i8 })?;
            }
        }
        OffsetWidth::Short => {
            for &offset in offsets {
                output.write_short(if offset < 0 { -1 } else { offset as u16 as i16 })?;
            }
        }
        OffsetWidth::Int => {
            for &offset in offsets {
                output.write_int(offset)?;
            }
        }
    }
    Ok(())
}

/// Location of an offset table inside the input buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OffsetTable {
    start: usize,
    width: OffsetWidth,
}

impl OffsetTable {
    /// Describes the table that follows a data region of `data_length` bytes
    /// beginning at `data_start`.
    pub(crate) fn after(
        input: &ObjectDataInput<'_>,
        data_start: usize,
        data_length: i32,
        entries: usize,
    ) -> Result<Self> {
        if data_length < 0 {
            return Err(CompactError::Serialization(format!(
                "invalid data length: {}",
                data_length
            )));
        }
        let data_length = data_length as usize;
        let width = OffsetWidth::for_data_length(data_length);
        let start = data_start + data_length;
        let end = start + entries * width.size();
        if end > input.len() {
            return Err(CompactError::Serialization(format!(
                "offset table ends at {} beyond buffer of length {}",
                end,
                input.len()
            )));
        }
        Ok(Self { start, width })
    }

    /// Returns the offset stored for `index`, or `None` for null.
    pub(crate) fn get(&self, input: &mut ObjectDataInput<'_>, index: usize) -> Result<Option<usize>> {
        let position = self.start + index * self.width.size();
        let offset = match self.width {
            OffsetWidth::Byte => {
                let raw = input.read_byte_at(position)? as u8;
                (raw != u8::MAX).then_some(raw as usize)
            }
            OffsetWidth::Short => {
                let raw = input.read_short_at(position)? as u16;
                (raw != u16::MAX).then_some(raw as usize)
            }
            OffsetWidth::Int => {
                let raw = input.read_int_at(position)?;
                (raw >= 0).then_some(raw as usize)
            }
        };
        Ok(offset)
    }
}
