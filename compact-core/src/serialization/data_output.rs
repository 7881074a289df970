//! Data output traits and implementations for Compact serialization.

use crate::error::{CompactError, Result};
use bytes::{BufMut, BytesMut};

use super::ByteOrder;

/// Trait for writing primitive values in Compact's binary format.
///
/// Multi-byte values are written in the byte order of the implementation.
pub trait DataOutput {
    /// Writes a single byte (i8).
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a boolean as a single byte (0 for false, 1 for true).
    fn write_bool(&mut self, v: bool) -> Result<()>;

    /// Writes a 16-bit signed integer.
    fn write_short(&mut self, v: i16) -> Result<()>;

    /// Writes a 32-bit signed integer.
    fn write_int(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer.
    fn write_long(&mut self, v: i64) -> Result<()>;

    /// Writes a 32-bit floating point.
    fn write_float(&mut self, v: f32) -> Result<()>;

    /// Writes a 64-bit floating point.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;

    /// Writes a string as its UTF-8 byte length followed by the bytes.
    fn write_string(&mut self, v: &str) -> Result<()>;
}

/// A buffer-based implementation of `DataOutput`.
///
/// Besides appending, the buffer supports positional writes into regions that
/// were already reserved, which the Compact writer uses for fixed-size fields
/// and back-filled lengths.
#[derive(Debug)]
pub struct ObjectDataOutput {
    buffer: BytesMut,
    byte_order: ByteOrder,
}

impl ObjectDataOutput {
    /// Creates a new big-endian `ObjectDataOutput` with default capacity.
    pub fn new() -> Self {
        Self::with_byte_order(ByteOrder::default())
    }

    /// Creates a new `ObjectDataOutput` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            byte_order: ByteOrder::default(),
        }
    }

    /// Creates a new `ObjectDataOutput` writing in the given byte order.
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
            byte_order,
        }
    }

    /// Returns the byte order of this output.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Returns the number of bytes written, which is also the append position.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clears the buffer, removing all written data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Appends `count` zero bytes.
    pub fn write_zero_bytes(&mut self, count: usize) {
        self.buffer.put_bytes(0, count);
    }

    /// Overwrites a single byte at `position`.
    pub fn write_byte_at(&mut self, position: usize, v: i8) -> Result<()> {
        self.write_slice_at(position, &v.to_be_bytes())
    }

    /// Sets or clears one bit of the byte at `position`, keeping the others.
    pub fn write_bit_at(&mut self, position: usize, bit: u8, v: bool) -> Result<()> {
        self.check_range(position, 1)?;
        let mask = 1u8 << bit;
        if v {
            self.buffer[position] |= mask;
        } else {
            self.buffer[position] &= !mask;
        }
        Ok(())
    }

    /// Overwrites a 16-bit integer at `position`.
    pub fn write_short_at(&mut self, position: usize, v: i16) -> Result<()> {
        let bytes = match self.byte_order {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        };
        self.write_slice_at(position, &bytes)
    }

    /// Overwrites a 32-bit integer at `position`.
    pub fn write_int_at(&mut self, position: usize, v: i32) -> Result<()> {
        let bytes = match self.byte_order {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        };
        self.write_slice_at(position, &bytes)
    }

    /// Overwrites a 64-bit integer at `position`.
    pub fn write_long_at(&mut self, position: usize, v: i64) -> Result<()> {
        let bytes = match self.byte_order {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        };
        self.write_slice_at(position, &bytes)
    }

    /// Overwrites a 32-bit float at `position`.
    pub fn write_float_at(&mut self, position: usize, v: f32) -> Result<()> {
        self.write_int_at(position, v.to_bits() as i32)
    }

    /// Overwrites a 64-bit float at `position`.
    pub fn write_double_at(&mut self, position: usize, v: f64) -> Result<()> {
        self.write_long_at(position, v.to_bits() as i64)
    }

    fn write_slice_at(&mut self, position: usize, bytes: &[u8]) -> Result<()> {
        self.check_range(position, bytes.len())?;
        self.buffer[position..position + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn check_range(&self, position: usize, len: usize) -> Result<()> {
        if position + len > self.buffer.len() {
            return Err(CompactError::Serialization(format!(
                "positional write of {} bytes at {} exceeds buffer length {}",
                len,
                position,
                self.buffer.len()
            )));
        }
        Ok(())
    }
}

impl Default for ObjectDataOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for ObjectDataOutput {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.buffer.put_i8(v);
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buffer.put_u8(if v { 1 } else { 0 });
        Ok(())
    }

    fn write_short(&mut self, v: i16) -> Result<()> {
        match self.byte_order {
            ByteOrder::BigEndian => self.buffer.put_i16(v),
            ByteOrder::LittleEndian => self.buffer.put_i16_le(v),
        }
        Ok(())
    }

    fn write_int(&mut self, v: i32) -> Result<()> {
        match self.byte_order {
            ByteOrder::BigEndian => self.buffer.put_i32(v),
            ByteOrder::LittleEndian => self.buffer.put_i32_le(v),
        }
        Ok(())
    }

    fn write_long(&mut self, v: i64) -> Result<()> {
        match self.byte_order {
            ByteOrder::BigEndian => self.buffer.put_i64(v),
            ByteOrder::LittleEndian => self.buffer.put_i64_le(v),
        }
        Ok(())
    }

    fn write_float(&mut self, v: f32) -> Result<()> {
        match self.byte_order {
            ByteOrder::BigEndian => self.buffer.put_f32(v),
            ByteOrder::LittleEndian => self.buffer.put_f32_le(v),
        }
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        match self.byte_order {
            ByteOrder::BigEndian => self.buffer.put_f64(v),
            ByteOrder::LittleEndian => self.buffer.put_f64_le(v),
        }
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        let bytes = v.as_bytes();
        self.write_int(bytes.len() as i32)?;
        self.write_bytes(bytes)
    }
}
