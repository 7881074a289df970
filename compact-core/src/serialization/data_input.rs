//! Data input traits and implementations for Compact serialization.

use crate::error::{CompactError, Result};
use bytes::Buf;
use std::io::Cursor;

use super::ByteOrder;

/// Trait for reading primitive values from Compact's binary format.
///
/// Multi-byte values are read in the byte order of the implementation.
pub trait DataInput {
    /// Reads a single byte (i8).
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a boolean from a single byte.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a 16-bit signed integer.
    fn read_short(&mut self) -> Result<i16>;

    /// Reads a 32-bit signed integer.
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads a 32-bit floating point.
    fn read_float(&mut self) -> Result<f32>;

    /// Reads a 64-bit floating point.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads the specified number of raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String>;
}

/// A buffer-based implementation of `DataInput`.
///
/// The cursor can be moved freely; [`ObjectDataInput::read_at`] runs a read at
/// an absolute position and puts the cursor back afterwards.
#[derive(Debug)]
pub struct ObjectDataInput<'a> {
    cursor: Cursor<&'a [u8]>,
    byte_order: ByteOrder,
}

impl<'a> ObjectDataInput<'a> {
    /// Creates a new big-endian `ObjectDataInput` from the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_byte_order(data, ByteOrder::default())
    }

    /// Creates a new `ObjectDataInput` reading in the given byte order.
    pub fn with_byte_order(data: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            cursor: Cursor::new(data),
            byte_order,
        }
    }

    /// Returns the byte order of this input.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns the whole underlying buffer regardless of the cursor.
    pub fn data(&self) -> &'a [u8] {
        self.cursor.get_ref()
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Returns true if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Moves the cursor to an absolute position.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.len() {
            return Err(CompactError::Serialization(format!(
                "position {} is outside of buffer of length {}",
                position,
                self.len()
            )));
        }
        self.cursor.set_position(position as u64);
        Ok(())
    }

    /// Runs `read` with the cursor at `position`, restoring the previous
    /// cursor position afterwards whether or not the read succeeded.
    pub fn read_at<T>(
        &mut self,
        position: usize,
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.position();
        let result = self.set_position(position).and_then(|_| read(self));
        self.cursor.set_position(saved as u64);
        result
    }

    /// Reads a byte at an absolute position without moving the cursor.
    pub fn read_byte_at(&mut self, position: usize) -> Result<i8> {
        self.read_at(position, |input| input.read_byte())
    }

    /// Reads a 16-bit integer at an absolute position without moving the cursor.
    pub fn read_short_at(&mut self, position: usize) -> Result<i16> {
        self.read_at(position, |input| input.read_short())
    }

    /// Reads a 32-bit integer at an absolute position without moving the cursor.
    pub fn read_int_at(&mut self, position: usize) -> Result<i32> {
        self.read_at(position, |input| input.read_int())
    }

    /// Reads a 64-bit integer at an absolute position without moving the cursor.
    pub fn read_long_at(&mut self, position: usize) -> Result<i64> {
        self.read_at(position, |input| input.read_long())
    }

    /// Reads a 32-bit float at an absolute position without moving the cursor.
    pub fn read_float_at(&mut self, position: usize) -> Result<f32> {
        self.read_at(position, |input| input.read_float())
    }

    /// Reads a 64-bit float at an absolute position without moving the cursor.
    pub fn read_double_at(&mut self, position: usize) -> Result<f64> {
        self.read_at(position, |input| input.read_double())
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(CompactError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                n,
                self.cursor.remaining()
            )))
        } else {
            Ok(())
        }
    }
}

impl DataInput for ObjectDataInput<'_> {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_i8())
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8() != 0)
    }

    fn read_short(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => self.cursor.get_i16(),
            ByteOrder::LittleEndian => self.cursor.get_i16_le(),
        })
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => self.cursor.get_i32(),
            ByteOrder::LittleEndian => self.cursor.get_i32_le(),
        })
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => self.cursor.get_i64(),
            ByteOrder::LittleEndian => self.cursor.get_i64_le(),
        })
    }

    fn read_float(&mut self) -> Result<f32> {
        self.ensure_remaining(4)?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => self.cursor.get_f32(),
            ByteOrder::LittleEndian => self.cursor.get_f32_le(),
        })
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => self.cursor.get_f64(),
            ByteOrder::LittleEndian => self.cursor.get_f64_le(),
        })
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_int()?;
        if len < 0 {
            return Err(CompactError::Serialization(format!(
                "invalid string length: {}",
                len
            )));
        }
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes)
            .map_err(|e| CompactError::Serialization(format!("invalid UTF-8 string: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input() {
        let data = [1, 2, 3, 4];
        let input = ObjectDataInput::new(&data);
        assert_eq!(input.remaining(), 4);
        assert_eq!(input.position(), 0);
        assert_eq!(input.len(), 4);
    }

    #[test]
    fn test_read_int_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_int().unwrap(), 0x01020304);
    }

    #[test]
    fn test_read_int_little_endian() {
        let data = [0x04, 0x03, 0x02, 0x01];
        let mut input = ObjectDataInput::with_byte_order(&data, ByteOrder::LittleEndian);
        assert_eq!(input.read_int().unwrap(), 0x01020304);
    }

    #[test]
    fn test_read_insufficient_data() {
        let data = [0x01, 0x02];
        let mut input = ObjectDataInput::new(&data);
        let err = input.read_int().unwrap_err();
        assert!(err.to_string().contains("insufficient data"));
    }

    #[test]
    fn test_read_string() {
        let data = [0, 0, 0, 4, b't', b'e', b's', b't'];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_string().unwrap(), "test");
    }

    #[test]
    fn test_read_string_negative_length() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = ObjectDataInput::new(&data);
        assert!(input.read_string().is_err());
    }

    #[test]
    fn test_positional_reads_restore_cursor() {
        let data = [9, 0, 0, 0, 7, 0, 5];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(input.read_byte().unwrap(), 9);
        assert_eq!(input.read_int_at(1).unwrap(), 7);
        assert_eq!(input.read_short_at(5).unwrap(), 5);
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_read_at_restores_cursor_on_error() {
        let data = [1, 2, 3];
        let mut input = ObjectDataInput::new(&data);
        input.set_position(1).unwrap();
        assert!(input.read_long_at(0).is_err());
        assert!(input.read_byte_at(10).is_err());
        assert_eq!(input.position(), 1);
    }
}
