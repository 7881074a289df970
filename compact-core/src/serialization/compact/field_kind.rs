//! The closed set of Compact field kinds.

use std::fmt;

use crate::error::{CompactError, Result};

/// Field kind identifiers for Compact serialization.
///
/// The discriminants are the cross-language wire ids. They are folded into
/// schema fingerprints and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum FieldKind {
    NotAvailable = 0,
    Boolean = 1,
    ArrayOfBoolean = 2,
    Int8 = 3,
    ArrayOfInt8 = 4,
    Char = 5,
    ArrayOfChar = 6,
    Int16 = 7,
    ArrayOfInt16 = 8,
    Int32 = 9,
    ArrayOfInt32 = 10,
    Int64 = 11,
    ArrayOfInt64 = 12,
    Float32 = 13,
    ArrayOfFloat32 = 14,
    Float64 = 15,
    ArrayOfFloat64 = 16,
    String = 17,
    ArrayOfString = 18,
    Decimal = 19,
    ArrayOfDecimal = 20,
    Time = 21,
    ArrayOfTime = 22,
    Date = 23,
    ArrayOfDate = 24,
    Timestamp = 25,
    ArrayOfTimestamp = 26,
    TimestampWithTimezone = 27,
    ArrayOfTimestampWithTimezone = 28,
    Compact = 29,
    ArrayOfCompact = 30,
    Portable = 31,
    ArrayOfPortable = 32,
    NullableBoolean = 33,
    ArrayOfNullableBoolean = 34,
    NullableInt8 = 35,
    ArrayOfNullableInt8 = 36,
    NullableInt16 = 37,
    ArrayOfNullableInt16 = 38,
    NullableInt32 = 39,
    ArrayOfNullableInt32 = 40,
    NullableInt64 = 41,
    ArrayOfNullableInt64 = 42,
    NullableFloat32 = 43,
    ArrayOfNullableFloat32 = 44,
    NullableFloat64 = 45,
    ArrayOfNullableFloat64 = 46,
}

impl FieldKind {
    /// Every kind, ordered by id.
    pub const ALL: [FieldKind; 47] = [
        Self::NotAvailable,
        Self::Boolean,
        Self::ArrayOfBoolean,
        Self::Int8,
        Self::ArrayOfInt8,
        Self::Char,
        Self::ArrayOfChar,
        Self::Int16,
        Self::ArrayOfInt16,
        Self::Int32,
        Self::ArrayOfInt32,
        Self::Int64,
        Self::ArrayOfInt64,
        Self::Float32,
        Self::ArrayOfFloat32,
        Self::Float64,
        Self::ArrayOfFloat64,
        Self::String,
        Self::ArrayOfString,
        Self::Decimal,
        Self::ArrayOfDecimal,
        Self::Time,
        Self::ArrayOfTime,
        Self::Date,
        Self::ArrayOfDate,
        Self::Timestamp,
        Self::ArrayOfTimestamp,
        Self::TimestampWithTimezone,
        Self::ArrayOfTimestampWithTimezone,
        Self::Compact,
        Self::ArrayOfCompact,
        Self::Portable,
        Self::ArrayOfPortable,
        Self::NullableBoolean,
        Self::ArrayOfNullableBoolean,
        Self::NullableInt8,
        Self::ArrayOfNullableInt8,
        Self::NullableInt16,
        Self::ArrayOfNullableInt16,
        Self::NullableInt32,
        Self::ArrayOfNullableInt32,
        Self::NullableInt64,
        Self::ArrayOfNullableInt64,
        Self::NullableFloat32,
        Self::ArrayOfNullableFloat32,
        Self::NullableFloat64,
        Self::ArrayOfNullableFloat64,
    ];

    /// Creates a FieldKind from its wire representation.
    pub fn from_id(id: i32) -> Result<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| CompactError::Serialization(format!("unknown field kind id: {}", id)))
    }

    /// Returns the wire representation of this field kind.
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Returns true if the encoded width of this kind depends on the value.
    ///
    /// Every nullable kind is variable-sized so that null can be expressed
    /// through the offset table.
    pub fn is_var_sized(self) -> bool {
        self.size_in_bytes().is_none()
    }

    /// Returns the width of a fixed-size kind, or `None` for variable-size kinds.
    ///
    /// Booleans are bit-packed and report a width of zero bytes.
    pub fn size_in_bytes(self) -> Option<usize> {
        match self {
            Self::Boolean => Some(0),
            Self::Int8 => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Returns true for kinds that exist only for id compatibility and can
    /// not be written or read by this implementation.
    pub fn is_unsupported(self) -> bool {
        matches!(
            self,
            Self::NotAvailable | Self::Char | Self::ArrayOfChar | Self::Portable | Self::ArrayOfPortable
        )
    }

    /// Returns true if this is an array kind.
    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::ArrayOfBoolean
                | Self::ArrayOfInt8
                | Self::ArrayOfChar
                | Self::ArrayOfInt16
                | Self::ArrayOfInt32
                | Self::ArrayOfInt64
                | Self::ArrayOfFloat32
                | Self::ArrayOfFloat64
                | Self::ArrayOfString
                | Self::ArrayOfDecimal
                | Self::ArrayOfTime
                | Self::ArrayOfDate
                | Self::ArrayOfTimestamp
                | Self::ArrayOfTimestampWithTimezone
                | Self::ArrayOfCompact
                | Self::ArrayOfPortable
                | Self::ArrayOfNullableBoolean
                | Self::ArrayOfNullableInt8
                | Self::ArrayOfNullableInt16
                | Self::ArrayOfNullableInt32
                | Self::ArrayOfNullableInt64
                | Self::ArrayOfNullableFloat32
                | Self::ArrayOfNullableFloat64
        )
    }

    /// Returns true for the nullable variants of the primitive kinds and
    /// their arrays.
    pub fn is_nullable_variant(self) -> bool {
        self.non_nullable_counterpart().is_some()
    }

    /// Returns the nullable variant of a primitive kind or primitive array kind.
    pub fn nullable_counterpart(self) -> Option<Self> {
        match self {
            Self::Boolean => Some(Self::NullableBoolean),
            Self::Int8 => Some(Self::NullableInt8),
            Self::Int16 => Some(Self::NullableInt16),
            Self::Int32 => Some(Self::NullableInt32),
            Self::Int64 => Some(Self::NullableInt64),
            Self::Float32 => Some(Self::NullableFloat32),
            Self::Float64 => Some(Self::NullableFloat64),
            Self::ArrayOfBoolean => Some(Self::ArrayOfNullableBoolean),
            Self::ArrayOfInt8 => Some(Self::ArrayOfNullableInt8),
            Self::ArrayOfInt16 => Some(Self::ArrayOfNullableInt16),
            Self::ArrayOfInt32 => Some(Self::ArrayOfNullableInt32),
            Self::ArrayOfInt64 => Some(Self::ArrayOfNullableInt64),
            Self::ArrayOfFloat32 => Some(Self::ArrayOfNullableFloat32),
            Self::ArrayOfFloat64 => Some(Self::ArrayOfNullableFloat64),
            _ => None,
        }
    }

    /// Returns the non-nullable variant of a nullable primitive kind.
    pub fn non_nullable_counterpart(self) -> Option<Self> {
        match self {
            Self::NullableBoolean => Some(Self::Boolean),
            Self::NullableInt8 => Some(Self::Int8),
            Self::NullableInt16 => Some(Self::Int16),
            Self::NullableInt32 => Some(Self::Int32),
            Self::NullableInt64 => Some(Self::Int64),
            Self::NullableFloat32 => Some(Self::Float32),
            Self::NullableFloat64 => Some(Self::Float64),
            Self::ArrayOfNullableBoolean => Some(Self::ArrayOfBoolean),
            Self::ArrayOfNullableInt8 => Some(Self::ArrayOfInt8),
            Self::ArrayOfNullableInt16 => Some(Self::ArrayOfInt16),
            Self::ArrayOfNullableInt32 => Some(Self::ArrayOfInt32),
            Self::ArrayOfNullableInt64 => Some(Self::ArrayOfInt64),
            Self::ArrayOfNullableFloat32 => Some(Self::ArrayOfFloat32),
            Self::ArrayOfNullableFloat64 => Some(Self::ArrayOfFloat64),
            _ => None,
        }
    }

    /// Returns true if a field stored as `self` can be read through the
    /// accessor for `requested`, either exactly or via nullable promotion.
    pub fn is_readable_as(self, requested: FieldKind) -> bool {
        self == requested
            || self.nullable_counterpart() == Some(requested)
            || self.non_nullable_counterpart() == Some(requested)
    }

    /// Returns the upper snake case name used across implementations.
    pub fn name(self) -> &'static str {
        match self {
            Self::NotAvailable => "NOT_AVAILABLE",
            Self::Boolean => "BOOLEAN",
            Self::ArrayOfBoolean => "ARRAY_OF_BOOLEAN",
            Self::Int8 => "INT8",
            Self::ArrayOfInt8 => "ARRAY_OF_INT8",
            Self::Char => "CHAR",
            Self::ArrayOfChar => "ARRAY_OF_CHAR",
            Self::Int16 => "INT16",
            Self::ArrayOfInt16 => "ARRAY_OF_INT16",
            Self::Int32 => "INT32",
            Self::ArrayOfInt32 => "ARRAY_OF_INT32",
            Self::Int64 => "INT64",
            Self::ArrayOfInt64 => "ARRAY_OF_INT64",
            Self::Float32 => "FLOAT32",
            Self::ArrayOfFloat32 => "ARRAY_OF_FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::ArrayOfFloat64 => "ARRAY_OF_FLOAT64",
            Self::String => "STRING",
            Self::ArrayOfString => "ARRAY_OF_STRING",
            Self::Decimal => "DECIMAL",
            Self::ArrayOfDecimal => "ARRAY_OF_DECIMAL",
            Self::Time => "TIME",
            Self::ArrayOfTime => "ARRAY_OF_TIME",
            Self::Date => "DATE",
            Self::ArrayOfDate => "ARRAY_OF_DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::ArrayOfTimestamp => "ARRAY_OF_TIMESTAMP",
            Self::TimestampWithTimezone => "TIMESTAMP_WITH_TIMEZONE",
            Self::ArrayOfTimestampWithTimezone => "ARRAY_OF_TIMESTAMP_WITH_TIMEZONE",
            Self::Compact => "COMPACT",
            Self::ArrayOfCompact => "ARRAY_OF_COMPACT",
            Self::Portable => "PORTABLE",
            Self::ArrayOfPortable => "ARRAY_OF_PORTABLE",
            Self::NullableBoolean => "NULLABLE_BOOLEAN",
            Self::ArrayOfNullableBoolean => "ARRAY_OF_NULLABLE_BOOLEAN",
            Self::NullableInt8 => "NULLABLE_INT8",
            Self::ArrayOfNullableInt8 => "ARRAY_OF_NULLABLE_INT8",
            Self::NullableInt16 => "NULLABLE_INT16",
            Self::ArrayOfNullableInt16 => "ARRAY_OF_NULLABLE_INT16",
            Self::NullableInt32 => "NULLABLE_INT32",
            Self::ArrayOfNullableInt32 => "ARRAY_OF_NULLABLE_INT32",
            Self::NullableInt64 => "NULLABLE_INT64",
            Self::ArrayOfNullableInt64 => "ARRAY_OF_NULLABLE_INT64",
            Self::NullableFloat32 => "NULLABLE_FLOAT32",
            Self::ArrayOfNullableFloat32 => "ARRAY_OF_NULLABLE_FLOAT32",
            Self::NullableFloat64 => "NULLABLE_FLOAT64",
            Self::ArrayOfNullableFloat64 => "ARRAY_OF_NULLABLE_FLOAT64",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_round_trip() {
        for id in 0..=46 {
            let kind = FieldKind::from_id(id).unwrap();
            assert_eq!(kind.id(), id);
        }
    }

    #[test]
    fn test_field_kind_invalid_id() {
        assert!(FieldKind::from_id(-1).is_err());
        assert!(FieldKind::from_id(47).is_err());
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(FieldKind::Boolean.size_in_bytes(), Some(0));
        assert_eq!(FieldKind::Int8.size_in_bytes(), Some(1));
        assert_eq!(FieldKind::Int16.size_in_bytes(), Some(2));
        assert_eq!(FieldKind::Int32.size_in_bytes(), Some(4));
        assert_eq!(FieldKind::Int64.size_in_bytes(), Some(8));
        assert_eq!(FieldKind::Float32.size_in_bytes(), Some(4));
        assert_eq!(FieldKind::Float64.size_in_bytes(), Some(8));
        assert_eq!(FieldKind::String.size_in_bytes(), None);
        assert_eq!(FieldKind::Compact.size_in_bytes(), None);
    }

    #[test]
    fn test_nullable_kinds_are_var_sized() {
        for kind in FieldKind::ALL {
            if let Some(nullable) = kind.nullable_counterpart() {
                assert!(nullable.is_var_sized(), "{} must be var sized", nullable);
                assert_eq!(nullable.non_nullable_counterpart(), Some(kind));
            }
        }
        assert!(!FieldKind::Int32.is_var_sized());
        assert!(FieldKind::NullableInt32.is_var_sized());
        assert!(FieldKind::ArrayOfInt32.is_var_sized());
        assert!(FieldKind::NullableBoolean.is_nullable_variant());
        assert!(!FieldKind::Boolean.is_nullable_variant());
        assert!(!FieldKind::String.is_nullable_variant());
    }

    #[test]
    fn test_readable_as() {
        assert!(FieldKind::Int32.is_readable_as(FieldKind::Int32));
        assert!(FieldKind::Int32.is_readable_as(FieldKind::NullableInt32));
        assert!(FieldKind::NullableInt32.is_readable_as(FieldKind::Int32));
        assert!(FieldKind::ArrayOfNullableInt8.is_readable_as(FieldKind::ArrayOfInt8));
        assert!(!FieldKind::Int32.is_readable_as(FieldKind::Int64));
        assert!(!FieldKind::String.is_readable_as(FieldKind::Int32));
        assert!(!FieldKind::Decimal.is_readable_as(FieldKind::Int32));
    }

    #[test]
    fn test_is_array() {
        assert!(!FieldKind::Boolean.is_array());
        assert!(FieldKind::ArrayOfBoolean.is_array());
        assert!(FieldKind::ArrayOfCompact.is_array());
        assert!(FieldKind::ArrayOfNullableFloat64.is_array());
    }

    #[test]
    fn test_display_uses_wire_names() {
        assert_eq!(FieldKind::ArrayOfTimestamp.to_string(), "ARRAY_OF_TIMESTAMP");
        assert_eq!(FieldKind::NotAvailable.to_string(), "NOT_AVAILABLE");
    }
}
