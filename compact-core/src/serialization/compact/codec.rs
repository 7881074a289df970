//! Encodings of the individual Compact value types.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use rust_decimal::Decimal;

use crate::error::{CompactError, Result};
use crate::serialization::{DataInput, DataOutput, ObjectDataInput, ObjectDataOutput};

/// Largest unscaled value, in bytes, that fits the decimal representation.
const MAX_DECIMAL_BYTES: usize = 16;

/// Largest scale the decimal representation supports.
const MAX_DECIMAL_SCALE: i32 = 28;

/// Largest nanosecond-of-second value outside a leap second.
const MAX_NANOS: u32 = 999_999_999;

/// Reads a non-negative element count.
pub(crate) fn read_count(input: &mut ObjectDataInput<'_>) -> Result<usize> {
    let count = input.read_int()?;
    if count < 0 {
        return Err(CompactError::Serialization(format!(
            "invalid item count: {}",
            count
        )));
    }
    Ok(count as usize)
}

pub(crate) fn write_fixed_array<T: Copy>(
    output: &mut ObjectDataOutput,
    values: &[T],
    write: fn(&mut ObjectDataOutput, T) -> Result<()>,
) -> Result<()> {
    output.write_int(values.len() as i32)?;
    for &value in values {
        write(output, value)?;
    }
    Ok(())
}

pub(crate) fn read_fixed_array<'a, T>(
    input: &mut ObjectDataInput<'a>,
    read: fn(&mut ObjectDataInput<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = read_count(input)?;
    let mut values = Vec::with_capacity(count.min(input.remaining()));
    for _ in 0..count {
        values.push(read(input)?);
    }
    Ok(values)
}

/// Writes booleans eight to a byte, least significant bit first.
pub(crate) fn write_boolean_array(output: &mut ObjectDataOutput, values: &[bool]) -> Result<()> {
    output.write_int(values.len() as i32)?;
    for chunk in values.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |byte, (bit, &v)| byte | ((v as u8) << bit));
        output.write_byte(byte as i8)?;
    }
    Ok(())
}

pub(crate) fn read_boolean_array(input: &mut ObjectDataInput<'_>) -> Result<Vec<bool>> {
    let count = read_count(input)?;
    let bytes = input.read_bytes((count + 7) / 8)?;
    Ok((0..count)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect())
}

/// Writes a decimal as its minimal two's-complement unscaled value followed
/// by the scale.
pub(crate) fn write_decimal(output: &mut ObjectDataOutput, value: &Decimal) -> Result<()> {
    let bytes = value.mantissa().to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let sign_extension = match bytes[start] {
            0x00 => bytes[start + 1] & 0x80 == 0,
            0xFF => bytes[start + 1] & 0x80 != 0,
            _ => false,
        };
        if !sign_extension {
            break;
        }
        start += 1;
    }
    let unscaled = &bytes[start..];
    output.write_int(unscaled.len() as i32)?;
    output.write_bytes(unscaled)?;
    output.write_int(value.scale() as i32)
}

pub(crate) fn read_decimal(input: &mut ObjectDataInput<'_>) -> Result<Decimal> {
    let len = input.read_int()?;
    if len <= 0 || len as usize > MAX_DECIMAL_BYTES {
        return Err(CompactError::Serialization(format!(
            "decimal with an unscaled value of {} bytes is not supported",
            len
        )));
    }
    let bytes = input.read_bytes(len as usize)?;
    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut buf = [fill; MAX_DECIMAL_BYTES];
    buf[MAX_DECIMAL_BYTES - bytes.len()..].copy_from_slice(&bytes);
    let unscaled = i128::from_be_bytes(buf);

    let scale = input.read_int()?;
    if scale > MAX_DECIMAL_SCALE {
        return Err(CompactError::Serialization(format!(
            "decimal scale {} is not supported",
            scale
        )));
    }
    // A negative scale multiplies the unscaled value by a power of ten.
    let (unscaled, scale) = if scale < 0 {
        let rescaled = 10i128
            .checked_pow(scale.unsigned_abs())
            .and_then(|factor| unscaled.checked_mul(factor))
            .ok_or_else(|| {
                CompactError::Serialization(format!(
                    "decimal {}E+{} is out of range",
                    unscaled,
                    scale.unsigned_abs()
                ))
            })?;
        (rescaled, 0)
    } else {
        (unscaled, scale as u32)
    };
    Decimal::try_from_i128_with_scale(unscaled, scale)
        .map_err(|e| CompactError::Serialization(format!("decimal out of range: {}", e)))
}

pub(crate) fn write_time(output: &mut ObjectDataOutput, value: &NaiveTime) -> Result<()> {
    output.write_byte(value.hour() as i8)?;
    output.write_byte(value.minute() as i8)?;
    output.write_byte(value.second() as i8)?;
    // chrono stores a leap second as nanos past 1e9; fold it into the last
    // representable instant of the second.
    output.write_int(value.nanosecond().min(MAX_NANOS) as i32)
}

pub(crate) fn read_time(input: &mut ObjectDataInput<'_>) -> Result<NaiveTime> {
    let hour = input.read_byte()?;
    let minute = input.read_byte()?;
    let second = input.read_byte()?;
    let nanos = input.read_int()?;
    NaiveTime::from_hms_nano_opt(hour as u32, minute as u32, second as u32, nanos as u32).ok_or_else(
        || {
            CompactError::Serialization(format!(
                "invalid time {}:{}:{}.{}",
                hour, minute, second, nanos
            ))
        },
    )
}

pub(crate) fn write_date(output: &mut ObjectDataOutput, value: &NaiveDate) -> Result<()> {
    output.write_int(value.year())?;
    output.write_byte(value.month() as i8)?;
    output.write_byte(value.day() as i8)
}

pub(crate) fn read_date(input: &mut ObjectDataInput<'_>) -> Result<NaiveDate> {
    let year = input.read_int()?;
    let month = input.read_byte()?;
    let day = input.read_byte()?;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
        CompactError::Serialization(format!("invalid date {}-{}-{}", year, month, day))
    })
}

pub(crate) fn write_timestamp(output: &mut ObjectDataOutput, value: &NaiveDateTime) -> Result<()> {
    write_date(output, &value.date())?;
    write_time(output, &value.time())
}

pub(crate) fn read_timestamp(input: &mut ObjectDataInput<'_>) -> Result<NaiveDateTime> {
    let date = read_date(input)?;
    let time = read_time(input)?;
    Ok(NaiveDateTime::new(date, time))
}

pub(crate) fn write_timestamp_with_timezone(
    output: &mut ObjectDataOutput,
    value: &DateTime<FixedOffset>,
) -> Result<()> {
    write_timestamp(output, &value.naive_local())?;
    output.write_int(value.offset().local_minus_utc())
}

pub(crate) fn read_timestamp_with_timezone(
    input: &mut ObjectDataInput<'_>,
) -> Result<DateTime<FixedOffset>> {
    let local = read_timestamp(input)?;
    let offset_seconds = input.read_int()?;
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
        CompactError::Serialization(format!("invalid zone offset of {} seconds", offset_seconds))
    })?;
    offset
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| CompactError::Serialization(format!("invalid local timestamp {}", local)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn decimal_bytes(value: &str) -> Vec<u8> {
        let mut output = ObjectDataOutput::new();
        write_decimal(&mut output, &Decimal::from_str(value).unwrap()).unwrap();
        output.into_bytes()
    }

    #[test]
    fn test_decimal_uses_minimal_unscaled_bytes() {
        assert_eq!(decimal_bytes("0"), vec![0, 0, 0, 1, 0, 0, 0, 0, 0]);
        assert_eq!(decimal_bytes("1.27"), vec![0, 0, 0, 1, 127, 0, 0, 0, 2]);
        assert_eq!(decimal_bytes("1.28"), vec![0, 0, 0, 2, 0, 128, 0, 0, 0, 2]);
        assert_eq!(decimal_bytes("-1"), vec![0, 0, 0, 1, 0xFF, 0, 0, 0, 0]);
        assert_eq!(decimal_bytes("-1.29"), vec![0, 0, 0, 2, 0xFF, 0x7F, 0, 0, 0, 2]);
    }

    #[test]
    fn test_decimal_round_trip_extremes() {
        for text in ["79228162514264337593543950335", "-79228162514264337593543950335", "0.0000000000000000000000000001"] {
            let bytes = decimal_bytes(text);
            let mut input = ObjectDataInput::new(&bytes);
            assert_eq!(read_decimal(&mut input).unwrap(), Decimal::from_str(text).unwrap());
        }
    }

    #[test]
    fn test_decimal_rejects_unsupported_scale() {
        let data = [0, 0, 0, 1, 5, 0, 0, 0, 29];
        let mut input = ObjectDataInput::new(&data);
        assert!(read_decimal(&mut input).is_err());
    }

    #[test]
    fn test_decimal_negative_scale_is_rescaled() {
        let data = [0, 0, 0, 1, 1, 0xFF, 0xFF, 0xFF, 0xFD];
        let mut input = ObjectDataInput::new(&data);
        let value = read_decimal(&mut input).unwrap();
        assert_eq!(value, Decimal::from(1000));
        assert_eq!(value.scale(), 0);

        let data = [0, 0, 0, 1, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut input = ObjectDataInput::new(&data);
        assert_eq!(read_decimal(&mut input).unwrap(), Decimal::from(-50));
    }

    #[test]
    fn test_decimal_negative_scale_overflow_rejected() {
        // 1E+29 exceeds 96 bits, 1E+39 exceeds i128.
        for scale in [-29i32, -39, i32::MIN] {
            let mut output = ObjectDataOutput::new();
            output.write_int(1).unwrap();
            output.write_bytes(&[1]).unwrap();
            output.write_int(scale).unwrap();
            let bytes = output.into_bytes();
            let mut input = ObjectDataInput::new(&bytes);
            assert!(read_decimal(&mut input).is_err());
        }
    }

    #[test]
    fn test_decimal_rejects_oversized_value() {
        let mut output = ObjectDataOutput::new();
        output.write_int(17).unwrap();
        output.write_bytes(&[1; 17]).unwrap();
        output.write_int(0).unwrap();
        let bytes = output.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        assert!(read_decimal(&mut input).is_err());
    }

    #[test]
    fn test_time_layout() {
        let mut output = ObjectDataOutput::new();
        let time = NaiveTime::from_hms_nano_opt(13, 45, 7, 500).unwrap();
        write_time(&mut output, &time).unwrap();
        assert_eq!(output.as_bytes(), &[13, 45, 7, 0, 0, 1, 0xF4]);
    }

    #[test]
    fn test_leap_second_is_clamped() {
        let mut output = ObjectDataOutput::new();
        let time = NaiveTime::from_hms_nano_opt(23, 59, 59, 1_500_000_000).unwrap();
        write_time(&mut output, &time).unwrap();
        let bytes = output.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(
            read_time(&mut input).unwrap(),
            NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap()
        );
    }

    #[test]
    fn test_date_layout() {
        let mut output = ObjectDataOutput::new();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        write_date(&mut output, &date).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0x07, 0xE8, 2, 29]);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let data = [0, 0, 0x07, 0xE8, 2, 30];
        let mut input = ObjectDataInput::new(&data);
        assert!(read_date(&mut input).is_err());
    }

    #[test]
    fn test_timestamp_with_timezone_keeps_offset() {
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let value = offset.with_ymd_and_hms(1999, 12, 31, 23, 59, 58).unwrap();
        let mut output = ObjectDataOutput::new();
        write_timestamp_with_timezone(&mut output, &value).unwrap();
        let bytes = output.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        let decoded = read_timestamp_with_timezone(&mut input).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.offset().local_minus_utc(), -18000);
    }

    #[test]
    fn test_boolean_array_is_bit_packed() {
        let mut output = ObjectDataOutput::new();
        let values = [true, false, true, false, false, false, false, false, true];
        write_boolean_array(&mut output, &values).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 9, 0b0000_0101, 0b0000_0001]);
        let bytes = output.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        assert_eq!(read_boolean_array(&mut input).unwrap(), values.to_vec());
    }

    #[test]
    fn test_negative_count_rejected() {
        let data = [0xFF, 0xFF, 0xFF, 0xFE];
        let mut input = ObjectDataInput::new(&data);
        assert!(read_count(&mut input).is_err());
    }
}
