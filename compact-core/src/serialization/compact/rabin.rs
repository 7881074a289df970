//! 64-bit Rabin fingerprint used to derive schema ids.
//!
//! The seed and table are shared by every Compact implementation, so the
//! same `(type_name, fields)` pair produces the same id in every language.

use super::FieldKind;

/// Initial fingerprint value and generator polynomial.
pub const RABIN_FINGERPRINT_INIT: u64 = 0xc15d213aa4d7a795;

const FP_TABLE: [u64; 256] = build_table();

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut fp = i as u64;
        let mut round = 0;
        while round < 8 {
            fp = (fp >> 1) ^ (RABIN_FINGERPRINT_INIT & (fp & 1).wrapping_neg());
            round += 1;
        }
        table[i] = fp;
        i += 1;
    }
    table
}

/// Folds one byte into the fingerprint.
#[inline]
pub fn fingerprint_byte(fp: u64, byte: u8) -> u64 {
    (fp >> 8) ^ FP_TABLE[((fp ^ byte as u64) & 0xff) as usize]
}

/// Folds a 32-bit value as four little-endian bytes.
pub fn fingerprint_int(fp: u64, value: i32) -> u64 {
    value
        .to_le_bytes()
        .iter()
        .fold(fp, |fp, &b| fingerprint_byte(fp, b))
}

/// Folds a string as its UTF-8 byte length followed by the bytes.
pub fn fingerprint_str(fp: u64, value: &str) -> u64 {
    let bytes = value.as_bytes();
    let fp = fingerprint_int(fp, bytes.len() as i32);
    bytes.iter().fold(fp, |fp, &b| fingerprint_byte(fp, b))
}

/// Computes the schema id for a type name and fields already sorted by name.
pub fn schema_fingerprint<'a, I>(type_name: &str, fields: I) -> i64
where
    I: ExactSizeIterator<Item = (&'a str, FieldKind)>,
{
    let mut fp = fingerprint_str(RABIN_FINGERPRINT_INIT, type_name);
    fp = fingerprint_int(fp, fields.len() as i32);
    for (name, kind) in fields {
        fp = fingerprint_str(fp, name);
        fp = fingerprint_int(fp, kind.id());
    }
    fp as i64
}
