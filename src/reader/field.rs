//! Primitive byte utilities and the per-type field decoder dispatch.
//!
//! Every decoder consumes a byte window of the current record and produces
//! exactly one [Value](../enum.Value.html) variant or `Null`. Header and
//! record scalars are little-endian; only the memo block header (handled in
//! [memo](../reader/memo/index.html)) is big-endian.

use chrono::naive::NaiveDate;

use super::memo;
use crate::error::{DbfError, Result};
use crate::{Field, FieldType, FileVersion, Value};

/// Everything a field decoder may need beyond the record bytes themselves.
pub(crate) struct DecodeContext<'a> {
    pub version: FileVersion,
    pub memo: Option<&'a [u8]>,
    pub memo_block_size: u32,
}

/// Bounds-checked window into `buffer`.
pub(crate) fn slice<'a>(
    buffer: &'a [u8],
    offset: usize,
    wanted: usize,
    context: &'static str,
) -> Result<&'a [u8]> {
    offset
        .checked_add(wanted)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(DbfError::OutOfBounds {
            context,
            offset,
            wanted,
            available: buffer.len(),
        })
}

pub(crate) fn read_u16_le(buffer: &[u8], offset: usize, context: &'static str) -> Result<u16> {
    let b = slice(buffer, offset, 2, context)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn read_u16_be(buffer: &[u8], offset: usize, context: &'static str) -> Result<u16> {
    let b = slice(buffer, offset, 2, context)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

pub(crate) fn read_u32_le(buffer: &[u8], offset: usize, context: &'static str) -> Result<u32> {
    let b = slice(buffer, offset, 4, context)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_u32_be(buffer: &[u8], offset: usize, context: &'static str) -> Result<u32> {
    let b = slice(buffer, offset, 4, context)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_i32_le(buffer: &[u8], offset: usize, context: &'static str) -> Result<i32> {
    let b = slice(buffer, offset, 4, context)?;
    Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_i64_le(buffer: &[u8], offset: usize, context: &'static str) -> Result<i64> {
    let b = slice(buffer, offset, 8, context)?;
    Ok(i64::from_le_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

pub(crate) fn read_f64_le(buffer: &[u8], offset: usize, context: &'static str) -> Result<f64> {
    let b = slice(buffer, offset, 8, context)?;
    Ok(f64::from_le_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

/// Byte-per-char copy. Not a charset decode: bytes >= 128 map to the char
/// with the same code point, matching the single-byte treatment of the
/// format.
pub(crate) fn ascii_str(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub(crate) fn trim_trailing_spaces(window: &[u8]) -> &[u8] {
    let mut len = window.len();
    while len > 0 && window[len - 1] == b' ' {
        len -= 1;
    }
    &window[..len]
}

pub(crate) fn trim_leading_spaces(window: &[u8]) -> &[u8] {
    let mut start = 0;
    while start < window.len() && window[start] == b' ' {
        start += 1;
    }
    &window[start..]
}

/// Parse exactly 8 ASCII digits as `YYYYMMDD`. No format fallback; an
/// impossible calendar combination yields `None`.
pub(crate) fn parse_fixed_width_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[4..6].parse().ok()?;
    let day: u32 = text[6..8].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decode one field slot at `position` into the record's byte window.
pub(crate) fn decode(
    field: &Field,
    record: &[u8],
    position: usize,
    ctx: &DecodeContext<'_>,
) -> Result<Value> {
    match field.field_type {
        FieldType::Character => {
            let window = slice(record, position, field.size, "character field")?;
            Ok(Value::Text(ascii_str(trim_trailing_spaces(window))))
        }
        FieldType::Numeric | FieldType::Float => {
            let window = slice(record, position, field.size, "numeric field")?;
            let digits = trim_leading_spaces(window);
            if digits.is_empty() {
                return Ok(Value::Null);
            }
            // A malformed literal degrades to null, never aborts the file.
            match ascii_str(digits).parse::<f64>() {
                Ok(number) => Ok(Value::Number(number)),
                Err(_) => Ok(Value::Null),
            }
        }
        FieldType::Currency => {
            let raw = read_i64_le(record, position, "currency field")?;
            Ok(Value::Number(raw as f64 / 10_000.0))
        }
        FieldType::Logical => {
            let window = slice(record, position, 1, "logical field")?;
            Ok(match window[0] {
                b'T' | b't' | b'Y' | b'y' => Value::Boolean(true),
                b'F' | b'f' | b'N' | b'n' => Value::Boolean(false),
                // `?` marks an uninitialized logical
                _ => Value::Null,
            })
        }
        FieldType::DateTime => {
            let lead = slice(record, position, 1, "datetime field")?;
            if lead[0] == b' ' {
                return Ok(Value::Null);
            }
            // TODO: decode the date and time-of-day halves instead of
            // returning the raw text
            let window = slice(record, position, 8, "datetime field")?;
            Ok(Value::Text(ascii_str(window)))
        }
        FieldType::Date => {
            let lead = slice(record, position, 1, "date field")?;
            if lead[0] == b' ' {
                return Ok(Value::Null);
            }
            let window = slice(record, position, 8, "date field")?;
            Ok(match parse_fixed_width_date(&ascii_str(window)) {
                Some(date) => Value::Date(date),
                None => Value::Null,
            })
        }
        FieldType::Double => {
            let raw = read_f64_le(record, position, "double field")?;
            Ok(Value::Number(raw))
        }
        FieldType::Integer => {
            let raw = read_i32_le(record, position, "integer field")?;
            Ok(Value::Number(raw as f64))
        }
        FieldType::Memo => memo::resolve(field, record, position, ctx),
        // Permissive default for type codes the decoder does not model.
        FieldType::Unsupported(_) => Ok(Value::Null),
    }
}
