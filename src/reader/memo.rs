//! Memo block resolution.
//!
//! A memo field stores a pointer into the companion memo file, in units of
//! the file's block size. Resolution is best effort: a missing memo buffer,
//! a non-numeric or non-positive pointer, a non-text block, or a file
//! version without a known block layout all yield `Null`. Only a pointer
//! that lands past the end of the memo buffer is a hard error.

use super::field::{ascii_str, read_i32_le, read_u32_be, slice, trim_leading_spaces};
use crate::error::Result;
use crate::{Field, FileVersion, Value};

/// Memo Block
/// 00 - 03: Type: 0 = image, 1 = text (big-endian)
/// 04 - 07: Length (big-endian)
/// 08 - N : Data
const TEXT_BLOCK: u32 = 1;

pub(crate) fn resolve(
    field: &Field,
    record: &[u8],
    position: usize,
    ctx: &super::field::DecodeContext<'_>,
) -> Result<Value> {
    let memo = match ctx.memo {
        Some(memo) => memo,
        None => return Ok(Value::Null),
    };

    // Visual FoxPro stores the pointer as a binary integer; older formats
    // store it as right-justified ASCII digits.
    let block_index: i64 = if ctx.version.is_visual_fox_pro() {
        read_i32_le(record, position, "memo block pointer")? as i64
    } else {
        let window = slice(record, position, field.size, "memo block pointer")?;
        match ascii_str(trim_leading_spaces(window)).trim_end().parse() {
            Ok(index) => index,
            Err(_) => return Ok(Value::Null),
        }
    };

    if block_index <= 0 {
        return Ok(Value::Null);
    }

    match ctx.version {
        v if v.is_visual_fox_pro() => {}
        FileVersion::FoxPro2Memo => {}
        // Block layout unimplemented for the remaining memo formats.
        _ => return Ok(Value::Null),
    }

    // Saturating so a hostile pointer cannot wrap; the bounds check below
    // rejects it with the real buffer length in the error.
    let block_start = (ctx.memo_block_size as usize).saturating_mul(block_index as usize);
    let block_type = read_u32_be(memo, block_start, "memo block type")?;
    if block_type != TEXT_BLOCK {
        return Ok(Value::Null);
    }

    let length = read_u32_be(memo, block_start + 4, "memo block length")? as usize;
    let payload = slice(memo, block_start + 8, length, "memo block payload")?;

    Ok(Value::Text(ascii_str(payload)))
}
