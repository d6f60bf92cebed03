//! UTF-8 and FSST helpers shared by string vectors and the string decoder.

pub mod fsst;

use std::borrow::Cow;

use crate::error::DecodeError;

/// Spans at least this long go through the bulk standard library decoder.
pub const BULK_DECODE_MIN_LENGTH: usize = 12;

const REPLACEMENT: char = '\u{FFFD}';

/// Decode `buf[start..end]` as UTF-8, replacing malformed sequences with
/// U+FFFD.
///
/// Long spans use the bulk decoder, short spans a hand-written state machine;
/// both replace each maximal invalid subpart with a single U+FFFD and so give
/// identical results.
///
/// # Errors
/// `DecodeError::InvalidData` if the range is reversed or out of bounds.
pub fn decode_string(buf: &[u8], start: usize, end: usize) -> Result<Cow<'_, str>, DecodeError> {
    let bytes = buf.get(start..end).ok_or_else(|| {
        DecodeError::InvalidData(format!(
            "string range {}..{} outside of a {} byte buffer",
            start,
            end,
            buf.len()
        ))
    })?;
    Ok(decode_utf8(bytes))
}

/// Decode a byte span as UTF-8 with replacement.
#[inline]
pub fn decode_utf8(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.len() >= BULK_DECODE_MIN_LENGTH {
        String::from_utf8_lossy(bytes)
    } else {
        Cow::Owned(decode_utf8_short(bytes))
    }
}

fn decode_utf8_short(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        let lead = bytes[index];
        if lead < 0x80 {
            out.push(lead as char);
            index += 1;
            continue;
        }

        // sequence width and the allowed range of the second byte
        let (width, low, high) = match lead {
            0xC2..=0xDF => (2, 0x80, 0xBF),
            0xE0 => (3, 0xA0, 0xBF),
            0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80, 0xBF),
            0xED => (3, 0x80, 0x9F),
            0xF0 => (4, 0x90, 0xBF),
            0xF1..=0xF3 => (4, 0x80, 0xBF),
            0xF4 => (4, 0x80, 0x8F),
            _ => {
                out.push(REPLACEMENT);
                index += 1;
                continue;
            }
        };

        let mut code = (lead & (0x7F >> width)) as u32;
        let mut consumed = 1;
        let mut complete = true;
        while consumed < width {
            let (low, high) = if consumed == 1 { (low, high) } else { (0x80, 0xBF) };
            match bytes.get(index + consumed) {
                Some(&byte) if (low..=high).contains(&byte) => {
                    code = (code << 6) | (byte & 0x3F) as u32;
                    consumed += 1;
                }
                _ => {
                    complete = false;
                    break;
                }
            }
        }

        if complete {
            out.push(char::from_u32(code).unwrap_or(REPLACEMENT));
        } else {
            out.push(REPLACEMENT);
        }
        index += consumed;
    }
    out
}
