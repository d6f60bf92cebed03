//! Varint encoding and decoding.
//!
//! Values are stored little-endian in groups of 7 bits, the MSB of each byte
//! being the continuation flag (the Protocol Buffers scheme).
//!
//! The 32-bit decoder reads at most 5 bytes and only keeps the low 4 bits of
//! the 5th byte, as in the pbf decoder the format was derived from. A 5th
//! byte that still has its continuation bit set is rejected.

use crate::error::DecodeError;
use crate::offset::Offset;

const MAX_VARINT32_BYTES: usize = 5;
const MAX_VARINT64_BYTES: usize = 10;

// ============================================================================
// Decoding Functions
// ============================================================================

/// Decode a single 32-bit varint.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the 5th byte has its continuation bit set
#[inline]
pub fn decode_varint_u32(data: &[u8], offset: &mut Offset) -> Result<u32, DecodeError> {
    let start = offset.get();
    let mut value: u32 = 0;

    for index in 0..MAX_VARINT32_BYTES {
        let byte = offset.read_u8(data)?;
        if index == MAX_VARINT32_BYTES - 1 {
            value |= ((byte & 0x0F) as u32) << 28;
            if byte & 0x80 != 0 {
                return Err(DecodeError::InvalidVarint { offset: start });
            }
            return Ok(value);
        }

        value |= ((byte & 0x7F) as u32) << (7 * index);
        if byte < 0x80 {
            return Ok(value);
        }
    }

    Err(DecodeError::InvalidVarint { offset: start })
}

/// Decode a single 64-bit varint.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_varint_u64(data: &[u8], offset: &mut Offset) -> Result<u64, DecodeError> {
    let start = offset.get();
    let mut value: u64 = 0;
    let mut shift: u32 = 0;

    for _ in 0..MAX_VARINT64_BYTES {
        let byte = offset.read_u8(data)?;
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(DecodeError::InvalidVarint { offset: start })
}

/// Decode a 64-bit varint into an `f64`.
///
/// Exact for values up to 2^53; larger values round to the nearest double.
#[inline]
pub fn decode_varint_f64(data: &[u8], offset: &mut Offset) -> Result<f64, DecodeError> {
    decode_varint_u64(data, offset).map(|value| value as f64)
}

/// Decode `count` consecutive 32-bit varints.
pub fn decode_varints_u32(
    data: &[u8],
    offset: &mut Offset,
    count: usize,
) -> Result<Vec<u32>, DecodeError> {
    // every varint takes at least one byte
    offset.ensure(data, count)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(decode_varint_u32(data, offset)?);
    }
    Ok(values)
}

/// Decode `count` consecutive 64-bit varints.
pub fn decode_varints_u64(
    data: &[u8],
    offset: &mut Offset,
    count: usize,
) -> Result<Vec<u64>, DecodeError> {
    offset.ensure(data, count)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(decode_varint_u64(data, offset)?);
    }
    Ok(values)
}

/// Decode `count` consecutive 64-bit varints as `f64` values.
pub fn decode_varints_f64(
    data: &[u8],
    offset: &mut Offset,
    count: usize,
) -> Result<Vec<f64>, DecodeError> {
    offset.ensure(data, count)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(decode_varint_f64(data, offset)?);
    }
    Ok(values)
}

/// Skip over a varint without decoding its value.
#[inline]
pub fn skip_varint(data: &[u8], offset: &mut Offset) -> Result<(), DecodeError> {
    let start = offset.get();
    for _ in 0..MAX_VARINT64_BYTES {
        if offset.read_u8(data)? & 0x80 == 0 {
            return Ok(());
        }
    }
    Err(DecodeError::InvalidVarint { offset: start })
}

// ============================================================================
// Encoding Functions
// ============================================================================

/// Append `value` as a varint to `out`.
#[inline]
pub fn encode_varint_into(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Encode an unsigned integer as a varint.
#[inline]
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut result = Vec::with_capacity(MAX_VARINT64_BYTES);
    encode_varint_into(value, &mut result);
    result
}

/// Append a slice of 32-bit values as varints.
pub fn encode_varints_u32(values: &[u32], out: &mut Vec<u8>) {
    for &value in values {
        encode_varint_into(value as u64, out);
    }
}

/// Append a slice of 64-bit values as varints.
pub fn encode_varints_u64(values: &[u64], out: &mut Vec<u8>) {
    for &value in values {
        encode_varint_into(value, out);
    }
}
