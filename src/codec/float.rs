//! Little-endian IEEE 754 arrays for FLOAT and DOUBLE columns.

use super::finish_stream;
use crate::error::DecodeError;
use crate::offset::Offset;

/// Decode `num_values` 32-bit floats from a stream of `byte_length` bytes.
pub fn decode_floats_le(
    data: &[u8],
    offset: &mut Offset,
    num_values: usize,
    byte_length: usize,
) -> Result<Vec<f32>, DecodeError> {
    let start = offset.get();
    let bytes = offset.take(data, num_values.saturating_mul(4))?;
    let values = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    finish_stream(offset, start, byte_length)?;
    Ok(values)
}

/// Decode `num_values` 64-bit doubles from a stream of `byte_length` bytes.
pub fn decode_doubles_le(
    data: &[u8],
    offset: &mut Offset,
    num_values: usize,
    byte_length: usize,
) -> Result<Vec<f64>, DecodeError> {
    let start = offset.get();
    let bytes = offset.take(data, num_values.saturating_mul(8))?;
    let values = bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect();
    finish_stream(offset, start, byte_length)?;
    Ok(values)
}

pub fn encode_floats_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn encode_doubles_le(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
