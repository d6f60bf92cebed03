//! ORC-style byte RLE, used for present streams and boolean columns.
//!
//! A control byte `h <= 0x7F` starts a run of `h + 3` copies of the next
//! byte. A control byte `h >= 0x80` is followed by `256 - h` literal bytes.

use crate::error::DecodeError;
use crate::offset::Offset;
use crate::vector::BitVector;

const MIN_RUN: usize = 3;
const MAX_RUN: usize = 0x7F + MIN_RUN;
const MAX_LITERALS: usize = 128;

/// Decode `num_bytes` bytes of byte RLE.
///
/// The decoder stops as soon as `num_bytes` are produced; a final group that
/// runs past the count is cut to fit. Callers that know the stream's byte
/// length should move the offset to its end afterwards.
pub fn decode_byte_rle(
    data: &[u8],
    offset: &mut Offset,
    num_bytes: usize,
) -> Result<Vec<u8>, DecodeError> {
    let mut values = Vec::with_capacity(num_bytes);
    while values.len() < num_bytes {
        let header = offset.read_u8(data)? as usize;
        if header <= 0x7F {
            let count = header + MIN_RUN;
            let value = offset.read_u8(data)?;
            values.extend(std::iter::repeat(value).take(count));
        } else {
            let count = 256 - header;
            values.extend_from_slice(offset.take(data, count)?);
        }
    }
    values.truncate(num_bytes);
    Ok(values)
}

/// Byte RLE encode.
pub fn encode_byte_rle(values: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() / 2 + 2);
    let mut literals: Vec<u8> = Vec::with_capacity(MAX_LITERALS);
    let mut index = 0;

    while index < values.len() {
        let value = values[index];
        let mut run = 1;
        while index + run < values.len() && values[index + run] == value && run < MAX_RUN {
            run += 1;
        }

        if run >= MIN_RUN {
            flush_literals(&mut literals, &mut out);
            out.push((run - MIN_RUN) as u8);
            out.push(value);
            index += run;
        } else {
            literals.push(value);
            index += 1;
            if literals.len() == MAX_LITERALS {
                flush_literals(&mut literals, &mut out);
            }
        }
    }
    flush_literals(&mut literals, &mut out);
    out
}

fn flush_literals(literals: &mut Vec<u8>, out: &mut Vec<u8>) {
    if literals.is_empty() {
        return;
    }
    out.push((256 - literals.len()) as u8);
    out.append(literals);
}

/// Decode `num_booleans` bit-packed booleans stored as byte RLE.
pub fn decode_boolean_rle(
    data: &[u8],
    offset: &mut Offset,
    num_booleans: usize,
) -> Result<BitVector, DecodeError> {
    let bytes = decode_byte_rle(data, offset, num_booleans.div_ceil(8))?;
    BitVector::new(bytes, num_booleans)
}

/// Decode a sparse boolean stream of `num_values` present booleans and
/// scatter it over `present`; absent positions are `false`.
pub fn decode_nullable_boolean_rle(
    data: &[u8],
    offset: &mut Offset,
    num_values: usize,
    present: &BitVector,
) -> Result<BitVector, DecodeError> {
    let dense = decode_boolean_rle(data, offset, num_values)?;
    let expected = present.count_ones();
    if expected != num_values {
        return Err(DecodeError::InvalidData(format!(
            "present stream marks {} values but the boolean stream holds {}",
            expected, num_values
        )));
    }
    let mut values = BitVector::with_size(present.size());
    let mut next = 0;
    for index in 0..present.size() {
        if present.get(index) {
            values.set(index, dense.get(next));
            next += 1;
        }
    }
    Ok(values)
}

/// Bit-pack and byte RLE encode a bitset.
pub fn encode_boolean_rle(bits: &BitVector) -> Vec<u8> {
    encode_byte_rle(&bits.as_bytes()[..bits.size().div_ceil(8)])
}
