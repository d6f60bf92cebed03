//! Nullable (sparse) variants.
//!
//! A nullable stream only stores entries for present positions. Decoding
//! scatters them over the present bitset and fills absent positions with a
//! default word, except for delta chains which carry the previous value.

use super::rle::decode_rle_unchecked_total;
use super::Word;
use crate::error::DecodeError;
use crate::vector::BitVector;

fn check_present_count(present: &BitVector, dense_len: usize) -> Result<(), DecodeError> {
    let expected = present.count_ones();
    if expected != dense_len {
        return Err(DecodeError::InvalidData(format!(
            "present stream marks {} values but the data stream holds {}",
            expected, dense_len
        )));
    }
    Ok(())
}

/// Scatter dense values over the present bitset, filling absent slots with
/// the type's default (zero).
pub fn pad_with_zeros<T: Copy + Default>(
    present: &BitVector,
    values: &[T],
) -> Result<Vec<T>, DecodeError> {
    check_present_count(present, values.len())?;
    let mut dense = values.iter().copied();
    Ok(present
        .iter()
        .map(|is_present| {
            if is_present {
                dense.next().unwrap_or_default()
            } else {
                T::default()
            }
        })
        .collect())
}

/// Zigzag-decode dense values and scatter them, zero-filling absent slots.
pub fn pad_zigzag_with_zeros<W: Word>(
    present: &BitVector,
    values: &[W],
) -> Result<Vec<W>, DecodeError> {
    check_present_count(present, values.len())?;
    let mut dense = values.iter().map(|v| v.zigzag_decode());
    Ok(present
        .iter()
        .map(|is_present| {
            if is_present {
                dense.next().unwrap_or_default()
            } else {
                W::default()
            }
        })
        .collect())
}

/// Decode a sparse zigzag-delta chain.
///
/// Absent slots repeat the previous decoded value so the chain continues
/// across them; absent leading slots hold zero.
pub fn decode_nullable_zigzag_delta<W: Word>(
    present: &BitVector,
    deltas: &[W],
) -> Result<Vec<W>, DecodeError> {
    check_present_count(present, deltas.len())?;
    let mut dense = deltas.iter();
    let mut previous = W::default();
    Ok(present
        .iter()
        .map(|is_present| {
            if is_present {
                if let Some(delta) = dense.next() {
                    previous = previous.add(delta.zigzag_decode());
                }
            }
            previous
        })
        .collect())
}

/// Decode a sparse RLE stream.
///
/// Runs describe only the present values; they are expanded densely and then
/// scattered over the present bitset.
pub fn decode_nullable_rle<W: Word>(
    data: &[W],
    runs: usize,
    present: &BitVector,
    signed: bool,
) -> Result<Vec<W>, DecodeError> {
    let dense = decode_rle_unchecked_total(data, runs)?;
    if signed {
        pad_zigzag_with_zeros(present, &dense)
    } else {
        pad_with_zeros(present, &dense)
    }
}

/// Keep only the values at present positions.
pub fn compact<T: Copy>(present: &BitVector, values: &[T]) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter(|(index, _)| present.get(*index))
        .map(|(_, &value)| value)
        .collect()
}
