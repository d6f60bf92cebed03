//! Zigzag mapping between signed and unsigned integers.
//!
//! 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
//!
//! The `f64` variants use arithmetic instead of bit operations so that
//! values beyond 32 bits stay exact up to 2^53.

use super::Word;

#[inline]
pub fn encode_zigzag_i32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
pub fn decode_zigzag_i32(encoded: u32) -> i32 {
    ((encoded >> 1) as i32) ^ -((encoded & 1) as i32)
}

#[inline]
pub fn encode_zigzag_i64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub fn decode_zigzag_i64(encoded: u64) -> i64 {
    ((encoded >> 1) as i64) ^ -((encoded & 1) as i64)
}

#[inline]
pub fn encode_zigzag_f64(value: f64) -> f64 {
    if value >= 0.0 {
        value * 2.0
    } else {
        value * -2.0 - 1.0
    }
}

#[inline]
pub fn decode_zigzag_f64(encoded: f64) -> f64 {
    if encoded % 2.0 == 1.0 {
        (encoded + 1.0) / -2.0
    } else {
        encoded / 2.0
    }
}

/// Zigzag-decode every word in place.
pub fn decode_zigzag_in_place<W: Word>(values: &mut [W]) {
    for value in values.iter_mut() {
        *value = value.zigzag_decode();
    }
}

/// Zigzag-encode every word.
pub fn encode_zigzag<W: Word>(values: &[W]) -> Vec<W> {
    values.iter().map(|v| v.zigzag_encode()).collect()
}
