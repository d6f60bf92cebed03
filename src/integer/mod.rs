//! Logical level integer techniques.
//!
//! All functions work on the raw words produced by the physical level:
//! `u32` and `u64` words, whose bits are reinterpreted as signed values where
//! a column is signed, and `f64` words used as a 53-bit-safe surrogate for
//! 64-bit integers. Arithmetic wraps for the integer words.
//!
//! Delta and zigzag decoding work in place on a uniquely owned buffer; run
//! expansion allocates.

pub mod byte_rle;
pub mod delta;
pub mod nullable;
pub mod rle;
pub mod zigzag;

use std::fmt::Debug;

/// A value word handled by the logical level techniques
pub trait Word: Copy + PartialEq + Debug + Default {
    /// Map a zigzag-encoded word to the word of its signed value.
    fn zigzag_decode(self) -> Self;

    /// Map the word of a signed value to its zigzag encoding.
    fn zigzag_encode(self) -> Self;

    fn add(self, other: Self) -> Self;

    fn sub(self, other: Self) -> Self;

    /// Interpret a run-length word; `None` if it is not a valid length.
    fn run_length(self) -> Option<usize>;

    fn from_run_length(length: usize) -> Self;
}

impl Word for u32 {
    #[inline]
    fn zigzag_decode(self) -> Self {
        zigzag::decode_zigzag_i32(self) as u32
    }

    #[inline]
    fn zigzag_encode(self) -> Self {
        zigzag::encode_zigzag_i32(self as i32)
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    #[inline]
    fn sub(self, other: Self) -> Self {
        self.wrapping_sub(other)
    }

    #[inline]
    fn run_length(self) -> Option<usize> {
        usize::try_from(self).ok()
    }

    #[inline]
    fn from_run_length(length: usize) -> Self {
        length as u32
    }
}

impl Word for u64 {
    #[inline]
    fn zigzag_decode(self) -> Self {
        zigzag::decode_zigzag_i64(self) as u64
    }

    #[inline]
    fn zigzag_encode(self) -> Self {
        zigzag::encode_zigzag_i64(self as i64)
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    #[inline]
    fn sub(self, other: Self) -> Self {
        self.wrapping_sub(other)
    }

    #[inline]
    fn run_length(self) -> Option<usize> {
        usize::try_from(self).ok()
    }

    #[inline]
    fn from_run_length(length: usize) -> Self {
        length as u64
    }
}

impl Word for f64 {
    #[inline]
    fn zigzag_decode(self) -> Self {
        zigzag::decode_zigzag_f64(self)
    }

    #[inline]
    fn zigzag_encode(self) -> Self {
        zigzag::encode_zigzag_f64(self)
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn sub(self, other: Self) -> Self {
        self - other
    }

    #[inline]
    fn run_length(self) -> Option<usize> {
        if self >= 0.0 && self.fract() == 0.0 && self <= usize::MAX as f64 {
            Some(self as usize)
        } else {
            None
        }
    }

    #[inline]
    fn from_run_length(length: usize) -> Self {
        length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_word_signed_view() {
        // -1 zigzags to 1
        assert_eq!(1u32.zigzag_decode() as i32, -1);
        assert_eq!((-1i32 as u32).zigzag_encode(), 1);
        assert_eq!(0u32.sub(1) as i32, -1);
    }

    #[test]
    fn test_f64_run_length() {
        assert_eq!(3.0f64.run_length(), Some(3));
        assert_eq!((-1.0f64).run_length(), None);
        assert_eq!(1.5f64.run_length(), None);
        assert_eq!(f64::NAN.run_length(), None);
    }
}
