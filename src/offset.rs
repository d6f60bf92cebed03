//! Read position shared by every decoder.
//!
//! Decoders take the tile buffer as `&[u8]` plus a `&mut Offset`, and move the
//! offset forward as they consume bytes. Classification helpers that only peek
//! at a stream work on a copy and leave the caller's offset untouched.

use crate::error::DecodeError;

/// Byte position inside a tile buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Offset(usize);

impl Offset {
    /// Create an offset at the given position.
    pub fn new(position: usize) -> Self {
        Self(position)
    }

    /// Current position.
    #[inline]
    pub fn get(&self) -> usize {
        self.0
    }

    /// Move to an absolute position.
    #[inline]
    pub fn set(&mut self, position: usize) {
        self.0 = position;
    }

    /// Advance by `count` bytes.
    #[inline]
    pub fn add(&mut self, count: usize) {
        self.0 += count;
    }

    /// Advance by one byte, returning the position before the move.
    #[inline]
    pub fn increment(&mut self) -> usize {
        let previous = self.0;
        self.0 += 1;
        previous
    }

    /// Read one byte and advance past it.
    #[inline]
    pub fn read_u8(&mut self, data: &[u8]) -> Result<u8, DecodeError> {
        match data.get(self.0) {
            Some(&byte) => {
                self.0 += 1;
                Ok(byte)
            }
            None => Err(self.eof(data, 1)),
        }
    }

    /// Borrow the next `len` bytes and advance past them.
    #[inline]
    pub fn take<'a>(&mut self, data: &'a [u8], len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .0
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| self.eof(data, len))?;
        let slice = &data[self.0..end];
        self.0 = end;
        Ok(slice)
    }

    /// Fail unless `len` more bytes are available.
    pub fn ensure(&self, data: &[u8], len: usize) -> Result<(), DecodeError> {
        match self.0.checked_add(len) {
            Some(end) if end <= data.len() => Ok(()),
            _ => Err(self.eof(data, len)),
        }
    }

    fn eof(&self, data: &[u8], needed: usize) -> DecodeError {
        DecodeError::UnexpectedEof {
            offset: self.0,
            needed,
            available: data.len().saturating_sub(self.0),
        }
    }
}

impl From<usize> for Offset {
    fn from(position: usize) -> Self {
        Self(position)
    }
}
