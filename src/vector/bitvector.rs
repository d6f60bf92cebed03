use crate::error::DecodeError;

/// Fixed-size bitset, LSB-first within each byte.
///
/// Bit `i` lives at `buffer[i / 8]`, bit position `i % 8`. Used for present
/// (nullability) streams and boolean columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitVector {
    buffer: Vec<u8>,
    size: usize,
}

impl BitVector {
    /// Wrap an existing buffer holding at least `size` bits.
    ///
    /// # Errors
    /// `DecodeError::InvalidData` if the buffer is shorter than `ceil(size / 8)`.
    pub fn new(buffer: Vec<u8>, size: usize) -> Result<Self, DecodeError> {
        let needed = size.div_ceil(8);
        if buffer.len() < needed {
            return Err(DecodeError::InvalidData(format!(
                "bit vector of {} bits needs {} bytes, got {}",
                size,
                needed,
                buffer.len()
            )));
        }
        Ok(Self { buffer, size })
    }

    /// All-false bitset of `size` bits.
    pub fn with_size(size: usize) -> Self {
        Self {
            buffer: vec![0; size.div_ceil(8)],
            size,
        }
    }

    pub fn from_bools(bits: &[bool]) -> Self {
        let mut vector = Self::with_size(bits.len());
        for (index, &bit) in bits.iter().enumerate() {
            if bit {
                vector.buffer[index / 8] |= 1 << (index % 8);
            }
        }
        vector
    }

    /// Bit at `index`; `false` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        index < self.size && (self.buffer[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Set the bit at `index`. Writes past the end are ignored.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.size {
            return;
        }
        let mask = 1 << (index % 8);
        if value {
            self.buffer[index / 8] |= mask;
        } else {
            self.buffer[index / 8] &= !mask;
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of set bits among the first `size` bits.
    pub fn count_ones(&self) -> usize {
        let full = self.size / 8;
        let mut count: usize = self.buffer[..full]
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum();
        let rest = self.size % 8;
        if rest > 0 {
            let mask = (1u16 << rest) as u8 - 1;
            count += (self.buffer[full] & mask).count_ones() as usize;
        }
        count
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.size).map(move |index| self.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first_layout() {
        let bits = BitVector::new(vec![0b0000_0101], 3).unwrap();
        assert!(bits.get(0));
        assert!(!bits.get(1));
        assert!(bits.get(2));
        assert!(!bits.get(3));
        assert_eq!(bits.count_ones(), 2);
    }

    #[test]
    fn test_new_rejects_short_buffer() {
        assert!(BitVector::new(vec![0xFF], 9).is_err());
        assert!(BitVector::new(vec![0xFF, 0x01], 9).is_ok());
        assert!(BitVector::new(Vec::new(), 0).is_ok());
    }

    #[test]
    fn test_count_ignores_bits_past_size() {
        let bits = BitVector::new(vec![0xFF, 0xFF], 10).unwrap();
        assert_eq!(bits.count_ones(), 10);
        let bits = BitVector::new(vec![0xFF], 8).unwrap();
        assert_eq!(bits.count_ones(), 8);
    }

    #[test]
    fn test_set_and_from_bools() {
        let mut bits = BitVector::from_bools(&[true, false, false, true, true, false, false, false, true]);
        assert_eq!(bits.as_bytes(), &[0b0001_1001, 0b0000_0001]);
        bits.set(0, false);
        bits.set(1, true);
        bits.set(100, true);
        assert_eq!(
            bits.iter().collect::<Vec<_>>(),
            vec![false, true, false, true, true, false, false, false, true]
        );
    }
}
