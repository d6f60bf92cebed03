use std::fmt::Debug;

use super::{BitVector, Vector};

/// Integer types a [`SequenceVector`] can generate
pub trait SequenceValue: Copy + PartialEq + Debug + Default {
    /// `base + index * delta`, wrapping.
    fn nth(base: Self, delta: Self, index: usize) -> Self;
}

macro_rules! impl_sequence_value {
    ($($t:ty),*) => {
        $(
            impl SequenceValue for $t {
                #[inline]
                fn nth(base: Self, delta: Self, index: usize) -> Self {
                    base.wrapping_add(delta.wrapping_mul(index as $t))
                }
            }
        )*
    };
}

impl_sequence_value!(i32, u32, i64, u64);

/// Arithmetic sequence, typically feature ids
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceVector<T> {
    name: String,
    base: T,
    delta: T,
    size: usize,
}

impl<T: SequenceValue> SequenceVector<T> {
    pub fn new(name: impl Into<String>, base: T, delta: T, size: usize) -> Self {
        Self {
            name: name.into(),
            base,
            delta,
            size,
        }
    }

    pub fn base(&self) -> T {
        self.base
    }

    pub fn delta(&self) -> T {
        self.delta
    }
}

impl<T: SequenceValue> Vector for SequenceVector<T> {
    type Value<'a> = T where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.size
    }

    // sequences only cover columns where every feature is present
    fn nullability(&self) -> Option<&BitVector> {
        None
    }

    fn value(&self, index: usize) -> T {
        assert!(
            index < self.size,
            "index {} out of range for sequence vector of size {}",
            index,
            self.size
        );
        T::nth(self.base, self.delta, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_values() {
        let vector = SequenceVector::new("id", 1u32, 1, 5);
        assert_eq!(vector.select(|_| true), vec![0, 1, 2, 3, 4]);
        assert_eq!(vector.get(4), Some(5));
        assert_eq!(vector.select_eq(&3), vec![2]);
    }

    #[test]
    fn test_negative_delta_wraps() {
        let vector = SequenceVector::new("id", 0i32, -3, 3);
        assert_eq!(vector.value(2), -6);
        assert_eq!(u64::nth(u64::MAX, 1, 1), 0);
    }
}
