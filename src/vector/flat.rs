use std::fmt::Debug;

use super::{BitVector, Vector};

/// Fully materialised column; absent positions hold a zero placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVector<T> {
    name: String,
    data: Vec<T>,
    nullability: Option<BitVector>,
}

impl<T> FlatVector<T> {
    pub fn new(name: impl Into<String>, data: Vec<T>, nullability: Option<BitVector>) -> Self {
        Self {
            name: name.into(),
            data,
            nullability,
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

impl<T: Copy + PartialEq + Debug> Vector for FlatVector<T> {
    type Value<'a> = T where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn nullability(&self) -> Option<&BitVector> {
        self.nullability.as_ref()
    }

    #[inline]
    fn value(&self, index: usize) -> T {
        self.data[index]
    }
}

/// Boolean column stored as a bitset
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanVector {
    name: String,
    data: BitVector,
    nullability: Option<BitVector>,
}

impl BooleanVector {
    pub fn new(name: impl Into<String>, data: BitVector, nullability: Option<BitVector>) -> Self {
        Self {
            name: name.into(),
            data,
            nullability,
        }
    }

    pub fn data(&self) -> &BitVector {
        &self.data
    }
}

impl Vector for BooleanVector {
    type Value<'a> = bool where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.data.size()
    }

    fn nullability(&self) -> Option<&BitVector> {
        self.nullability.as_ref()
    }

    fn value(&self, index: usize) -> bool {
        assert!(
            index < self.data.size(),
            "index {} out of range for boolean vector of size {}",
            index,
            self.data.size()
        );
        self.data.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_vector() {
        let vector = FlatVector::new("rank", vec![1.5f64, 0.0, -2.0], None);
        assert_eq!(vector.size(), 3);
        assert!(vector.has(1));
        assert_eq!(vector.get(2), Some(-2.0));
        assert_eq!(vector.select(|v| *v > 0.0), vec![0]);
    }

    #[test]
    #[should_panic]
    fn test_flat_value_out_of_range() {
        FlatVector::new("rank", vec![1u32], None).value(1);
    }

    #[test]
    fn test_boolean_vector() {
        let vector = BooleanVector::new(
            "oneway",
            BitVector::from_bools(&[true, false, false]),
            Some(BitVector::from_bools(&[true, true, false])),
        );
        assert_eq!(vector.get(0), Some(true));
        assert_eq!(vector.get(1), Some(false));
        assert_eq!(vector.get(2), None);
        assert_eq!(vector.select_eq(&false), vec![1]);
    }
}
