use std::fmt::Debug;

use super::{BitVector, Vector};

/// One value repeated `size` times
#[derive(Debug, Clone, PartialEq)]
pub struct ConstVector<T> {
    name: String,
    value: T,
    size: usize,
    nullability: Option<BitVector>,
}

impl<T> ConstVector<T> {
    pub fn new(
        name: impl Into<String>,
        value: T,
        size: usize,
        nullability: Option<BitVector>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            size,
            nullability,
        }
    }

    pub fn constant(&self) -> &T {
        &self.value
    }
}

impl<T: Copy + PartialEq + Debug> Vector for ConstVector<T> {
    type Value<'a> = T where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.size
    }

    fn nullability(&self) -> Option<&BitVector> {
        self.nullability.as_ref()
    }

    fn value(&self, index: usize) -> T {
        assert!(
            index < self.size,
            "index {} out of range for const vector of size {}",
            index,
            self.size
        );
        self.value
    }
}
