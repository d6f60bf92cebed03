//! Decoded, queryable column vectors.
//!
//! Every vector has a name, a size (feature count) and an optional present
//! bitset. Numeric columns come in flat, const and sequence representations;
//! string columns in flat, dictionary and FSST-dictionary representations.
//! Dictionaries are held behind `Arc` so sibling columns of a shared
//! dictionary struct can alias them.

mod bitvector;
mod constant;
mod flat;
mod sequence;
mod string;

pub use bitvector::BitVector;
pub use constant::ConstVector;
pub use flat::{BooleanVector, FlatVector};
pub use sequence::{SequenceValue, SequenceVector};
pub use string::{
    expand_offsets, Dictionary, FsstDictionary, StringDictionaryVector, StringFlatVector,
    StringFsstDictionaryVector, StringVector,
};

use std::borrow::Cow;
use std::fmt::Debug;

/// In-memory representation picked for an integer column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorType {
    /// Every value materialised
    Flat,
    /// One value repeated
    Const,
    /// `base + index * delta`
    Sequence,
}

/// Read access shared by every vector.
pub trait Vector {
    /// Value handed out by [`Vector::value`]
    type Value<'a>: PartialEq + Debug
    where
        Self: 'a;

    fn name(&self) -> &str;

    /// Number of features.
    fn size(&self) -> usize;

    /// Present bitset, `None` if every value is present.
    fn nullability(&self) -> Option<&BitVector>;

    /// Value at `index`.
    ///
    /// Only meaningful where [`Vector::has`] is true; absent positions return
    /// the type's placeholder value.
    ///
    /// # Panics
    /// If `index >= size()`.
    fn value(&self, index: usize) -> Self::Value<'_>;

    /// Whether `index` holds a value.
    fn has(&self, index: usize) -> bool {
        index < self.size() && self.nullability().map_or(true, |bits| bits.get(index))
    }

    /// Value at `index`, `None` if absent or out of range.
    fn get(&self, index: usize) -> Option<Self::Value<'_>> {
        if self.has(index) {
            Some(self.value(index))
        } else {
            None
        }
    }

    /// Indices of present values matching `predicate`.
    fn select<'s, F>(&'s self, mut predicate: F) -> Vec<usize>
    where
        F: FnMut(&Self::Value<'s>) -> bool,
    {
        (0..self.size())
            .filter(|&index| self.has(index) && predicate(&self.value(index)))
            .collect()
    }

    /// Indices of present values equal to `expected`.
    fn select_eq<'s>(&'s self, expected: &Self::Value<'s>) -> Vec<usize> {
        (0..self.size())
            .filter(|&index| self.has(index) && self.value(index) == *expected)
            .collect()
    }
}

/// Integer column in one of its three representations
#[derive(Debug, Clone, PartialEq)]
pub enum NumericVector<T: SequenceValue> {
    Flat(FlatVector<T>),
    Const(ConstVector<T>),
    Sequence(SequenceVector<T>),
}

impl<T: SequenceValue> NumericVector<T> {
    pub fn vector_type(&self) -> VectorType {
        match self {
            NumericVector::Flat(_) => VectorType::Flat,
            NumericVector::Const(_) => VectorType::Const,
            NumericVector::Sequence(_) => VectorType::Sequence,
        }
    }
}

impl<T: SequenceValue> Vector for NumericVector<T> {
    type Value<'a> = T where Self: 'a;

    fn name(&self) -> &str {
        match self {
            NumericVector::Flat(v) => v.name(),
            NumericVector::Const(v) => v.name(),
            NumericVector::Sequence(v) => v.name(),
        }
    }

    fn size(&self) -> usize {
        match self {
            NumericVector::Flat(v) => v.size(),
            NumericVector::Const(v) => v.size(),
            NumericVector::Sequence(v) => v.size(),
        }
    }

    fn nullability(&self) -> Option<&BitVector> {
        match self {
            NumericVector::Flat(v) => v.nullability(),
            NumericVector::Const(v) => v.nullability(),
            NumericVector::Sequence(v) => v.nullability(),
        }
    }

    fn value(&self, index: usize) -> T {
        match self {
            NumericVector::Flat(v) => v.value(index),
            NumericVector::Const(v) => v.value(index),
            NumericVector::Sequence(v) => v.value(index),
        }
    }
}

/// A single value read from a [`ColumnVector`]
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<'a> {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(Cow<'a, str>),
}

impl PropertyValue<'_> {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::Int(v) => Some(v as i64),
            PropertyValue::UInt(v) => Some(v as i64),
            PropertyValue::Long(v) => Some(v),
            PropertyValue::ULong(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

/// A decoded property column of any type
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnVector {
    Boolean(BooleanVector),
    Int(NumericVector<i32>),
    UInt(NumericVector<u32>),
    Long(NumericVector<i64>),
    ULong(NumericVector<u64>),
    Float(FlatVector<f32>),
    Double(FlatVector<f64>),
    String(StringVector),
}

macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            ColumnVector::Boolean($v) => $body,
            ColumnVector::Int($v) => $body,
            ColumnVector::UInt($v) => $body,
            ColumnVector::Long($v) => $body,
            ColumnVector::ULong($v) => $body,
            ColumnVector::Float($v) => $body,
            ColumnVector::Double($v) => $body,
            ColumnVector::String($v) => $body,
        }
    };
}

impl ColumnVector {
    pub fn name(&self) -> &str {
        dispatch!(self, v => v.name())
    }

    pub fn size(&self) -> usize {
        dispatch!(self, v => v.size())
    }

    pub fn nullability(&self) -> Option<&BitVector> {
        dispatch!(self, v => v.nullability())
    }

    pub fn has(&self, index: usize) -> bool {
        dispatch!(self, v => v.has(index))
    }

    /// Value at `index` as a dynamically typed value, `None` if absent.
    pub fn get(&self, index: usize) -> Option<PropertyValue<'_>> {
        match self {
            ColumnVector::Boolean(v) => v.get(index).map(PropertyValue::Bool),
            ColumnVector::Int(v) => v.get(index).map(PropertyValue::Int),
            ColumnVector::UInt(v) => v.get(index).map(PropertyValue::UInt),
            ColumnVector::Long(v) => v.get(index).map(PropertyValue::Long),
            ColumnVector::ULong(v) => v.get(index).map(PropertyValue::ULong),
            ColumnVector::Float(v) => v.get(index).map(PropertyValue::Float),
            ColumnVector::Double(v) => v.get(index).map(PropertyValue::Double),
            ColumnVector::String(v) => v.get(index).map(PropertyValue::String),
        }
    }

    /// Representation of an integer column, `None` for other types.
    pub fn vector_type(&self) -> Option<VectorType> {
        match self {
            ColumnVector::Int(v) => Some(v.vector_type()),
            ColumnVector::UInt(v) => Some(v.vector_type()),
            ColumnVector::Long(v) => Some(v.vector_type()),
            ColumnVector::ULong(v) => Some(v.vector_type()),
            _ => None,
        }
    }

    /// All values, `None` at absent positions.
    pub fn to_values(&self) -> Vec<Option<PropertyValue<'_>>> {
        (0..self.size()).map(|index| self.get(index)).collect()
    }

    pub fn as_string(&self) -> Option<&StringVector> {
        match self {
            ColumnVector::String(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints() -> NumericVector<i32> {
        NumericVector::Flat(FlatVector::new(
            "height",
            vec![10, 0, 30, 10],
            Some(BitVector::from_bools(&[true, false, true, true])),
        ))
    }

    #[test]
    fn test_has_and_get() {
        let vector = ints();
        assert!(vector.has(0));
        assert!(!vector.has(1));
        assert!(!vector.has(4));
        assert_eq!(vector.get(1), None);
        assert_eq!(vector.get(2), Some(30));
        assert_eq!(vector.get(9), None);
    }

    #[test]
    fn test_select_skips_absent() {
        let vector = ints();
        assert_eq!(vector.select(|v| *v < 20), vec![0, 3]);
        assert_eq!(vector.select_eq(&10), vec![0, 3]);
        // the padded zero at index 1 is absent
        assert!(vector.select_eq(&0).is_empty());
    }

    #[test]
    fn test_column_vector_dynamic_access() {
        let column = ColumnVector::Int(ints());
        assert_eq!(column.name(), "height");
        assert_eq!(column.size(), 4);
        assert_eq!(column.vector_type(), Some(VectorType::Flat));
        assert_eq!(
            column.to_values(),
            vec![
                Some(PropertyValue::Int(10)),
                None,
                Some(PropertyValue::Int(30)),
                Some(PropertyValue::Int(10)),
            ]
        );
        assert_eq!(column.get(0).and_then(|v| v.as_i64()), Some(10));
    }

    #[test]
    fn test_numeric_representations() {
        let constant = NumericVector::Const(ConstVector::new("c", 7u32, 3, None));
        assert_eq!(constant.vector_type(), VectorType::Const);
        assert_eq!(constant.select_eq(&7), vec![0, 1, 2]);

        let sequence = NumericVector::Sequence(SequenceVector::new("id", 5i64, 2, 4));
        assert_eq!(sequence.vector_type(), VectorType::Sequence);
        assert_eq!(
            (0..4).map(|i| sequence.value(i)).collect::<Vec<_>>(),
            vec![5, 7, 9, 11]
        );
    }
}
