use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;

use super::{BitVector, Vector};
use crate::error::DecodeError;
use crate::string::decode_utf8;
use crate::string::fsst::decode_fsst;

/// Check that `offsets` is non-empty, non-decreasing and ends within `data_len`.
fn validate_offsets(offsets: &[u32], data_len: usize) -> Result<(), DecodeError> {
    let last = match offsets.last() {
        Some(&last) => last as usize,
        None => {
            return Err(DecodeError::InvalidData(
                "string offsets need at least one entry".to_string(),
            ))
        }
    };
    if let Some(index) = offsets.windows(2).position(|w| w[0] > w[1]) {
        return Err(DecodeError::InvalidData(format!(
            "string offsets decrease at index {}: {} > {}",
            index,
            offsets[index],
            offsets[index + 1]
        )));
    }
    if last > data_len {
        return Err(DecodeError::InvalidData(format!(
            "string offset {} past the end of {} bytes of string data",
            last, data_len
        )));
    }
    Ok(())
}

#[inline]
fn span<'a>(data: &'a [u8], offsets: &[u32], index: usize) -> Cow<'a, str> {
    let start = offsets[index] as usize;
    let end = offsets[index + 1] as usize;
    decode_utf8(&data[start..end])
}

/// Expand per-present-value offsets (`present + 1` entries) to one span per
/// position, absent positions getting an empty span.
pub fn expand_offsets(present: &BitVector, offsets: &[u32]) -> Result<Vec<u32>, DecodeError> {
    let expected = present.count_ones() + 1;
    if offsets.len() != expected {
        return Err(DecodeError::InvalidData(format!(
            "present stream marks {} strings but {} offsets were decoded",
            expected - 1,
            offsets.len()
        )));
    }
    let mut expanded = Vec::with_capacity(present.size() + 1);
    let mut next = 0;
    expanded.push(offsets[0]);
    for is_present in present.iter() {
        if is_present {
            next += 1;
        }
        expanded.push(offsets[next]);
    }
    Ok(expanded)
}

/// Plain strings: one span of `data` per feature
#[derive(Debug, Clone, PartialEq)]
pub struct StringFlatVector {
    name: String,
    offsets: Vec<u32>,
    data: Bytes,
    nullability: Option<BitVector>,
}

impl StringFlatVector {
    /// `offsets` holds `size + 1` entries into `data`.
    pub fn new(
        name: impl Into<String>,
        offsets: Vec<u32>,
        data: Bytes,
        nullability: Option<BitVector>,
    ) -> Result<Self, DecodeError> {
        validate_offsets(&offsets, data.len())?;
        Ok(Self {
            name: name.into(),
            offsets,
            data,
            nullability,
        })
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl Vector for StringFlatVector {
    type Value<'a> = Cow<'a, str> where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.offsets.len() - 1
    }

    fn nullability(&self) -> Option<&BitVector> {
        self.nullability.as_ref()
    }

    fn value(&self, index: usize) -> Cow<'_, str> {
        span(&self.data, &self.offsets, index)
    }
}

/// Distinct strings addressed by index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    offsets: Vec<u32>,
    data: Bytes,
}

impl Dictionary {
    pub fn new(offsets: Vec<u32>, data: Bytes) -> Result<Self, DecodeError> {
        validate_offsets(&offsets, data.len())?;
        Ok(Self { offsets, data })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Cow<'_, str>> {
        if index < self.len() {
            Some(span(&self.data, &self.offsets, index))
        } else {
            None
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = Cow<'_, str>> + '_ {
        (0..self.len()).map(move |index| span(&self.data, &self.offsets, index))
    }

    fn check_indices(
        &self,
        indices: &[u32],
        nullability: Option<&BitVector>,
    ) -> Result<(), DecodeError> {
        let len = self.len();
        for (position, &index) in indices.iter().enumerate() {
            let present = nullability.map_or(true, |bits| bits.get(position));
            if present && index as usize >= len {
                return Err(DecodeError::InvalidData(format!(
                    "dictionary index {} at position {} outside of a {} entry dictionary",
                    index, position, len
                )));
            }
        }
        Ok(())
    }
}

/// Dictionary whose entries were FSST compressed on the wire.
///
/// The entries are decompressed once, when the dictionary is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsstDictionary {
    symbol_offsets: Vec<u32>,
    symbol_table: Bytes,
    dictionary: Dictionary,
}

impl FsstDictionary {
    /// Decompress `compressed` with the symbol table and split it at
    /// `offsets`, which index the decompressed bytes.
    pub fn new(
        symbol_offsets: Vec<u32>,
        symbol_table: Bytes,
        offsets: Vec<u32>,
        compressed: &[u8],
    ) -> Result<Self, DecodeError> {
        validate_offsets(&symbol_offsets, symbol_table.len())?;
        let decoded = decode_fsst(&symbol_table, &symbol_offsets, compressed)?;
        let dictionary = Dictionary::new(offsets, Bytes::from(decoded))?;
        Ok(Self {
            symbol_offsets,
            symbol_table,
            dictionary,
        })
    }

    pub fn num_symbols(&self) -> usize {
        self.symbol_offsets.len() - 1
    }

    pub fn symbol_table(&self) -> &Bytes {
        &self.symbol_table
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}

/// Strings stored as indices into a (possibly shared) dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct StringDictionaryVector {
    name: String,
    indices: Vec<u32>,
    dictionary: Arc<Dictionary>,
    nullability: Option<BitVector>,
}

impl StringDictionaryVector {
    /// Build a vector over `dictionary`. Indices at absent positions are not
    /// checked.
    pub fn new(
        name: impl Into<String>,
        indices: Vec<u32>,
        dictionary: Arc<Dictionary>,
        nullability: Option<BitVector>,
    ) -> Result<Self, DecodeError> {
        dictionary.check_indices(&indices, nullability.as_ref())?;
        Ok(Self {
            name: name.into(),
            indices,
            dictionary,
            nullability,
        })
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }
}

impl Vector for StringDictionaryVector {
    type Value<'a> = Cow<'a, str> where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.indices.len()
    }

    fn nullability(&self) -> Option<&BitVector> {
        self.nullability.as_ref()
    }

    fn value(&self, index: usize) -> Cow<'_, str> {
        self.dictionary
            .get(self.indices[index] as usize)
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// Strings stored as indices into an FSST compressed dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct StringFsstDictionaryVector {
    name: String,
    indices: Vec<u32>,
    dictionary: Arc<FsstDictionary>,
    nullability: Option<BitVector>,
}

impl StringFsstDictionaryVector {
    pub fn new(
        name: impl Into<String>,
        indices: Vec<u32>,
        dictionary: Arc<FsstDictionary>,
        nullability: Option<BitVector>,
    ) -> Result<Self, DecodeError> {
        dictionary
            .dictionary
            .check_indices(&indices, nullability.as_ref())?;
        Ok(Self {
            name: name.into(),
            indices,
            dictionary,
            nullability,
        })
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn dictionary(&self) -> &Arc<FsstDictionary> {
        &self.dictionary
    }
}

impl Vector for StringFsstDictionaryVector {
    type Value<'a> = Cow<'a, str> where Self: 'a;

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.indices.len()
    }

    fn nullability(&self) -> Option<&BitVector> {
        self.nullability.as_ref()
    }

    fn value(&self, index: usize) -> Cow<'_, str> {
        self.dictionary
            .dictionary
            .get(self.indices[index] as usize)
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// String column in one of its three representations
#[derive(Debug, Clone, PartialEq)]
pub enum StringVector {
    Flat(StringFlatVector),
    Dictionary(StringDictionaryVector),
    FsstDictionary(StringFsstDictionaryVector),
}

impl Vector for StringVector {
    type Value<'a> = Cow<'a, str> where Self: 'a;

    fn name(&self) -> &str {
        match self {
            StringVector::Flat(v) => v.name(),
            StringVector::Dictionary(v) => v.name(),
            StringVector::FsstDictionary(v) => v.name(),
        }
    }

    fn size(&self) -> usize {
        match self {
            StringVector::Flat(v) => v.size(),
            StringVector::Dictionary(v) => v.size(),
            StringVector::FsstDictionary(v) => v.size(),
        }
    }

    fn nullability(&self) -> Option<&BitVector> {
        match self {
            StringVector::Flat(v) => v.nullability(),
            StringVector::Dictionary(v) => v.nullability(),
            StringVector::FsstDictionary(v) => v.nullability(),
        }
    }

    fn value(&self, index: usize) -> Cow<'_, str> {
        match self {
            StringVector::Flat(v) => v.value(index),
            StringVector::Dictionary(v) => v.value(index),
            StringVector::FsstDictionary(v) => v.value(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::fsst::SymbolTable;

    fn dictionary(entries: &[&str]) -> Arc<Dictionary> {
        let mut offsets = vec![0u32];
        let mut data = Vec::new();
        for entry in entries {
            data.extend_from_slice(entry.as_bytes());
            offsets.push(data.len() as u32);
        }
        Arc::new(Dictionary::new(offsets, Bytes::from(data)).unwrap())
    }

    #[test]
    fn test_flat_strings() {
        let vector =
            StringFlatVector::new("name", vec![0, 5, 5, 10], Bytes::from_static(b"HelloWorld"), None)
                .unwrap();
        assert_eq!(vector.size(), 3);
        assert_eq!(vector.get(0).as_deref(), Some("Hello"));
        assert_eq!(vector.get(1).as_deref(), Some(""));
        assert_eq!(vector.select_eq(&Cow::Borrowed("World")), vec![2]);
    }

    #[test]
    fn test_dictionary_entries() {
        let dictionary = dictionary(&["road", "caf\u{e9}", "a much longer street name"]);
        let entries: Vec<_> = dictionary.entries().collect();
        assert_eq!(entries, vec!["road", "caf\u{e9}", "a much longer street name"]);
        assert_eq!(dictionary.get(1).as_deref(), Some("caf\u{e9}"));
        assert_eq!(dictionary.get(3), None);
    }

    #[test]
    fn test_invalid_offsets() {
        let data = Bytes::from_static(b"abc");
        assert!(StringFlatVector::new("s", vec![0, 2, 1], data.clone(), None).is_err());
        assert!(StringFlatVector::new("s", vec![0, 4], data.clone(), None).is_err());
        assert!(StringFlatVector::new("s", Vec::new(), data, None).is_err());
    }

    #[test]
    fn test_expand_offsets_over_absent() {
        let present = BitVector::from_bools(&[true, false, true]);
        let expanded = expand_offsets(&present, &[0, 3, 5]).unwrap();
        assert_eq!(expanded, vec![0, 3, 3, 5]);

        let vector =
            StringFlatVector::new("s", expanded, Bytes::from_static(b"fooba"), Some(present))
                .unwrap();
        assert_eq!(
            (0..3).map(|i| vector.get(i)).collect::<Vec<_>>(),
            vec![Some(Cow::Borrowed("foo")), None, Some(Cow::Borrowed("ba"))]
        );

        let present = BitVector::from_bools(&[true, true]);
        assert!(expand_offsets(&present, &[0, 3]).is_err());
    }

    #[test]
    fn test_dictionary_vector() {
        let dict = dictionary(&["cat", "dog"]);
        let vector = StringDictionaryVector::new("pet", vec![0, 1, 0], dict.clone(), None).unwrap();
        assert_eq!(vector.select_eq(&Cow::Borrowed("cat")), vec![0, 2]);
        assert_eq!(vector.get(1).as_deref(), Some("dog"));
        assert!(Arc::ptr_eq(vector.dictionary(), &dict));
    }

    #[test]
    fn test_dictionary_index_validation() {
        let dict = dictionary(&["cat"]);
        assert!(StringDictionaryVector::new("pet", vec![0, 1], dict.clone(), None).is_err());

        // an out of range placeholder at an absent position is fine
        let present = BitVector::from_bools(&[true, false]);
        let vector = StringDictionaryVector::new("pet", vec![0, 7], dict, Some(present)).unwrap();
        assert_eq!(vector.get(1), None);
    }

    #[test]
    fn test_fsst_dictionary_vector() {
        let table = SymbolTable::new(&["Stra", "ße"]).unwrap();
        let entries = ["Straße", "Strand"];
        let mut compressed = Vec::new();
        let mut offsets = vec![0u32];
        let mut total = 0;
        for entry in entries {
            compressed.extend(table.encode(entry.as_bytes()));
            total += entry.len() as u32;
            offsets.push(total);
        }
        let symbol_offsets = crate::integer::delta::lengths_to_offsets(&table.lengths()).unwrap();
        let dict = FsstDictionary::new(
            symbol_offsets,
            Bytes::from(table.to_bytes()),
            offsets,
            &compressed,
        )
        .unwrap();
        assert_eq!(dict.num_symbols(), 2);

        let vector =
            StringFsstDictionaryVector::new("street", vec![1, 0, 1], Arc::new(dict), None).unwrap();
        assert_eq!(vector.get(0).as_deref(), Some("Strand"));
        assert_eq!(vector.get(1).as_deref(), Some("Straße"));
        assert_eq!(StringVector::FsstDictionary(vector).size(), 3);
    }
}
