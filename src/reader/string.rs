//! String column decoding.
//!
//! Plain columns carry a LENGTH (VAR_BINARY) and a DATA stream. Dictionary
//! columns carry an OFFSET stream of indices, a LENGTH (DICTIONARY) stream
//! and the dictionary DATA; FSST dictionaries add a symbol table DATA stream
//! and a LENGTH (SYMBOL) stream, and compress the dictionary body.
//!
//! Shared dictionaries store one dictionary for a whole struct column,
//! followed by a PRESENT and OFFSET pair for every child.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use super::integer_stream::{
    decode_int_stream, decode_length_stream_to_offsets, decode_nullable_int_stream,
};
use super::property::skip_column;
use super::decode_boolean_stream;
use crate::codec::varint::decode_varint_u32;
use crate::error::{DecodeError, Result, SchemaError};
use crate::metadata::{DictionaryType, LengthType, StreamMetadata, StreamType};
use crate::offset::Offset;
use crate::options::DecoderOptions;
use crate::schema::Column;
use crate::vector::{
    expand_offsets, BitVector, Dictionary, FsstDictionary, StringDictionaryVector,
    StringFlatVector, StringFsstDictionaryVector, StringVector,
};

/// Streams collected while walking a string column
#[derive(Default)]
struct StringStreams {
    indices: Option<Vec<u32>>,
    plain_offsets: Option<Vec<u32>>,
    plain_data: Option<Bytes>,
    dictionary_offsets: Option<Vec<u32>>,
    dictionary_data: Option<Bytes>,
    symbol_offsets: Option<Vec<u32>>,
    symbol_table: Option<Bytes>,
}

fn read_data_stream(data: &[u8], offset: &mut Offset, metadata: &StreamMetadata) -> Result<Bytes> {
    let bytes = offset.take(data, metadata.byte_length())?;
    Ok(Bytes::copy_from_slice(bytes))
}

fn missing(what: &str) -> SchemaError {
    SchemaError::ContractViolation(format!("string column has no {} stream", what))
}

/// Decode a string column of `num_streams` streams (PRESENT excluded).
///
/// `present` is the column's already decoded nullability. Streams with a
/// byte length of zero are skipped.
pub fn decode_string_column(
    name: &str,
    data: &[u8],
    offset: &mut Offset,
    num_streams: usize,
    num_features: usize,
    present: Option<BitVector>,
    options: &DecoderOptions,
) -> Result<StringVector> {
    let mut streams = StringStreams::default();

    for _ in 0..num_streams {
        let metadata = StreamMetadata::decode(data, offset)?;
        if metadata.byte_length() == 0 {
            trace!(column = name, stream = %metadata.stream_type(), "skipping empty stream");
            continue;
        }

        match metadata.stream_type() {
            StreamType::Offset(_) => {
                let indices = match &present {
                    Some(present) => decode_nullable_int_stream(
                        data, offset, &metadata, false, present, options,
                    )?,
                    None => decode_int_stream(data, offset, &metadata, false, None, options)?,
                };
                streams.indices = Some(indices);
            }
            StreamType::Length(length_type) => {
                let offsets = decode_length_stream_to_offsets(data, offset, &metadata, options)?;
                match length_type {
                    LengthType::Dictionary => streams.dictionary_offsets = Some(offsets),
                    LengthType::Symbol => streams.symbol_offsets = Some(offsets),
                    _ => streams.plain_offsets = Some(offsets),
                }
            }
            StreamType::Data(DictionaryType::None) => {
                streams.plain_data = Some(read_data_stream(data, offset, &metadata)?);
            }
            StreamType::Data(DictionaryType::Single | DictionaryType::Shared) => {
                streams.dictionary_data = Some(read_data_stream(data, offset, &metadata)?);
            }
            StreamType::Data(DictionaryType::Fsst) => {
                streams.symbol_table = Some(read_data_stream(data, offset, &metadata)?);
            }
            other => {
                return Err(SchemaError::ContractViolation(format!(
                    "unexpected {} stream in string column",
                    other
                ))
                .into())
            }
        }
    }

    let size = present.as_ref().map_or(num_features, BitVector::size);
    build_string_vector(name, streams, size, present)
}

fn build_string_vector(
    name: &str,
    streams: StringStreams,
    size: usize,
    present: Option<BitVector>,
) -> Result<StringVector> {
    let indices = streams.indices.unwrap_or_else(|| vec![0; size]);

    if let Some(symbol_table) = streams.symbol_table {
        let symbol_offsets = streams.symbol_offsets.ok_or_else(|| missing("symbol length"))?;
        let offsets = streams
            .dictionary_offsets
            .ok_or_else(|| missing("dictionary length"))?;
        let compressed = streams.dictionary_data.unwrap_or_default();
        let dictionary = FsstDictionary::new(symbol_offsets, symbol_table, offsets, &compressed)?;
        debug!(
            column = name,
            symbols = dictionary.num_symbols(),
            entries = dictionary.dictionary().len(),
            "decoded FSST dictionary column"
        );
        return Ok(StringVector::FsstDictionary(StringFsstDictionaryVector::new(
            name,
            indices,
            Arc::new(dictionary),
            present,
        )?));
    }

    if streams.dictionary_offsets.is_some() || streams.dictionary_data.is_some() {
        let offsets = streams.dictionary_offsets.unwrap_or_else(|| vec![0]);
        let dictionary = Dictionary::new(offsets, streams.dictionary_data.unwrap_or_default())?;
        return Ok(StringVector::Dictionary(StringDictionaryVector::new(
            name,
            indices,
            Arc::new(dictionary),
            present,
        )?));
    }

    let num_strings = present.as_ref().map_or(size, BitVector::count_ones);
    let offsets = streams
        .plain_offsets
        .unwrap_or_else(|| vec![0; num_strings + 1]);
    let offsets = match &present {
        Some(present) => expand_offsets(present, &offsets)?,
        None if offsets.len() != size + 1 => {
            return Err(DecodeError::InvalidData(format!(
                "{} string offsets for {} features",
                offsets.len(),
                size
            ))
            .into())
        }
        None => offsets,
    };
    Ok(StringVector::Flat(StringFlatVector::new(
        name,
        offsets,
        streams.plain_data.unwrap_or_default(),
        present,
    )?))
}

enum SharedDictionary {
    Plain(Arc<Dictionary>),
    Fsst(Arc<FsstDictionary>),
}

/// Decode a struct column whose string children share one dictionary.
///
/// Children with no streams in this tile are left out, and children the
/// options exclude (by their `column:child` name) are skipped undecoded.
///
/// # Errors
/// `SchemaError::ContractViolation` for a child that is not an optional
/// string leaf stored as a PRESENT and OFFSET stream pair.
pub fn decode_shared_dictionary(
    data: &[u8],
    offset: &mut Offset,
    column: &Column,
    num_features: usize,
    options: &DecoderOptions,
) -> Result<Vec<StringVector>> {
    let mut streams = StringStreams::default();

    // dictionary streams end with the dictionary DATA stream
    loop {
        let metadata = StreamMetadata::decode(data, offset)?;
        match metadata.stream_type() {
            StreamType::Length(LengthType::Dictionary) => {
                streams.dictionary_offsets =
                    Some(decode_length_stream_to_offsets(data, offset, &metadata, options)?);
            }
            StreamType::Length(LengthType::Symbol) => {
                streams.symbol_offsets =
                    Some(decode_length_stream_to_offsets(data, offset, &metadata, options)?);
            }
            StreamType::Data(DictionaryType::Fsst) => {
                streams.symbol_table = Some(read_data_stream(data, offset, &metadata)?);
            }
            StreamType::Data(DictionaryType::Single | DictionaryType::Shared) => {
                streams.dictionary_data = Some(read_data_stream(data, offset, &metadata)?);
                break;
            }
            other => {
                return Err(SchemaError::ContractViolation(format!(
                    "unexpected {} stream in shared dictionary of '{}'",
                    other, column.name
                ))
                .into())
            }
        }
    }

    let offsets = streams
        .dictionary_offsets
        .ok_or_else(|| missing("dictionary length"))?;
    let dictionary_data = streams.dictionary_data.unwrap_or_default();
    let dictionary = match streams.symbol_table {
        Some(symbol_table) => {
            let symbol_offsets = streams.symbol_offsets.ok_or_else(|| missing("symbol length"))?;
            SharedDictionary::Fsst(Arc::new(FsstDictionary::new(
                symbol_offsets,
                symbol_table,
                offsets,
                &dictionary_data,
            )?))
        }
        None => SharedDictionary::Plain(Arc::new(Dictionary::new(offsets, dictionary_data)?)),
    };

    let mut vectors = Vec::with_capacity(column.children().len());
    for child in column.children() {
        let num_streams = decode_varint_u32(data, offset)? as usize;
        if num_streams == 0 {
            trace!(column = %column.name, child = %child.name, "child absent from tile");
            continue;
        }

        let name = column.child_name(&child.name);
        if !options.wants_column(&name) {
            debug!(column = %name, num_streams, "skipping filtered struct child");
            skip_column(data, offset, num_streams)?;
            continue;
        }

        if num_streams != 2 || !child.is_string() {
            return Err(SchemaError::ContractViolation(format!(
                "struct child '{}' must be an optional string with 2 streams, found {:?} with {}",
                name, child.field_type, num_streams
            ))
            .into());
        }

        let present_metadata = StreamMetadata::decode(data, offset)?;
        let present = decode_boolean_stream(data, offset, &present_metadata, None, options)?;

        let offset_metadata = StreamMetadata::decode(data, offset)?;
        let indices = if offset_metadata.decompressed_count() != num_features {
            decode_nullable_int_stream(data, offset, &offset_metadata, false, &present, options)?
        } else {
            decode_int_stream(data, offset, &offset_metadata, false, None, options)?
        };

        let vector = match &dictionary {
            SharedDictionary::Plain(dictionary) => StringVector::Dictionary(
                StringDictionaryVector::new(name, indices, Arc::clone(dictionary), Some(present))?,
            ),
            SharedDictionary::Fsst(dictionary) => {
                StringVector::FsstDictionary(StringFsstDictionaryVector::new(
                    name,
                    indices,
                    Arc::clone(dictionary),
                    Some(present),
                )?)
            }
        };
        vectors.push(vector);
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PhysicalTechnique;
    use crate::metadata::{LogicalTechnique, OffsetType, StreamHeader};
    use crate::vector::Vector;

    fn push_stream(out: &mut Vec<u8>, stream_type: StreamType, num_values: usize, body: &[u8]) {
        let header = StreamHeader::new(
            stream_type,
            LogicalTechnique::None,
            LogicalTechnique::None,
            PhysicalTechnique::Varint,
            num_values,
            body.len(),
        );
        StreamMetadata::Plain(header).encode(out);
        out.extend_from_slice(body);
    }

    fn varints(values: &[u32]) -> Vec<u8> {
        PhysicalTechnique::Varint.encode_u32(values, None).unwrap()
    }

    #[test]
    fn test_plain_column() {
        let mut data = Vec::new();
        push_stream(&mut data, StreamType::Length(LengthType::VarBinary), 2, &varints(&[5, 5]));
        push_stream(&mut data, StreamType::Data(DictionaryType::None), 10, b"HelloWorld");

        let mut offset = Offset::default();
        let vector =
            decode_string_column("greeting", &data, &mut offset, 2, 2, None, &DecoderOptions::default())
                .unwrap();
        assert_eq!(offset.get(), data.len());
        assert!(matches!(vector, StringVector::Flat(_)));
        assert_eq!(vector.get(0).as_deref(), Some("Hello"));
        assert_eq!(vector.get(1).as_deref(), Some("World"));
    }

    #[test]
    fn test_dictionary_column_with_nulls() {
        let present = BitVector::from_bools(&[true, false, true, true]);
        let mut data = Vec::new();
        push_stream(&mut data, StreamType::Offset(OffsetType::String), 3, &varints(&[1, 0, 1]));
        push_stream(&mut data, StreamType::Length(LengthType::Dictionary), 2, &varints(&[3, 3]));
        push_stream(&mut data, StreamType::Data(DictionaryType::Single), 6, b"catdog");

        let mut offset = Offset::default();
        let vector = decode_string_column(
            "pet",
            &data,
            &mut offset,
            3,
            4,
            Some(present),
            &DecoderOptions::default(),
        )
        .unwrap();
        assert!(matches!(vector, StringVector::Dictionary(_)));
        assert_eq!(
            (0..4).map(|i| vector.get(i).map(|s| s.into_owned())).collect::<Vec<_>>(),
            vec![Some("dog".to_string()), None, Some("cat".to_string()), Some("dog".to_string())]
        );
    }

    #[test]
    fn test_empty_streams_are_skipped() {
        let mut data = Vec::new();
        push_stream(&mut data, StreamType::Length(LengthType::VarBinary), 2, &varints(&[0, 0]));
        push_stream(&mut data, StreamType::Data(DictionaryType::None), 0, &[]);

        let mut offset = Offset::default();
        let vector =
            decode_string_column("empty", &data, &mut offset, 2, 2, None, &DecoderOptions::default())
                .unwrap();
        assert_eq!(vector.size(), 2);
        assert_eq!(vector.get(1).as_deref(), Some(""));
    }

    #[test]
    fn test_unexpected_stream_rejected() {
        let mut data = Vec::new();
        push_stream(&mut data, StreamType::Present, 0, &[1]);
        let mut offset = Offset::default();
        assert!(
            decode_string_column("bad", &data, &mut offset, 1, 0, None, &DecoderOptions::default())
                .is_err()
        );
    }
}
