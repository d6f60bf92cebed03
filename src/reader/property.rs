//! Per-column driver.
//!
//! A property column is a varint stream count followed by its streams. A
//! nullable column starts with a PRESENT stream; integer columns are then
//! classified into flat, const or sequence vectors before their data stream
//! is decoded.

use tracing::debug;

use super::integer_stream::{
    decode_const_int_stream, decode_const_long_stream, decode_int_stream, decode_long_stream,
    decode_nullable_int_stream, decode_nullable_long_stream, decode_sequence_int_stream,
    decode_sequence_long_stream, vector_type,
};
use super::string::{decode_shared_dictionary, decode_string_column};
use super::{decode_boolean_stream, decode_present_stream};
use crate::codec::float::{decode_doubles_le, decode_floats_le};
use crate::codec::varint::decode_varint_u32;
use crate::error::{Result, SchemaError, TileError};
use crate::integer::nullable::pad_with_zeros;
use crate::metadata::StreamMetadata;
use crate::offset::Offset;
use crate::options::DecoderOptions;
use crate::schema::{Column, ColumnType, ScalarType};
use crate::vector::{
    BitVector, BooleanVector, ColumnVector, ConstVector, FlatVector, NumericVector,
    SequenceValue, SequenceVector, VectorType,
};

/// Result of decoding one property column
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedColumn {
    /// A scalar column
    Single(ColumnVector),
    /// The present children of a shared dictionary struct
    Struct(Vec<ColumnVector>),
}

/// Skip `num_streams` streams without decoding their bodies.
pub fn skip_column(data: &[u8], offset: &mut Offset, num_streams: usize) -> Result<()> {
    for _ in 0..num_streams {
        let metadata = StreamMetadata::decode(data, offset)?;
        offset.ensure(data, metadata.byte_length())?;
        offset.add(metadata.byte_length());
    }
    Ok(())
}

/// Read the stream count of a column, then decode it.
pub fn read_property_column(
    data: &[u8],
    offset: &mut Offset,
    column: &Column,
    num_features: usize,
    options: &DecoderOptions,
) -> Result<Option<DecodedColumn>> {
    let num_streams = decode_varint_u32(data, offset)
        .map_err(|err| TileError::from(err).in_column(&column.name))?;
    decode_property_column(data, offset, column, num_streams as usize, num_features, options)
}

/// Decode a property column made of `num_streams` streams.
///
/// Returns `None` when the column has no streams in this tile or is excluded
/// by [`DecoderOptions::with_property_columns`]; excluded columns are
/// skipped so `offset` always ends after the column.
///
/// # Errors
/// Every error is attributed to the column name.
pub fn decode_property_column(
    data: &[u8],
    offset: &mut Offset,
    column: &Column,
    num_streams: usize,
    num_features: usize,
    options: &DecoderOptions,
) -> Result<Option<DecodedColumn>> {
    decode_column(data, offset, column, num_streams, num_features, options)
        .map_err(|err| err.in_column(&column.name))
}

fn decode_column(
    data: &[u8],
    offset: &mut Offset,
    column: &Column,
    num_streams: usize,
    num_features: usize,
    options: &DecoderOptions,
) -> Result<Option<DecodedColumn>> {
    let scalar_type = match &column.column_type {
        ColumnType::Complex(_) => {
            return decode_struct_column(data, offset, column, num_streams, num_features, options)
        }
        ColumnType::Scalar(scalar_type) => *scalar_type,
    };

    if !options.wants_column(&column.name) {
        debug!(column = %column.name, num_streams, "skipping filtered column");
        skip_column(data, offset, num_streams)?;
        return Ok(None);
    }
    if num_streams == 0 {
        return Ok(None);
    }
    debug!(column = %column.name, %scalar_type, num_streams, "decoding property column");

    let present = if column.nullable {
        Some(decode_present_stream(data, offset, options)?)
    } else {
        None
    };
    let size = present.as_ref().map_or(num_features, BitVector::size);
    let name = column.name.as_str();

    let vector = match scalar_type {
        ScalarType::Boolean => {
            let metadata = StreamMetadata::decode(data, offset)?;
            let bits = decode_boolean_stream(data, offset, &metadata, present.as_ref(), options)?;
            ColumnVector::Boolean(BooleanVector::new(name, bits, present))
        }
        ScalarType::Int32 | ScalarType::UInt32 => {
            let signed = scalar_type.is_signed();
            let decoded = decode_int_column(
                data,
                offset,
                signed,
                num_features,
                present.as_ref(),
                options,
            )?;
            if signed {
                ColumnVector::Int(decoded.into_vector(name, size, present, |w| w as i32))
            } else {
                ColumnVector::UInt(decoded.into_vector(name, size, present, |w| w))
            }
        }
        ScalarType::Int64 | ScalarType::UInt64 => {
            let signed = scalar_type.is_signed();
            let decoded = decode_long_column(
                data,
                offset,
                signed,
                num_features,
                present.as_ref(),
                options,
            )?;
            if signed {
                ColumnVector::Long(decoded.into_vector(name, size, present, |w| w as i64))
            } else {
                ColumnVector::ULong(decoded.into_vector(name, size, present, |w| w))
            }
        }
        ScalarType::Float => {
            let metadata = StreamMetadata::decode(data, offset)?;
            metadata.check_limit(options.max_stream_values)?;
            let values =
                decode_floats_le(data, offset, metadata.num_values(), metadata.byte_length())?;
            let values = match &present {
                Some(present) => pad_with_zeros(present, &values)?,
                None => values,
            };
            ColumnVector::Float(FlatVector::new(name, values, present))
        }
        ScalarType::Double => {
            let metadata = StreamMetadata::decode(data, offset)?;
            metadata.check_limit(options.max_stream_values)?;
            let values =
                decode_doubles_le(data, offset, metadata.num_values(), metadata.byte_length())?;
            let values = match &present {
                Some(present) => pad_with_zeros(present, &values)?,
                None => values,
            };
            ColumnVector::Double(FlatVector::new(name, values, present))
        }
        ScalarType::String => {
            let string_streams = if present.is_some() {
                num_streams - 1
            } else {
                num_streams
            };
            ColumnVector::String(decode_string_column(
                name,
                data,
                offset,
                string_streams,
                num_features,
                present,
                options,
            )?)
        }
        ScalarType::Int8 | ScalarType::UInt8 => {
            return Err(SchemaError::UnsupportedType(scalar_type.to_string()).into())
        }
    };

    Ok(Some(DecodedColumn::Single(vector)))
}

fn decode_struct_column(
    data: &[u8],
    offset: &mut Offset,
    column: &Column,
    num_streams: usize,
    num_features: usize,
    options: &DecoderOptions,
) -> Result<Option<DecodedColumn>> {
    match num_streams {
        0 => Ok(None),
        1 => {
            let children = decode_shared_dictionary(data, offset, column, num_features, options)?;
            debug!(column = %column.name, children = children.len(), "decoded shared dictionary");
            Ok(Some(DecodedColumn::Struct(
                children.into_iter().map(ColumnVector::String).collect(),
            )))
        }
        other => Err(SchemaError::ContractViolation(format!(
            "struct column declares {} streams, expected 1",
            other
        ))
        .into()),
    }
}

/// Raw words of an integer column in the representation picked for it
enum Decoded<W> {
    Flat(Vec<W>),
    Const(W),
    Sequence { base: W, delta: W, size: usize },
}

impl<W: Copy> Decoded<W> {
    fn into_vector<T: SequenceValue>(
        self,
        name: &str,
        size: usize,
        present: Option<BitVector>,
        cast: impl Fn(W) -> T,
    ) -> NumericVector<T> {
        match self {
            Decoded::Flat(values) => NumericVector::Flat(FlatVector::new(
                name,
                values.into_iter().map(cast).collect(),
                present,
            )),
            Decoded::Const(value) => {
                NumericVector::Const(ConstVector::new(name, cast(value), size, present))
            }
            Decoded::Sequence { base, delta, size } => {
                NumericVector::Sequence(SequenceVector::new(name, cast(base), cast(delta), size))
            }
        }
    }
}

fn decode_int_column(
    data: &[u8],
    offset: &mut Offset,
    signed: bool,
    num_features: usize,
    present: Option<&BitVector>,
    options: &DecoderOptions,
) -> Result<Decoded<u32>> {
    let metadata = StreamMetadata::decode(data, offset)?;
    // classify against the dense size when a present stream is given
    let size = present.map_or(num_features, BitVector::size);
    let decoded = match vector_type(data, offset, &metadata, size, options)? {
        VectorType::Flat => Decoded::Flat(match present {
            Some(present) => {
                decode_nullable_int_stream(data, offset, &metadata, signed, present, options)?
            }
            None => decode_int_stream(data, offset, &metadata, signed, None, options)?,
        }),
        VectorType::Const => {
            Decoded::Const(decode_const_int_stream(data, offset, &metadata, signed, options)?)
        }
        VectorType::Sequence => {
            let (base, delta) = decode_sequence_int_stream(data, offset, &metadata, options)?;
            Decoded::Sequence {
                base,
                delta,
                size: metadata.decompressed_count(),
            }
        }
    };
    Ok(decoded)
}

fn decode_long_column(
    data: &[u8],
    offset: &mut Offset,
    signed: bool,
    num_features: usize,
    present: Option<&BitVector>,
    options: &DecoderOptions,
) -> Result<Decoded<u64>> {
    let metadata = StreamMetadata::decode(data, offset)?;
    // classify against the dense size when a present stream is given
    let size = present.map_or(num_features, BitVector::size);
    let decoded = match vector_type(data, offset, &metadata, size, options)? {
        VectorType::Flat => Decoded::Flat(match present {
            Some(present) => {
                decode_nullable_long_stream(data, offset, &metadata, signed, present, options)?
            }
            None => decode_long_stream(data, offset, &metadata, signed, options)?,
        }),
        VectorType::Const => {
            Decoded::Const(decode_const_long_stream(data, offset, &metadata, signed, options)?)
        }
        VectorType::Sequence => {
            let (base, delta) = decode_sequence_long_stream(data, offset, &metadata, options)?;
            Decoded::Sequence {
                base,
                delta,
                size: metadata.decompressed_count(),
            }
        }
    };
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::float::encode_doubles_le;
    use crate::codec::PhysicalTechnique;
    use crate::integer::byte_rle::encode_boolean_rle;
    use crate::metadata::{DictionaryType, LogicalTechnique, StreamHeader, StreamType};
    use crate::vector::{PropertyValue, Vector};

    // =========================================================================
    // Helpers
    // =========================================================================

    fn push(out: &mut Vec<u8>, metadata: StreamMetadata, body: &[u8]) {
        metadata.encode(out);
        out.extend_from_slice(body);
    }

    fn header(
        stream_type: StreamType,
        t1: LogicalTechnique,
        physical: PhysicalTechnique,
        num_values: usize,
        body: &[u8],
    ) -> StreamHeader {
        StreamHeader::new(
            stream_type,
            t1,
            LogicalTechnique::None,
            physical,
            num_values,
            body.len(),
        )
    }

    fn push_present(out: &mut Vec<u8>, bits: &[bool]) {
        let body = encode_boolean_rle(&BitVector::from_bools(bits));
        let h = header(
            StreamType::Present,
            LogicalTechnique::None,
            PhysicalTechnique::None,
            bits.len(),
            &body,
        );
        push(out, StreamMetadata::Plain(h), &body);
    }

    fn varints(values: &[u32]) -> Vec<u8> {
        PhysicalTechnique::Varint.encode_u32(values, None).unwrap()
    }

    fn data_stream(t1: LogicalTechnique, num_values: usize, body: &[u8]) -> StreamMetadata {
        StreamMetadata::Plain(header(
            StreamType::Data(DictionaryType::None),
            t1,
            PhysicalTechnique::Varint,
            num_values,
            body,
        ))
    }

    fn single(decoded: Option<DecodedColumn>) -> ColumnVector {
        match decoded {
            Some(DecodedColumn::Single(vector)) => vector,
            other => panic!("expected a scalar column, got {:?}", other),
        }
    }

    // =========================================================================
    // Scalar columns
    // =========================================================================

    #[test]
    fn test_nullable_delta_int_column() {
        let mut data = Vec::new();
        push_present(&mut data, &[true, false, true]);
        // zigzag deltas +1, +2
        let body = varints(&[2, 4]);
        push(&mut data, data_stream(LogicalTechnique::Delta, 2, &body), &body);

        let column = Column::scalar("rank", ScalarType::Int32, true);
        let mut offset = Offset::default();
        let vector = single(
            decode_property_column(&data, &mut offset, &column, 2, 3, &DecoderOptions::default())
                .unwrap(),
        );
        assert_eq!(offset.get(), data.len());
        assert_eq!(
            vector.to_values(),
            vec![Some(PropertyValue::Int(1)), None, Some(PropertyValue::Int(3))]
        );
    }

    #[test]
    fn test_const_rle_column() {
        let body = varints(&[4, 7]);
        let metadata = StreamMetadata::Rle {
            header: header(
                StreamType::Data(DictionaryType::None),
                LogicalTechnique::Rle,
                PhysicalTechnique::Varint,
                2,
                &body,
            ),
            runs: 1,
            num_rle_values: 4,
        };
        let mut data = Vec::new();
        push(&mut data, metadata, &body);

        let column = Column::scalar("level", ScalarType::UInt32, false);
        let mut offset = Offset::default();
        let vector = single(
            decode_property_column(&data, &mut offset, &column, 1, 4, &DecoderOptions::default())
                .unwrap(),
        );
        assert_eq!(vector.vector_type(), Some(VectorType::Const));
        assert_eq!(vector.size(), 4);
        assert_eq!(vector.get(3), Some(PropertyValue::UInt(7)));
        assert_eq!(offset.get(), data.len());
    }

    #[test]
    fn test_sequence_long_column() {
        // one run of 5 deltas of +1
        let body = varints(&[5, 2]);
        let metadata = StreamMetadata::Rle {
            header: StreamHeader::new(
                StreamType::Data(DictionaryType::None),
                LogicalTechnique::Delta,
                LogicalTechnique::Rle,
                PhysicalTechnique::Varint,
                2,
                body.len(),
            ),
            runs: 1,
            num_rle_values: 5,
        };
        let mut data = Vec::new();
        push(&mut data, metadata, &body);

        let column = Column::scalar("id", ScalarType::Int64, false);
        let mut offset = Offset::default();
        let vector = single(
            decode_property_column(&data, &mut offset, &column, 1, 5, &DecoderOptions::default())
                .unwrap(),
        );
        assert_eq!(vector.vector_type(), Some(VectorType::Sequence));
        assert_eq!(
            (0..5).filter_map(|i| vector.get(i)?.as_i64()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_nullable_sequence_uses_present_size() {
        // every feature present, ids 1..=5 as one run of +1 deltas
        let mut data = Vec::new();
        push_present(&mut data, &[true; 5]);
        let body = varints(&[5, 2]);
        let metadata = StreamMetadata::Rle {
            header: StreamHeader::new(
                StreamType::Data(DictionaryType::None),
                LogicalTechnique::Delta,
                LogicalTechnique::Rle,
                PhysicalTechnique::Varint,
                2,
                body.len(),
            ),
            runs: 1,
            num_rle_values: 5,
        };
        push(&mut data, metadata, &body);

        // the caller's feature count covers more than this slice of the column
        let column = Column::scalar("id", ScalarType::UInt32, true);
        let mut offset = Offset::default();
        let vector = single(
            decode_property_column(&data, &mut offset, &column, 2, 8, &DecoderOptions::default())
                .unwrap(),
        );
        assert_eq!(offset.get(), data.len());
        assert_eq!(vector.vector_type(), Some(VectorType::Sequence));
        assert_eq!(vector.size(), 5);
        assert_eq!(
            (0..5).filter_map(|i| vector.get(i)?.as_i64()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_nullable_double_column() {
        let mut data = Vec::new();
        push_present(&mut data, &[false, true]);
        let body = encode_doubles_le(&[2.5]);
        let h = header(
            StreamType::Data(DictionaryType::None),
            LogicalTechnique::None,
            PhysicalTechnique::None,
            1,
            &body,
        );
        push(&mut data, StreamMetadata::Plain(h), &body);

        let column = Column::scalar("width", ScalarType::Double, true);
        let mut offset = Offset::default();
        let vector = single(
            decode_property_column(&data, &mut offset, &column, 2, 2, &DecoderOptions::default())
                .unwrap(),
        );
        assert_eq!(vector.to_values(), vec![None, Some(PropertyValue::Double(2.5))]);
    }

    #[test]
    fn test_boolean_column() {
        let bits = BitVector::from_bools(&[true, false, true]);
        let body = encode_boolean_rle(&bits);
        let h = header(
            StreamType::Data(DictionaryType::None),
            LogicalTechnique::None,
            PhysicalTechnique::None,
            3,
            &body,
        );
        let mut data = Vec::new();
        push(&mut data, StreamMetadata::Plain(h), &body);

        let column = Column::scalar("oneway", ScalarType::Boolean, false);
        let mut offset = Offset::default();
        let vector = single(
            decode_property_column(&data, &mut offset, &column, 1, 3, &DecoderOptions::default())
                .unwrap(),
        );
        assert_eq!(vector.get(1), Some(PropertyValue::Bool(false)));
        assert_eq!(vector.get(2), Some(PropertyValue::Bool(true)));
    }

    // =========================================================================
    // Skipping and errors
    // =========================================================================

    #[test]
    fn test_filtered_column_is_skipped() {
        let mut data = Vec::new();
        let body = varints(&[1, 2, 3]);
        push(&mut data, data_stream(LogicalTechnique::None, 3, &body), &body);
        data.push(0xFF);

        let column = Column::scalar("height", ScalarType::UInt32, false);
        let options = DecoderOptions::new().with_property_columns(["name"]);
        let mut offset = Offset::default();
        let decoded = decode_property_column(&data, &mut offset, &column, 1, 3, &options).unwrap();
        assert_eq!(decoded, None);
        assert_eq!(offset.get(), data.len() - 1);
    }

    #[test]
    fn test_empty_column() {
        let column = Column::scalar("height", ScalarType::UInt32, false);
        let mut offset = Offset::default();
        let decoded =
            read_property_column(&[0], &mut offset, &column, 3, &DecoderOptions::default())
                .unwrap();
        assert_eq!(decoded, None);
        assert_eq!(offset.get(), 1);
    }

    #[test]
    fn test_int8_unsupported_with_column_name() {
        let column = Column::scalar("tiny", ScalarType::Int8, false);
        let body = varints(&[1]);
        let mut data = Vec::new();
        push(&mut data, data_stream(LogicalTechnique::None, 1, &body), &body);
        let mut offset = Offset::default();
        let err =
            decode_property_column(&data, &mut offset, &column, 1, 1, &DecoderOptions::default())
                .unwrap_err();
        assert!(matches!(err, TileError::Column { ref column, .. } if column == "tiny"));
        assert!(matches!(err.root(), TileError::Schema(SchemaError::UnsupportedType(_))));
    }

    #[test]
    fn test_struct_with_many_streams_rejected() {
        let column = Column::shared_dictionary("name", vec![crate::schema::Field::string("en")]);
        let mut offset = Offset::default();
        let err =
            decode_property_column(&[], &mut offset, &column, 3, 1, &DecoderOptions::default())
                .unwrap_err();
        assert!(matches!(err.root(), TileError::Schema(SchemaError::ContractViolation(_))));
    }
}
