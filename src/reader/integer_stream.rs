//! Integer stream decoding.
//!
//! A stream is decoded in two steps: the physical technique turns the body
//! into raw words, then the logical encoding resolved from the header
//! (zigzag, delta, runs, Morton, componentwise delta) turns the words into
//! values. Signed 32 and 64-bit columns come back as `u32`/`u64` words whose
//! bits are the two's complement value; cast with `as i32`/`as i64`.

use tracing::trace;

use crate::codec::varint::decode_varints_u64;
use crate::codec::PhysicalTechnique;
use crate::error::{CodecError, DecodeError, Result};
use crate::integer::delta::{
    decode_componentwise_delta, decode_componentwise_delta_scaled, decode_delta_rle,
    decode_zigzag_delta, inverse_delta, lengths_to_offsets, GeometryScaling,
};
use crate::integer::nullable::{
    decode_nullable_rle, decode_nullable_zigzag_delta, pad_with_zeros, pad_zigzag_with_zeros,
};
use crate::integer::rle::{
    decode_const_rle, decode_rle, decode_zigzag_const_rle, decode_zigzag_rle,
    decode_zigzag_sequence_rle,
};
use crate::integer::zigzag::decode_zigzag_in_place;
use crate::integer::Word;
use crate::metadata::{LogicalEncoding, StreamMetadata};
use crate::offset::Offset;
use crate::options::DecoderOptions;
use crate::vector::{BitVector, VectorType};

/// Zigzag encoding of 1, the step of a consecutive sequence
const ZIGZAG_ONE: u64 = 2;

fn decode_physical_u32(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    options: &DecoderOptions,
) -> Result<Vec<u32>> {
    metadata.check_limit(options.max_stream_values)?;
    trace!(
        stream = %metadata.stream_type(),
        physical = %metadata.physical(),
        num_values = metadata.num_values(),
        "decoding 32-bit stream"
    );
    metadata.physical().decode_u32(
        data,
        offset,
        metadata.num_values(),
        metadata.byte_length(),
        options.fast_pfor_codec(),
    )
}

fn decode_physical_u64(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    options: &DecoderOptions,
) -> Result<Vec<u64>> {
    metadata.check_limit(options.max_stream_values)?;
    metadata
        .physical()
        .decode_u64(data, offset, metadata.num_values(), metadata.byte_length())
}

/// Apply the logical encoding to dense raw words.
fn decode_logical<W: Word>(
    mut values: Vec<W>,
    encoding: LogicalEncoding,
    signed: bool,
) -> Result<Vec<W>> {
    match encoding {
        LogicalEncoding::None => {
            if signed {
                decode_zigzag_in_place(&mut values);
            }
            Ok(values)
        }
        LogicalEncoding::Delta => {
            decode_zigzag_delta(&mut values);
            Ok(values)
        }
        LogicalEncoding::Rle {
            runs,
            num_rle_values,
        } => {
            if signed {
                Ok(decode_zigzag_rle(&values, runs, num_rle_values)?)
            } else {
                Ok(decode_rle(&values, runs, num_rle_values)?)
            }
        }
        LogicalEncoding::DeltaRle {
            runs,
            num_rle_values,
        } => Ok(decode_delta_rle(&values, runs, num_rle_values)?),
        // Morton codes are sorted, so the deltas are never zigzag coded
        LogicalEncoding::Morton { .. } => {
            inverse_delta(&mut values);
            Ok(values)
        }
        LogicalEncoding::ComponentwiseDelta => {
            decode_componentwise_delta(&mut values)?;
            Ok(values)
        }
    }
}

/// Apply the logical encoding to the present values of a nullable column
/// and scatter them over `present`.
fn decode_nullable_logical<W: Word>(
    mut values: Vec<W>,
    encoding: LogicalEncoding,
    signed: bool,
    present: &BitVector,
) -> Result<Vec<W>> {
    let padded = match encoding {
        LogicalEncoding::None if signed => pad_zigzag_with_zeros(present, &values)?,
        LogicalEncoding::None => pad_with_zeros(present, &values)?,
        LogicalEncoding::Delta => decode_nullable_zigzag_delta(present, &values)?,
        LogicalEncoding::DeltaRle {
            runs,
            num_rle_values,
        } => {
            let deltas = decode_rle(&values, runs, num_rle_values)?;
            decode_nullable_zigzag_delta(present, &deltas)?
        }
        LogicalEncoding::Rle { runs, .. } => decode_nullable_rle(&values, runs, present, signed)?,
        LogicalEncoding::Morton { .. } => {
            inverse_delta(&mut values);
            pad_with_zeros(present, &values)?
        }
        LogicalEncoding::ComponentwiseDelta => {
            decode_componentwise_delta(&mut values)?;
            pad_with_zeros(present, &values)?
        }
    };
    Ok(padded)
}

/// Value of a stream classified as [`VectorType::Const`].
///
/// A single-run RLE stream stores `[run length, value]`; any other encoding
/// is decoded in full and its first value returned.
fn decode_const<W: Word>(values: Vec<W>, encoding: LogicalEncoding, signed: bool) -> Result<W> {
    match encoding {
        LogicalEncoding::Rle { .. } if signed => Ok(decode_zigzag_const_rle(&values)?),
        LogicalEncoding::Rle { .. } => Ok(decode_const_rle(&values)?),
        other => decode_logical(values, other, signed)?
            .first()
            .copied()
            .ok_or_else(|| {
                DecodeError::InvalidData("const stream holds no values".to_string()).into()
            }),
    }
}

/// Decode a 32-bit integer stream.
///
/// `scaling` only applies to componentwise-delta vertex streams.
pub fn decode_int_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    scaling: Option<&GeometryScaling>,
    options: &DecoderOptions,
) -> Result<Vec<u32>> {
    let encoding = metadata.logical_encoding()?;
    let mut values = decode_physical_u32(data, offset, metadata, options)?;
    match (encoding, scaling) {
        (LogicalEncoding::ComponentwiseDelta, Some(scaling)) => {
            decode_componentwise_delta_scaled(&mut values, *scaling)?;
            Ok(values)
        }
        _ => decode_logical(values, encoding, signed),
    }
}

/// Decode a 32-bit integer stream that only stores present values.
///
/// The result has one entry per bit of `present`; absent entries are zero,
/// except in delta chains where they repeat the previous value.
pub fn decode_nullable_int_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    present: &BitVector,
    options: &DecoderOptions,
) -> Result<Vec<u32>> {
    let encoding = metadata.logical_encoding()?;
    let values = decode_physical_u32(data, offset, metadata, options)?;
    decode_nullable_logical(values, encoding, signed, present)
}

/// Decode a 64-bit integer stream.
pub fn decode_long_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    options: &DecoderOptions,
) -> Result<Vec<u64>> {
    let encoding = metadata.logical_encoding()?;
    let values = decode_physical_u64(data, offset, metadata, options)?;
    decode_logical(values, encoding, signed)
}

/// Decode a 64-bit integer stream that only stores present values.
pub fn decode_nullable_long_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    present: &BitVector,
    options: &DecoderOptions,
) -> Result<Vec<u64>> {
    let encoding = metadata.logical_encoding()?;
    let values = decode_physical_u64(data, offset, metadata, options)?;
    decode_nullable_logical(values, encoding, signed, present)
}

/// Decode a 64-bit integer stream into `f64` values.
///
/// Exact for magnitudes up to 2^53.
pub fn decode_long_f64_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    options: &DecoderOptions,
) -> Result<Vec<f64>> {
    let encoding = metadata.logical_encoding()?;
    metadata.check_limit(options.max_stream_values)?;
    let values = metadata.physical().decode_f64(
        data,
        offset,
        metadata.num_values(),
        metadata.byte_length(),
    )?;
    decode_logical(values, encoding, signed)
}

/// Decode the single value of a 32-bit stream classified as const.
pub fn decode_const_int_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    options: &DecoderOptions,
) -> Result<u32> {
    let encoding = metadata.logical_encoding()?;
    let values = decode_physical_u32(data, offset, metadata, options)?;
    decode_const(values, encoding, signed)
}

/// Decode the single value of a 64-bit stream classified as const.
pub fn decode_const_long_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    signed: bool,
    options: &DecoderOptions,
) -> Result<u64> {
    let encoding = metadata.logical_encoding()?;
    let values = decode_physical_u64(data, offset, metadata, options)?;
    decode_const(values, encoding, signed)
}

/// Decode `(base, delta)` of a 32-bit delta-RLE stream classified as a
/// sequence. Both are signed words.
pub fn decode_sequence_int_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    options: &DecoderOptions,
) -> Result<(u32, u32)> {
    let values = decode_physical_u32(data, offset, metadata, options)?;
    Ok(decode_zigzag_sequence_rle(&values)?)
}

/// Decode `(base, delta)` of a 64-bit delta-RLE stream classified as a
/// sequence.
pub fn decode_sequence_long_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    options: &DecoderOptions,
) -> Result<(u64, u64)> {
    let values = decode_physical_u64(data, offset, metadata, options)?;
    Ok(decode_zigzag_sequence_rle(&values)?)
}

/// Decode a LENGTH stream and turn it into `n + 1` offsets starting at 0.
///
/// Lengths are unsigned and may be plain, delta, RLE or delta-RLE coded.
pub fn decode_length_stream_to_offsets(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    options: &DecoderOptions,
) -> Result<Vec<u32>> {
    let encoding = metadata.logical_encoding()?;
    if matches!(
        encoding,
        LogicalEncoding::Morton { .. } | LogicalEncoding::ComponentwiseDelta
    ) {
        return Err(CodecError::UnsupportedTechnique(format!(
            "{:?} for length streams",
            encoding
        ))
        .into());
    }
    let values = decode_physical_u32(data, offset, metadata, options)?;
    let lengths = decode_logical(values, encoding, false)?;
    Ok(lengths_to_offsets(&lengths)?)
}

/// Pick the cheapest in-memory representation for an integer stream.
///
/// Never moves `offset`: a two-run delta-RLE stream is classified by peeking
/// at its first four words from a copy of the cursor.
///
/// - single-run RLE, or a single value of any other encoding: const
/// - delta-RLE covering every feature with one run, or two runs whose run
///   values are both a delta of 1: sequence
/// - everything else, including sparse (nullable) delta-RLE: flat
pub fn vector_type(
    data: &[u8],
    offset: &Offset,
    metadata: &StreamMetadata,
    num_features: usize,
    options: &DecoderOptions,
) -> Result<VectorType> {
    let single_or_flat = if metadata.num_values() == 1 {
        VectorType::Const
    } else {
        VectorType::Flat
    };

    match metadata.logical_encoding()? {
        LogicalEncoding::Rle { runs, .. } => Ok(if runs == 1 {
            VectorType::Const
        } else {
            VectorType::Flat
        }),
        LogicalEncoding::DeltaRle {
            runs,
            num_rle_values,
        } => {
            if num_rle_values != num_features {
                return Ok(VectorType::Flat);
            }
            match runs {
                1 => Ok(VectorType::Sequence),
                2 => {
                    let words = peek_words(data, offset, metadata, 4, options)?;
                    if words.len() == 4 && words[2] == ZIGZAG_ONE && words[3] == ZIGZAG_ONE {
                        Ok(VectorType::Sequence)
                    } else {
                        Ok(single_or_flat)
                    }
                }
                _ => Ok(single_or_flat),
            }
        }
        _ => Ok(single_or_flat),
    }
}

fn peek_words(
    data: &[u8],
    offset: &Offset,
    metadata: &StreamMetadata,
    count: usize,
    options: &DecoderOptions,
) -> Result<Vec<u64>> {
    let mut cursor = *offset;
    match metadata.physical() {
        PhysicalTechnique::Varint => Ok(decode_varints_u64(data, &mut cursor, count)?),
        _ => {
            let values = decode_physical_u32(data, &mut cursor, metadata, options)?;
            Ok(values.into_iter().take(count).map(u64::from).collect())
        }
    }
}
