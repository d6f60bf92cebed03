//! Column decoders
//!
//! This module turns the streams of one property column into vectors:
//! integer streams, string columns (plain, dictionary, FSST and shared
//! dictionaries) and the per-column driver that routes between them.

pub mod integer_stream;
pub mod property;
pub mod string;

pub use integer_stream::{
    decode_const_int_stream, decode_const_long_stream, decode_int_stream,
    decode_length_stream_to_offsets, decode_long_f64_stream, decode_long_stream,
    decode_nullable_int_stream, decode_nullable_long_stream, decode_sequence_int_stream,
    decode_sequence_long_stream, vector_type,
};
pub use property::{decode_property_column, read_property_column, skip_column, DecodedColumn};
pub use string::{decode_shared_dictionary, decode_string_column};

use tracing::trace;

use crate::error::{DecodeError, Result, SchemaError};
use crate::integer::byte_rle::{decode_boolean_rle, decode_nullable_boolean_rle};
use crate::metadata::{StreamMetadata, StreamType};
use crate::offset::Offset;
use crate::options::DecoderOptions;
use crate::vector::BitVector;

/// Read a PRESENT stream (header and body) into a bitset.
pub fn decode_present_stream(
    data: &[u8],
    offset: &mut Offset,
    options: &DecoderOptions,
) -> Result<BitVector> {
    let metadata = StreamMetadata::decode(data, offset)?;
    if metadata.stream_type() != StreamType::Present {
        return Err(SchemaError::ContractViolation(format!(
            "expected a PRESENT stream, found {}",
            metadata.stream_type()
        ))
        .into());
    }
    decode_boolean_stream(data, offset, &metadata, None, options)
}

/// Read the body of a byte-RLE boolean stream.
///
/// With `present`, the stream only holds the present values and the result
/// is scattered over it. The offset always ends at the declared end of the
/// stream, since the run decoder stops as soon as it has enough bytes.
pub(crate) fn decode_boolean_stream(
    data: &[u8],
    offset: &mut Offset,
    metadata: &StreamMetadata,
    present: Option<&BitVector>,
    options: &DecoderOptions,
) -> Result<BitVector> {
    metadata.check_limit(options.max_stream_values)?;
    let start = offset.get();
    let bits = match present {
        Some(present) => {
            decode_nullable_boolean_rle(data, offset, metadata.num_values(), present)?
        }
        None => decode_boolean_rle(data, offset, metadata.num_values())?,
    };
    skip_to_stream_end(data, offset, start, metadata.byte_length())?;
    Ok(bits)
}

/// Move `offset` to `start + byte_length`, failing if the body already read
/// past that point or the end lies outside the buffer.
pub(crate) fn skip_to_stream_end(
    data: &[u8],
    offset: &mut Offset,
    start: usize,
    byte_length: usize,
) -> Result<(), DecodeError> {
    let end = start
        .checked_add(byte_length)
        .ok_or_else(|| DecodeError::InvalidData("stream length overflows".to_string()))?;
    if offset.get() > end {
        return Err(DecodeError::InvalidData(format!(
            "stream at offset {} read {} bytes past its declared length of {}",
            start,
            offset.get() - end,
            byte_length
        )));
    }
    if end > data.len() {
        return Err(DecodeError::UnexpectedEof {
            offset: start,
            needed: byte_length,
            available: data.len().saturating_sub(start),
        });
    }
    if offset.get() < end {
        trace!(offset = start, byte_length, "skipping unread stream bytes");
    }
    offset.set(end);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PhysicalTechnique;
    use crate::integer::byte_rle::encode_boolean_rle;
    use crate::metadata::{LogicalTechnique, StreamHeader};

    fn present_stream(bits: &BitVector, padding: usize) -> Vec<u8> {
        let mut body = encode_boolean_rle(bits);
        body.extend(std::iter::repeat(0).take(padding));
        let header = StreamHeader::new(
            StreamType::Present,
            LogicalTechnique::None,
            LogicalTechnique::None,
            PhysicalTechnique::None,
            bits.size(),
            body.len(),
        );
        let mut data = StreamMetadata::Plain(header).to_bytes();
        data.extend_from_slice(&body);
        data
    }

    #[test]
    fn test_present_stream_skips_padding() {
        let bits = BitVector::from_bools(&[true, false, true, true]);
        let mut data = present_stream(&bits, 2);
        data.push(0xAA);
        let mut offset = Offset::default();
        let decoded = decode_present_stream(&data, &mut offset, &DecoderOptions::default()).unwrap();
        assert_eq!(decoded, bits);
        assert_eq!(offset.get(), data.len() - 1);
    }

    #[test]
    fn test_non_present_stream_rejected() {
        let header = StreamHeader::new(
            StreamType::Data(crate::metadata::DictionaryType::None),
            LogicalTechnique::None,
            LogicalTechnique::None,
            PhysicalTechnique::None,
            0,
            0,
        );
        let data = StreamMetadata::Plain(header).to_bytes();
        let mut offset = Offset::default();
        assert!(decode_present_stream(&data, &mut offset, &DecoderOptions::default()).is_err());
    }

    #[test]
    fn test_truncated_stream_end() {
        let mut offset = Offset::new(2);
        assert!(matches!(
            skip_to_stream_end(&[0; 4], &mut offset, 1, 10),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
