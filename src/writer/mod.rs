//! Column encoders
//!
//! Every encoder produces [`EncodedStream`]s, a header plus its body, that
//! the matching decoder in [`crate::reader`] reads back.

pub mod integer;
pub mod property;
pub mod string;

pub use integer::{
    encode_int_stream, encode_length_stream, encode_long_stream, encode_morton_stream,
    encode_nullable_int_stream, encode_nullable_long_stream,
};
pub use property::{encode_property_column, PropertyColumn, PropertyValues, SharedChild};
pub use string::{encode_dictionary_strings, encode_plain_strings, encode_shared_dictionary};

use crate::codec::PhysicalTechnique;
use crate::integer::byte_rle::encode_boolean_rle;
use crate::metadata::{DictionaryType, LogicalTechnique, StreamHeader, StreamMetadata, StreamType};
use crate::vector::BitVector;

/// A stream header together with its body
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedStream {
    pub metadata: StreamMetadata,
    pub body: Vec<u8>,
}

impl EncodedStream {
    pub fn new(metadata: StreamMetadata, body: Vec<u8>) -> Self {
        Self { metadata, body }
    }

    /// Raw bytes: an uncompressed DATA stream.
    pub fn raw(stream_type: StreamType, num_values: usize, body: Vec<u8>) -> Self {
        let header = StreamHeader::new(
            stream_type,
            LogicalTechnique::None,
            LogicalTechnique::None,
            PhysicalTechnique::None,
            num_values,
            body.len(),
        );
        Self::new(StreamMetadata::Plain(header), body)
    }

    /// Append header and body to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        self.metadata.encode(out);
        out.extend_from_slice(&self.body);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }

    /// Size of header and body in bytes.
    pub fn encoded_len(&self) -> usize {
        self.metadata.to_bytes().len() + self.body.len()
    }
}

/// Encode a nullability bitset as a PRESENT stream.
pub fn encode_present_stream(present: &BitVector) -> EncodedStream {
    EncodedStream::raw(StreamType::Present, present.size(), encode_boolean_rle(present))
}

/// Encode booleans as a byte-RLE DATA stream.
pub fn encode_boolean_stream(values: &BitVector) -> EncodedStream {
    EncodedStream::raw(
        StreamType::Data(DictionaryType::None),
        values.size(),
        encode_boolean_rle(values),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::Offset;
    use crate::options::DecoderOptions;
    use crate::reader::decode_present_stream;

    #[test]
    fn test_present_stream_roundtrip() {
        let present = BitVector::from_bools(&[true; 24]);
        let stream = encode_present_stream(&present);
        // 3 bytes of 0xFF collapse into one run
        assert_eq!(stream.body, vec![0x00, 0xFF]);

        let bytes = stream.to_bytes();
        assert_eq!(bytes.len(), stream.encoded_len());
        let mut offset = Offset::default();
        let decoded =
            decode_present_stream(&bytes, &mut offset, &DecoderOptions::default()).unwrap();
        assert_eq!(decoded.size(), 24);
        assert_eq!(decoded.count_ones(), 24);
    }
}
