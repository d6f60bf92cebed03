use tracing::trace;

use super::{LogicalTechnique, StreamType};
use crate::codec::varint::{decode_varint_u32, encode_varint_into};
use crate::codec::PhysicalTechnique;
use crate::error::{CodecError, DecodeError};
use crate::offset::Offset;

/// Fields common to every stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub stream_type: StreamType,
    pub technique1: LogicalTechnique,
    pub technique2: LogicalTechnique,
    pub physical: PhysicalTechnique,
    /// Number of values after the physical level, before logical expansion
    pub num_values: usize,
    /// Size of the stream body in bytes
    pub byte_length: usize,
}

impl StreamHeader {
    pub fn new(
        stream_type: StreamType,
        technique1: LogicalTechnique,
        technique2: LogicalTechnique,
        physical: PhysicalTechnique,
        num_values: usize,
        byte_length: usize,
    ) -> Self {
        Self {
            stream_type,
            technique1,
            technique2,
            physical,
            num_values,
            byte_length,
        }
    }

    fn uses_rle(&self) -> bool {
        self.technique1 == LogicalTechnique::Rle || self.technique2 == LogicalTechnique::Rle
    }
}

/// A decoded stream header.
///
/// Which variant is read is decided by the header itself: MORTON as the first
/// technique adds two Morton fields, otherwise RLE in either technique with a
/// physical technique other than NONE adds the run counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMetadata {
    Plain(StreamHeader),
    Rle {
        header: StreamHeader,
        runs: usize,
        num_rle_values: usize,
    },
    Morton {
        header: StreamHeader,
        num_bits: u32,
        coordinate_shift: u32,
    },
}

/// Logical decoding to apply to a stream, resolved once from its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalEncoding {
    None,
    Delta,
    Rle { runs: usize, num_rle_values: usize },
    DeltaRle { runs: usize, num_rle_values: usize },
    Morton { num_bits: u32, coordinate_shift: u32 },
    ComponentwiseDelta,
}

impl StreamMetadata {
    /// Read a stream header at `offset`.
    ///
    /// # Errors
    /// - `DecodeError::UnexpectedEof` if the header is truncated
    /// - `DecodeError::InvalidEnum` for any out-of-range nibble or bit field
    pub fn decode(data: &[u8], offset: &mut Offset) -> Result<Self, DecodeError> {
        let start = offset.get();
        let stream_type = StreamType::from_byte(offset.read_u8(data)?, start)?;

        let encodings_at = offset.get();
        let encodings = offset.read_u8(data)?;
        let technique1 = logical_from_bits(encodings >> 5, encodings_at)?;
        let technique2 = logical_from_bits((encodings >> 2) & 0x07, encodings_at)?;
        // two bits can't be out of range
        let physical = PhysicalTechnique::from_bits(encodings & 0x03).unwrap_or_default();

        let num_values = decode_varint_u32(data, offset)? as usize;
        let byte_length = decode_varint_u32(data, offset)? as usize;
        let header = StreamHeader::new(
            stream_type,
            technique1,
            technique2,
            physical,
            num_values,
            byte_length,
        );

        let metadata = if technique1 == LogicalTechnique::Morton {
            let num_bits = decode_varint_u32(data, offset)?;
            let coordinate_shift = decode_varint_u32(data, offset)?;
            StreamMetadata::Morton {
                header,
                num_bits,
                coordinate_shift,
            }
        } else if header.uses_rle() && physical != PhysicalTechnique::None {
            let runs = decode_varint_u32(data, offset)? as usize;
            let num_rle_values = decode_varint_u32(data, offset)? as usize;
            StreamMetadata::Rle {
                header,
                runs,
                num_rle_values,
            }
        } else {
            StreamMetadata::Plain(header)
        };

        trace!(
            offset = start,
            stream_type = %stream_type,
            technique1 = %technique1,
            technique2 = %technique2,
            physical = %physical,
            num_values,
            byte_length,
            "stream header"
        );
        Ok(metadata)
    }

    /// Append the wire form of this header to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let header = self.header();
        out.push(header.stream_type.to_byte());
        out.push(
            (header.technique1.bits() << 5)
                | (header.technique2.bits() << 2)
                | header.physical.bits(),
        );
        encode_varint_into(header.num_values as u64, out);
        encode_varint_into(header.byte_length as u64, out);
        match *self {
            StreamMetadata::Plain(_) => {}
            StreamMetadata::Rle {
                runs,
                num_rle_values,
                ..
            } => {
                encode_varint_into(runs as u64, out);
                encode_varint_into(num_rle_values as u64, out);
            }
            StreamMetadata::Morton {
                num_bits,
                coordinate_shift,
                ..
            } => {
                encode_varint_into(num_bits as u64, out);
                encode_varint_into(coordinate_shift as u64, out);
            }
        }
    }

    /// The wire form of this header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        self.encode(&mut out);
        out
    }

    pub fn header(&self) -> &StreamHeader {
        match self {
            StreamMetadata::Plain(header)
            | StreamMetadata::Rle { header, .. }
            | StreamMetadata::Morton { header, .. } => header,
        }
    }

    pub fn stream_type(&self) -> StreamType {
        self.header().stream_type
    }

    pub fn num_values(&self) -> usize {
        self.header().num_values
    }

    pub fn byte_length(&self) -> usize {
        self.header().byte_length
    }

    pub fn physical(&self) -> PhysicalTechnique {
        self.header().physical
    }

    /// Run count of an RLE header.
    pub fn runs(&self) -> Option<usize> {
        match self {
            StreamMetadata::Rle { runs, .. } => Some(*runs),
            _ => None,
        }
    }

    /// Number of logical values once runs are expanded.
    pub fn decompressed_count(&self) -> usize {
        match self {
            StreamMetadata::Rle { num_rle_values, .. } => *num_rle_values,
            other => other.num_values(),
        }
    }

    /// Resolve the technique pair into a single decodable encoding.
    ///
    /// # Errors
    /// `CodecError::UnsupportedTechnique` for PSEUDODECIMAL and for any pair
    /// that has no decoder.
    pub fn logical_encoding(&self) -> Result<LogicalEncoding, CodecError> {
        use LogicalTechnique as T;

        let header = self.header();
        match (self, header.technique1, header.technique2) {
            (_, T::PseudoDecimal, _) | (_, _, T::PseudoDecimal) => Err(
                CodecError::UnsupportedTechnique("PSEUDODECIMAL".to_string()),
            ),
            (StreamMetadata::Plain(_), T::None, T::None) => Ok(LogicalEncoding::None),
            (StreamMetadata::Plain(_), T::Delta, T::None) => Ok(LogicalEncoding::Delta),
            (
                StreamMetadata::Rle {
                    runs,
                    num_rle_values,
                    ..
                },
                T::Rle,
                T::None,
            ) => Ok(LogicalEncoding::Rle {
                runs: *runs,
                num_rle_values: *num_rle_values,
            }),
            (
                StreamMetadata::Rle {
                    runs,
                    num_rle_values,
                    ..
                },
                T::Delta,
                T::Rle,
            ) => Ok(LogicalEncoding::DeltaRle {
                runs: *runs,
                num_rle_values: *num_rle_values,
            }),
            (
                StreamMetadata::Morton {
                    num_bits,
                    coordinate_shift,
                    ..
                },
                T::Morton,
                T::None | T::Delta,
            ) => Ok(LogicalEncoding::Morton {
                num_bits: *num_bits,
                coordinate_shift: *coordinate_shift,
            }),
            (StreamMetadata::Plain(_), T::ComponentwiseDelta, T::None) => {
                Ok(LogicalEncoding::ComponentwiseDelta)
            }
            (_, t1, t2) => Err(CodecError::UnsupportedTechnique(format!(
                "{} + {} with {} physical technique",
                t1, t2, header.physical
            ))),
        }
    }

    /// Reject headers that declare more values than `limit`.
    pub fn check_limit(&self, limit: Option<usize>) -> Result<(), DecodeError> {
        let Some(limit) = limit else {
            return Ok(());
        };
        let declared = self.num_values().max(self.decompressed_count());
        if declared > limit {
            return Err(DecodeError::LimitExceeded { declared, limit });
        }
        Ok(())
    }
}

impl LogicalEncoding {
    /// Whether the encoding carries runs.
    pub fn is_rle(&self) -> bool {
        matches!(
            self,
            LogicalEncoding::Rle { .. } | LogicalEncoding::DeltaRle { .. }
        )
    }
}

fn logical_from_bits(bits: u8, at: usize) -> Result<LogicalTechnique, DecodeError> {
    LogicalTechnique::from_bits(bits).ok_or(DecodeError::InvalidEnum {
        kind: "logical level technique",
        value: bits,
        offset: at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DictionaryType, LengthType, OffsetType};

    fn header(
        stream_type: StreamType,
        t1: LogicalTechnique,
        t2: LogicalTechnique,
        physical: PhysicalTechnique,
    ) -> StreamHeader {
        StreamHeader::new(stream_type, t1, t2, physical, 5, 9)
    }

    fn roundtrip(metadata: StreamMetadata) -> StreamMetadata {
        let bytes = metadata.to_bytes();
        let mut offset = Offset::default();
        let decoded = StreamMetadata::decode(&bytes, &mut offset).unwrap();
        assert_eq!(offset.get(), bytes.len());
        decoded
    }

    #[test]
    fn test_plain_header_layout() {
        let metadata = StreamMetadata::Plain(header(
            StreamType::Data(DictionaryType::Single),
            LogicalTechnique::Delta,
            LogicalTechnique::None,
            PhysicalTechnique::Varint,
        ));
        // 0x11 = DATA<<4 | SINGLE, 0x22 = DELTA<<5 | NONE<<2 | VARINT
        assert_eq!(metadata.to_bytes(), vec![0x11, 0x22, 5, 9]);
        assert_eq!(roundtrip(metadata), metadata);
        assert_eq!(metadata.decompressed_count(), 5);
    }

    #[test]
    fn test_rle_header_layout() {
        let metadata = StreamMetadata::Rle {
            header: header(
                StreamType::Offset(OffsetType::String),
                LogicalTechnique::Delta,
                LogicalTechnique::Rle,
                PhysicalTechnique::Varint,
            ),
            runs: 2,
            num_rle_values: 300,
        };
        let bytes = metadata.to_bytes();
        assert_eq!(&bytes[..2], &[0x22, 0x2E]);
        assert_eq!(roundtrip(metadata), metadata);
        assert_eq!(metadata.decompressed_count(), 300);
        assert_eq!(
            metadata.logical_encoding().unwrap(),
            LogicalEncoding::DeltaRle {
                runs: 2,
                num_rle_values: 300
            }
        );
    }

    #[test]
    fn test_rle_without_physical_has_no_extension() {
        let bytes = [0x30, 0x60, 4, 4, 0xFF];
        let mut offset = Offset::default();
        let metadata = StreamMetadata::decode(&bytes, &mut offset).unwrap();
        assert!(matches!(metadata, StreamMetadata::Plain(_)));
        assert_eq!(offset.get(), 4);
        assert!(metadata.logical_encoding().is_err());
    }

    #[test]
    fn test_morton_header_takes_precedence() {
        let metadata = StreamMetadata::Morton {
            header: header(
                StreamType::Data(DictionaryType::Morton),
                LogicalTechnique::Morton,
                LogicalTechnique::Rle,
                PhysicalTechnique::Varint,
            ),
            num_bits: 14,
            coordinate_shift: 2,
        };
        assert_eq!(roundtrip(metadata), metadata);
    }

    #[test]
    fn test_logical_encoding_resolution() {
        let plain = |t1, t2| {
            StreamMetadata::Plain(header(
                StreamType::Length(LengthType::VarBinary),
                t1,
                t2,
                PhysicalTechnique::Varint,
            ))
        };
        assert_eq!(
            plain(LogicalTechnique::None, LogicalTechnique::None)
                .logical_encoding()
                .unwrap(),
            LogicalEncoding::None
        );
        assert_eq!(
            plain(LogicalTechnique::ComponentwiseDelta, LogicalTechnique::None)
                .logical_encoding()
                .unwrap(),
            LogicalEncoding::ComponentwiseDelta
        );
        assert!(matches!(
            plain(LogicalTechnique::PseudoDecimal, LogicalTechnique::None).logical_encoding(),
            Err(CodecError::UnsupportedTechnique(_))
        ));
        assert!(plain(LogicalTechnique::Delta, LogicalTechnique::Delta)
            .logical_encoding()
            .is_err());
    }

    #[test]
    fn test_invalid_logical_bits() {
        // technique1 = 7
        let bytes = [0x10, 0xE0, 0, 0];
        let mut offset = Offset::default();
        assert_eq!(
            StreamMetadata::decode(&bytes, &mut offset),
            Err(DecodeError::InvalidEnum {
                kind: "logical level technique",
                value: 7,
                offset: 1
            })
        );
    }

    #[test]
    fn test_truncated_header() {
        let bytes = [0x10, 0x02, 0x80];
        let mut offset = Offset::default();
        assert!(matches!(
            StreamMetadata::decode(&bytes, &mut offset),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_check_limit() {
        let metadata = StreamMetadata::Rle {
            header: header(
                StreamType::Data(DictionaryType::None),
                LogicalTechnique::Rle,
                LogicalTechnique::None,
                PhysicalTechnique::Varint,
            ),
            runs: 1,
            num_rle_values: 1_000_000,
        };
        assert!(metadata.check_limit(None).is_ok());
        assert!(metadata.check_limit(Some(1_000_000)).is_ok());
        assert_eq!(
            metadata.check_limit(Some(10)),
            Err(DecodeError::LimitExceeded {
                declared: 1_000_000,
                limit: 10
            })
        );
    }
}
