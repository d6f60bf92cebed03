//! Integer stream encoding, the inverse of `reader::integer_stream`.

use tracing::trace;

use super::EncodedStream;
use crate::codec::PhysicalTechnique;
use crate::error::EncodeError;
use crate::integer::delta::{encode_componentwise_delta, encode_delta, encode_zigzag_delta};
use crate::integer::nullable::compact;
use crate::integer::rle::{encode_rle, encode_zigzag_rle};
use crate::integer::zigzag::encode_zigzag;
use crate::integer::Word;
use crate::metadata::{LengthType, LogicalTechnique, StreamHeader, StreamMetadata, StreamType};
use crate::options::{EncoderOptions, IntegerEncodingChoice};
use crate::vector::BitVector;

/// Words the physical level can write
trait PhysicalWord: Word {
    fn encode_physical(values: &[Self], options: &EncoderOptions) -> Result<Vec<u8>, EncodeError>;
}

impl PhysicalWord for u32 {
    fn encode_physical(values: &[u32], options: &EncoderOptions) -> Result<Vec<u8>, EncodeError> {
        options
            .physical_technique
            .encode_u32(values, options.fast_pfor_codec())
    }
}

impl PhysicalWord for u64 {
    fn encode_physical(values: &[u64], options: &EncoderOptions) -> Result<Vec<u8>, EncodeError> {
        options.physical_technique.encode_u64(values)
    }
}

/// Logical encodings the writer can produce without extra parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Technique {
    None,
    Delta,
    Rle,
    DeltaRle,
    ComponentwiseDelta,
}

impl Technique {
    fn from_choice(choice: IntegerEncodingChoice) -> Result<Option<Self>, EncodeError> {
        match choice {
            IntegerEncodingChoice::Auto => Ok(None),
            IntegerEncodingChoice::DeltaRle => Ok(Some(Technique::DeltaRle)),
            IntegerEncodingChoice::Fixed(technique) => match technique {
                LogicalTechnique::None => Ok(Some(Technique::None)),
                LogicalTechnique::Delta => Ok(Some(Technique::Delta)),
                LogicalTechnique::Rle => Ok(Some(Technique::Rle)),
                LogicalTechnique::ComponentwiseDelta => Ok(Some(Technique::ComponentwiseDelta)),
                LogicalTechnique::Morton => Err(EncodeError::UnsupportedTechnique(
                    "MORTON needs curve parameters, use encode_morton_stream".to_string(),
                )),
                LogicalTechnique::PseudoDecimal => Err(EncodeError::UnsupportedTechnique(
                    "PSEUDODECIMAL".to_string(),
                )),
            },
        }
    }
}

fn encode_with<W: PhysicalWord>(
    values: &[W],
    signed: bool,
    technique: Technique,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    use LogicalTechnique as T;

    let physical = options.physical_technique;
    let uses_rle = matches!(technique, Technique::Rle | Technique::DeltaRle);
    if uses_rle && physical == PhysicalTechnique::None {
        return Err(EncodeError::UnsupportedTechnique(
            "RLE streams need a physical technique other than NONE".to_string(),
        ));
    }

    let (words, technique1, technique2, runs) = match technique {
        Technique::None if signed => (encode_zigzag(values), T::None, T::None, None),
        Technique::None => (values.to_vec(), T::None, T::None, None),
        Technique::Delta => (encode_zigzag_delta(values), T::Delta, T::None, None),
        Technique::ComponentwiseDelta => {
            let words = encode_componentwise_delta(values)
                .map_err(|err| EncodeError::InvalidInput(err.to_string()))?;
            (words, T::ComponentwiseDelta, T::None, None)
        }
        Technique::Rle => {
            let (words, runs) = if signed {
                encode_zigzag_rle(values)
            } else {
                encode_rle(values)
            };
            (words, T::Rle, T::None, Some(runs))
        }
        Technique::DeltaRle => {
            let (words, runs) = encode_rle(&encode_zigzag_delta(values));
            (words, T::Delta, T::Rle, Some(runs))
        }
    };

    let body = W::encode_physical(&words, options)?;
    let header = StreamHeader::new(
        stream_type,
        technique1,
        technique2,
        physical,
        words.len(),
        body.len(),
    );
    let metadata = match runs {
        Some(runs) => StreamMetadata::Rle {
            header,
            runs,
            num_rle_values: values.len(),
        },
        None => StreamMetadata::Plain(header),
    };
    Ok(EncodedStream::new(metadata, body))
}

fn encode_stream<W: PhysicalWord>(
    values: &[W],
    signed: bool,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    if let Some(technique) = Technique::from_choice(options.integer_encoding)? {
        return encode_with(values, signed, technique, stream_type, options);
    }

    let mut candidates = vec![Technique::None, Technique::Delta];
    if options.physical_technique != PhysicalTechnique::None && !values.is_empty() {
        candidates.extend([Technique::Rle, Technique::DeltaRle]);
    }

    let mut best: Option<(Technique, EncodedStream)> = None;
    for technique in candidates {
        let stream = encode_with(values, signed, technique, stream_type, options)?;
        let smaller = best
            .as_ref()
            .map_or(true, |(_, current)| stream.encoded_len() < current.encoded_len());
        if smaller {
            best = Some((technique, stream));
        }
    }
    match best {
        Some((technique, stream)) => {
            trace!(
                ?technique,
                num_values = values.len(),
                bytes = stream.encoded_len(),
                "picked integer encoding"
            );
            Ok(stream)
        }
        None => Err(EncodeError::InvalidInput(
            "no integer encoding applies".to_string(),
        )),
    }
}

/// Encode a 32-bit integer stream. Signed values are passed as their two's
/// complement words (`value as u32`).
pub fn encode_int_stream(
    values: &[u32],
    signed: bool,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    encode_stream(values, signed, stream_type, options)
}

/// Encode a 64-bit integer stream.
pub fn encode_long_stream(
    values: &[u64],
    signed: bool,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    encode_stream(values, signed, stream_type, options)
}

fn check_present<T>(values: &[T], present: &BitVector) -> Result<(), EncodeError> {
    if values.len() != present.size() {
        return Err(EncodeError::InvalidInput(format!(
            "{} values for a present stream of {} entries",
            values.len(),
            present.size()
        )));
    }
    Ok(())
}

/// Encode the present values of a 32-bit column.
///
/// `values` has one entry per feature; entries at absent positions are
/// dropped.
pub fn encode_nullable_int_stream(
    values: &[u32],
    present: &BitVector,
    signed: bool,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    check_present(values, present)?;
    encode_stream(&compact(present, values), signed, stream_type, options)
}

/// Encode the present values of a 64-bit column.
pub fn encode_nullable_long_stream(
    values: &[u64],
    present: &BitVector,
    signed: bool,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    check_present(values, present)?;
    encode_stream(&compact(present, values), signed, stream_type, options)
}

/// Encode string or symbol lengths as an unsigned LENGTH stream.
pub fn encode_length_stream(
    lengths: &[u32],
    length_type: LengthType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    let options = match options.integer_encoding {
        IntegerEncodingChoice::Fixed(
            LogicalTechnique::ComponentwiseDelta | LogicalTechnique::Morton,
        ) => {
            // lengths only decode through NONE, DELTA and the RLE family
            let mut options = options.clone();
            options.integer_encoding = IntegerEncodingChoice::Auto;
            std::borrow::Cow::Owned(options)
        }
        _ => std::borrow::Cow::Borrowed(options),
    };
    encode_stream(lengths, false, StreamType::Length(length_type), &options)
}

/// Encode sorted Morton codes as a plain delta stream with the Morton
/// header extension.
pub fn encode_morton_stream(
    codes: &[u32],
    num_bits: u32,
    coordinate_shift: u32,
    stream_type: StreamType,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    if codes.windows(2).any(|w| w[0] > w[1]) {
        return Err(EncodeError::InvalidInput(
            "Morton codes must be sorted".to_string(),
        ));
    }
    let words = encode_delta(codes);
    let body = <u32 as PhysicalWord>::encode_physical(&words, options)?;
    let header = StreamHeader::new(
        stream_type,
        LogicalTechnique::Morton,
        LogicalTechnique::None,
        options.physical_technique,
        words.len(),
        body.len(),
    );
    Ok(EncodedStream::new(
        StreamMetadata::Morton {
            header,
            num_bits,
            coordinate_shift,
        },
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DictionaryType, LogicalEncoding, OffsetType};
    use crate::offset::Offset;
    use crate::options::DecoderOptions;
    use crate::reader::{decode_int_stream, decode_long_stream, decode_nullable_int_stream};

    const DATA: StreamType = StreamType::Data(DictionaryType::None);

    fn decode(stream: &EncodedStream, signed: bool) -> (StreamMetadata, Vec<u32>) {
        let bytes = stream.to_bytes();
        let mut offset = Offset::default();
        let metadata = StreamMetadata::decode(&bytes, &mut offset).unwrap();
        let values = decode_int_stream(
            &bytes,
            &mut offset,
            &metadata,
            signed,
            None,
            &DecoderOptions::default(),
        )
        .unwrap();
        assert_eq!(offset.get(), bytes.len());
        (metadata, values)
    }

    #[test]
    fn test_auto_picks_rle_for_runs() {
        let values = [10u32, 10, 20, 20, 20, 20, 20, 20];
        let stream = encode_int_stream(&values, false, DATA, &EncoderOptions::default()).unwrap();
        let (metadata, decoded) = decode(&stream, false);
        assert_eq!(
            metadata.logical_encoding().unwrap(),
            LogicalEncoding::Rle {
                runs: 2,
                num_rle_values: 8
            }
        );
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_auto_picks_delta_rle_for_ids() {
        let values: Vec<u32> = (1..=100).collect();
        let stream = encode_int_stream(&values, false, DATA, &EncoderOptions::default()).unwrap();
        let (metadata, decoded) = decode(&stream, false);
        assert!(matches!(
            metadata.logical_encoding().unwrap(),
            LogicalEncoding::DeltaRle { runs: 1, .. }
        ));
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_fixed_techniques_roundtrip() {
        let values: Vec<u32> = [-5i32, 7, 7, -300, 0, 12_000]
            .iter()
            .map(|&v| v as u32)
            .collect();
        for technique in [
            LogicalTechnique::None,
            LogicalTechnique::Delta,
            LogicalTechnique::Rle,
            LogicalTechnique::ComponentwiseDelta,
        ] {
            let options = EncoderOptions::new()
                .with_integer_encoding(IntegerEncodingChoice::Fixed(technique));
            let stream = encode_int_stream(&values, true, DATA, &options).unwrap();
            assert_eq!(decode(&stream, true).1, values, "{}", technique);
        }
        let options = EncoderOptions::new().with_integer_encoding(IntegerEncodingChoice::DeltaRle);
        let stream = encode_int_stream(&values, true, DATA, &options).unwrap();
        assert_eq!(decode(&stream, true).1, values);
    }

    #[test]
    fn test_rle_needs_physical_technique() {
        let options = EncoderOptions::new()
            .with_physical_technique(PhysicalTechnique::None)
            .with_integer_encoding(IntegerEncodingChoice::Fixed(LogicalTechnique::Rle));
        assert!(encode_int_stream(&[1, 1, 1], false, DATA, &options).is_err());

        // auto mode falls back to the byte-per-value techniques
        let options = EncoderOptions::new().with_physical_technique(PhysicalTechnique::None);
        let stream = encode_int_stream(&[1, 1, 1], false, DATA, &options).unwrap();
        assert_eq!(decode(&stream, false).1, vec![1, 1, 1]);
    }

    #[test]
    fn test_nullable_roundtrip() {
        let present = BitVector::from_bools(&[true, false, true, true]);
        let values = [5u32, 0, 6, 7];
        let stream = encode_nullable_int_stream(
            &values,
            &present,
            false,
            StreamType::Offset(OffsetType::String),
            &EncoderOptions::default(),
        )
        .unwrap();
        assert_eq!(stream.metadata.decompressed_count(), 3);

        let bytes = stream.to_bytes();
        let mut offset = Offset::default();
        let metadata = StreamMetadata::decode(&bytes, &mut offset).unwrap();
        let decoded = decode_nullable_int_stream(
            &bytes,
            &mut offset,
            &metadata,
            false,
            &present,
            &DecoderOptions::default(),
        )
        .unwrap();
        assert_eq!(compact(&present, &decoded), vec![5, 6, 7]);
        let short = encode_nullable_int_stream(
            &values[..2],
            &present,
            false,
            DATA,
            &EncoderOptions::default(),
        );
        assert!(short.is_err());
    }

    #[test]
    fn test_long_roundtrip() {
        let values = [u64::MAX, 0, 1 << 40];
        let stream = encode_long_stream(&values, false, DATA, &EncoderOptions::default()).unwrap();
        let bytes = stream.to_bytes();
        let mut offset = Offset::default();
        let metadata = StreamMetadata::decode(&bytes, &mut offset).unwrap();
        let decoded =
            decode_long_stream(&bytes, &mut offset, &metadata, false, &DecoderOptions::default())
                .unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_morton_stream() {
        let stream = encode_morton_stream(
            &[3, 9, 40],
            16,
            0,
            StreamType::Offset(OffsetType::Vertex),
            &EncoderOptions::default(),
        )
        .unwrap();
        assert!(matches!(stream.metadata, StreamMetadata::Morton { num_bits: 16, .. }));
        assert_eq!(decode(&stream, false).1, vec![3, 9, 40]);
        assert!(encode_morton_stream(&[2, 1], 16, 0, DATA, &EncoderOptions::default()).is_err());
    }

    #[test]
    fn test_morton_choice_rejected() {
        let options = EncoderOptions::new()
            .with_integer_encoding(IntegerEncodingChoice::Fixed(LogicalTechnique::Morton));
        assert!(encode_int_stream(&[1, 2], false, DATA, &options).is_err());
        // length streams ignore choices they cannot decode
        assert!(encode_length_stream(&[1, 2], LengthType::VarBinary, &options).is_ok());
    }
}
