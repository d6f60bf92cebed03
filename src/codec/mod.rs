//! Physical level techniques
//!
//! The physical level turns the logically-encoded integer sequence of a stream
//! into bytes. Varint is built in; FastPFOR is a pluggable codec supplied by the
//! caller through [`IntegerCodec`]; ALP is recognised but has no decoder.
//! Float and double columns are stored as plain little-endian arrays.

pub mod float;
pub mod varint;

use std::fmt;

use tracing::warn;

use crate::error::{CodecError, DecodeError, EncodeError, TileError};
use crate::offset::Offset;

/// Physical level technique, packed into the low 2 bits of a stream's
/// encoding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PhysicalTechnique {
    /// One byte per value
    #[default]
    None,
    /// Bit-packed blocks, decoded by a caller-supplied codec
    FastPfor,
    /// Base-128 varints
    Varint,
    /// Adaptive lossless floating point (not implemented)
    Alp,
}

impl PhysicalTechnique {
    /// Parse the 2-bit wire value.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(PhysicalTechnique::None),
            1 => Some(PhysicalTechnique::FastPfor),
            2 => Some(PhysicalTechnique::Varint),
            3 => Some(PhysicalTechnique::Alp),
            _ => None,
        }
    }

    /// The 2-bit wire value.
    pub fn bits(self) -> u8 {
        match self {
            PhysicalTechnique::None => 0,
            PhysicalTechnique::FastPfor => 1,
            PhysicalTechnique::Varint => 2,
            PhysicalTechnique::Alp => 3,
        }
    }

    /// Canonical name, as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            PhysicalTechnique::None => "NONE",
            PhysicalTechnique::FastPfor => "FAST_PFOR",
            PhysicalTechnique::Varint => "VARINT",
            PhysicalTechnique::Alp => "ALP",
        }
    }

    /// Decode `num_values` 32-bit values from a stream of `byte_length` bytes
    /// starting at `offset`.
    ///
    /// On success the offset points just past the stream. A stream whose
    /// values end before its declared length is tolerated (the remaining
    /// bytes are skipped); one that reads past it is an error.
    ///
    /// # Errors
    /// - `DecodeError` if the data is truncated or inconsistent with the header
    /// - `CodecError::UnsupportedTechnique` for ALP, or FastPFOR without a codec
    pub fn decode_u32(
        self,
        data: &[u8],
        offset: &mut Offset,
        num_values: usize,
        byte_length: usize,
        fast_pfor: Option<&dyn IntegerCodec>,
    ) -> Result<Vec<u32>, TileError> {
        let start = offset.get();
        let values: Vec<u32> = match self {
            PhysicalTechnique::Varint => varint::decode_varints_u32(data, offset, num_values)?,
            PhysicalTechnique::None => {
                let bytes = offset.take(data, byte_length)?;
                check_byte_count(bytes.len(), num_values)?;
                bytes.iter().map(|&b| b as u32).collect()
            }
            PhysicalTechnique::FastPfor => {
                let codec = fast_pfor.ok_or_else(|| {
                    CodecError::UnsupportedTechnique(
                        "FAST_PFOR stream but no FastPFOR codec is configured".to_string(),
                    )
                })?;
                let bytes = offset.take(data, byte_length)?;
                let values = codec.decode(bytes, num_values)?;
                if values.len() != num_values {
                    return Err(CodecError::CodecFailure(format!(
                        "{} produced {} values, expected {}",
                        codec.name(),
                        values.len(),
                        num_values
                    ))
                    .into());
                }
                values
            }
            PhysicalTechnique::Alp => {
                return Err(CodecError::UnsupportedTechnique("ALP".to_string()).into())
            }
        };
        finish_stream(offset, start, byte_length)?;
        Ok(values)
    }

    /// Decode `num_values` 64-bit values. Only VARINT and NONE carry 64-bit data.
    pub fn decode_u64(
        self,
        data: &[u8],
        offset: &mut Offset,
        num_values: usize,
        byte_length: usize,
    ) -> Result<Vec<u64>, TileError> {
        let start = offset.get();
        let values: Vec<u64> = match self {
            PhysicalTechnique::Varint => varint::decode_varints_u64(data, offset, num_values)?,
            PhysicalTechnique::None => {
                let bytes = offset.take(data, byte_length)?;
                check_byte_count(bytes.len(), num_values)?;
                bytes.iter().map(|&b| b as u64).collect()
            }
            other => {
                return Err(CodecError::UnsupportedTechnique(format!(
                    "{} for 64-bit integer streams",
                    other.name()
                ))
                .into())
            }
        };
        finish_stream(offset, start, byte_length)?;
        Ok(values)
    }

    /// Decode `num_values` 64-bit varints as `f64` values.
    pub fn decode_f64(
        self,
        data: &[u8],
        offset: &mut Offset,
        num_values: usize,
        byte_length: usize,
    ) -> Result<Vec<f64>, TileError> {
        let start = offset.get();
        let values = match self {
            PhysicalTechnique::Varint => varint::decode_varints_f64(data, offset, num_values)?,
            other => {
                return Err(CodecError::UnsupportedTechnique(format!(
                    "{} for 64-bit integer streams",
                    other.name()
                ))
                .into())
            }
        };
        finish_stream(offset, start, byte_length)?;
        Ok(values)
    }

    /// Encode 32-bit values, returning the stream body.
    pub fn encode_u32(
        self,
        values: &[u32],
        fast_pfor: Option<&dyn IntegerCodec>,
    ) -> Result<Vec<u8>, EncodeError> {
        match self {
            PhysicalTechnique::Varint => {
                let mut out = Vec::with_capacity(values.len());
                varint::encode_varints_u32(values, &mut out);
                Ok(out)
            }
            PhysicalTechnique::None => encode_bytes(values.iter().map(|&v| v as u64)),
            PhysicalTechnique::FastPfor => {
                let codec = fast_pfor.ok_or_else(|| {
                    EncodeError::UnsupportedTechnique(
                        "FAST_PFOR requested but no FastPFOR codec is configured".to_string(),
                    )
                })?;
                codec
                    .encode(values)
                    .map_err(|err| EncodeError::InvalidInput(err.to_string()))
            }
            PhysicalTechnique::Alp => Err(EncodeError::UnsupportedTechnique("ALP".to_string())),
        }
    }

    /// Encode 64-bit values, returning the stream body.
    pub fn encode_u64(self, values: &[u64]) -> Result<Vec<u8>, EncodeError> {
        match self {
            PhysicalTechnique::Varint => {
                let mut out = Vec::with_capacity(values.len());
                varint::encode_varints_u64(values, &mut out);
                Ok(out)
            }
            PhysicalTechnique::None => encode_bytes(values.iter().copied()),
            other => Err(EncodeError::UnsupportedTechnique(format!(
                "{} for 64-bit integer streams",
                other.name()
            ))),
        }
    }
}

impl fmt::Display for PhysicalTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A block integer codec plugged in as the FAST_PFOR physical technique.
///
/// `decode` receives exactly the stream body (its declared byte length) and
/// must return exactly `num_values` values. `encode` is its inverse.
pub trait IntegerCodec: Send + Sync + fmt::Debug {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Decode a stream body into `num_values` values.
    fn decode(&self, data: &[u8], num_values: usize) -> Result<Vec<u32>, CodecError>;

    /// Encode values into a stream body.
    fn encode(&self, values: &[u32]) -> Result<Vec<u8>, CodecError>;
}

fn check_byte_count(byte_length: usize, num_values: usize) -> Result<(), DecodeError> {
    if byte_length != num_values {
        return Err(DecodeError::InvalidData(format!(
            "byte-per-value stream has {} bytes for {} values",
            byte_length, num_values
        )));
    }
    Ok(())
}

pub(crate) fn finish_stream(
    offset: &mut Offset,
    start: usize,
    byte_length: usize,
) -> Result<(), DecodeError> {
    let consumed = offset.get() - start;
    if consumed > byte_length {
        return Err(DecodeError::InvalidData(format!(
            "stream at offset {} read {} bytes past its declared length of {}",
            start,
            consumed - byte_length,
            byte_length
        )));
    }
    if consumed < byte_length {
        warn!(
            offset = start,
            consumed, byte_length, "stream body shorter than declared, skipping padding"
        );
        offset.set(start + byte_length);
    }
    Ok(())
}

fn encode_bytes(values: impl Iterator<Item = u64>) -> Result<Vec<u8>, EncodeError> {
    values
        .map(|v| {
            u8::try_from(v).map_err(|_| {
                EncodeError::InvalidInput(format!(
                    "value {} does not fit the byte-per-value NONE technique",
                    v
                ))
            })
        })
        .collect()
}
