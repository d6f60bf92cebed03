//! Stream type and technique enums, and the stream header model.
//!
//! Every stream in a tile starts with a self-describing header. The first
//! byte holds the physical stream type in its upper nibble and a logical
//! sub-type in its lower nibble; the second byte packs two chained logical
//! level techniques and the physical level technique.

mod stream;

pub use stream::{LogicalEncoding, StreamHeader, StreamMetadata};

use std::fmt;

use crate::error::DecodeError;

/// Kind of dictionary held by a DATA stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionaryType {
    None,
    Single,
    Shared,
    Vertex,
    Morton,
    Fsst,
}

impl DictionaryType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => DictionaryType::None,
            1 => DictionaryType::Single,
            2 => DictionaryType::Shared,
            3 => DictionaryType::Vertex,
            4 => DictionaryType::Morton,
            5 => DictionaryType::Fsst,
            _ => return None,
        })
    }

    pub fn bits(self) -> u8 {
        match self {
            DictionaryType::None => 0,
            DictionaryType::Single => 1,
            DictionaryType::Shared => 2,
            DictionaryType::Vertex => 3,
            DictionaryType::Morton => 4,
            DictionaryType::Fsst => 5,
        }
    }
}

/// What an OFFSET stream indexes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OffsetType {
    Vertex,
    Index,
    String,
    Key,
}

impl OffsetType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => OffsetType::Vertex,
            1 => OffsetType::Index,
            2 => OffsetType::String,
            3 => OffsetType::Key,
            _ => return None,
        })
    }

    pub fn bits(self) -> u8 {
        match self {
            OffsetType::Vertex => 0,
            OffsetType::Index => 1,
            OffsetType::String => 2,
            OffsetType::Key => 3,
        }
    }
}

/// What a LENGTH stream measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthType {
    VarBinary,
    Geometries,
    Parts,
    Rings,
    Triangles,
    Symbol,
    Dictionary,
}

impl LengthType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => LengthType::VarBinary,
            1 => LengthType::Geometries,
            2 => LengthType::Parts,
            3 => LengthType::Rings,
            4 => LengthType::Triangles,
            5 => LengthType::Symbol,
            6 => LengthType::Dictionary,
            _ => return None,
        })
    }

    pub fn bits(self) -> u8 {
        match self {
            LengthType::VarBinary => 0,
            LengthType::Geometries => 1,
            LengthType::Parts => 2,
            LengthType::Rings => 3,
            LengthType::Triangles => 4,
            LengthType::Symbol => 5,
            LengthType::Dictionary => 6,
        }
    }
}

/// Physical role of a stream together with its logical sub-type.
///
/// PRESENT streams carry no sub-type; their lower nibble is written as zero
/// and ignored when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Present,
    Data(DictionaryType),
    Offset(OffsetType),
    Length(LengthType),
}

impl StreamType {
    /// Parse the first header byte. `at` is only used for error reporting.
    pub fn from_byte(byte: u8, at: usize) -> Result<Self, DecodeError> {
        let physical = byte >> 4;
        let sub = byte & 0x0F;
        let invalid = |kind: &'static str, value: u8| DecodeError::InvalidEnum {
            kind,
            value,
            offset: at,
        };
        match physical {
            0 => Ok(StreamType::Present),
            1 => DictionaryType::from_bits(sub)
                .map(StreamType::Data)
                .ok_or_else(|| invalid("dictionary type", sub)),
            2 => OffsetType::from_bits(sub)
                .map(StreamType::Offset)
                .ok_or_else(|| invalid("offset type", sub)),
            3 => LengthType::from_bits(sub)
                .map(StreamType::Length)
                .ok_or_else(|| invalid("length type", sub)),
            other => Err(invalid("physical stream type", other)),
        }
    }

    /// Pack into the first header byte.
    pub fn to_byte(self) -> u8 {
        match self {
            StreamType::Present => 0,
            StreamType::Data(sub) => (1 << 4) | sub.bits(),
            StreamType::Offset(sub) => (2 << 4) | sub.bits(),
            StreamType::Length(sub) => (3 << 4) | sub.bits(),
        }
    }

    /// Name of the physical role.
    pub fn physical_name(self) -> &'static str {
        match self {
            StreamType::Present => "PRESENT",
            StreamType::Data(_) => "DATA",
            StreamType::Offset(_) => "OFFSET",
            StreamType::Length(_) => "LENGTH",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Present => f.write_str("PRESENT"),
            StreamType::Data(sub) => write!(f, "DATA({:?})", sub),
            StreamType::Offset(sub) => write!(f, "OFFSET({:?})", sub),
            StreamType::Length(sub) => write!(f, "LENGTH({:?})", sub),
        }
    }
}

/// Logical level technique (3 bits on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalTechnique {
    #[default]
    None,
    Delta,
    ComponentwiseDelta,
    Rle,
    Morton,
    /// Recognised, never decodable
    PseudoDecimal,
}

impl LogicalTechnique {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => LogicalTechnique::None,
            1 => LogicalTechnique::Delta,
            2 => LogicalTechnique::ComponentwiseDelta,
            3 => LogicalTechnique::Rle,
            4 => LogicalTechnique::Morton,
            5 => LogicalTechnique::PseudoDecimal,
            _ => return None,
        })
    }

    pub fn bits(self) -> u8 {
        match self {
            LogicalTechnique::None => 0,
            LogicalTechnique::Delta => 1,
            LogicalTechnique::ComponentwiseDelta => 2,
            LogicalTechnique::Rle => 3,
            LogicalTechnique::Morton => 4,
            LogicalTechnique::PseudoDecimal => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogicalTechnique::None => "NONE",
            LogicalTechnique::Delta => "DELTA",
            LogicalTechnique::ComponentwiseDelta => "COMPONENTWISE_DELTA",
            LogicalTechnique::Rle => "RLE",
            LogicalTechnique::Morton => "MORTON",
            LogicalTechnique::PseudoDecimal => "PSEUDODECIMAL",
        }
    }
}

impl fmt::Display for LogicalTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
