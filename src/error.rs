//! Error types for tile column decoding and encoding

use thiserror::Error;

/// Errors raised while reading the raw byte layout of a stream
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Reading would run past the end of the buffer
    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Varint with too many continuation bytes
    #[error("Invalid varint encoding at offset {offset}")]
    InvalidVarint { offset: usize },
    /// Enum nibble or bit field outside of its declared range
    #[error("Invalid {kind} value {value} at offset {offset}")]
    InvalidEnum {
        kind: &'static str,
        value: u8,
        offset: usize,
    },
    /// Structurally inconsistent stream contents
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Header declares more values than the configured limit
    #[error("Stream declares {declared} values, limit is {limit}")]
    LimitExceeded { declared: usize, limit: usize },
}

/// Errors raised by logical or physical level techniques
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Technique combination that is recognised but not implemented
    #[error("Unsupported technique: {0}")]
    UnsupportedTechnique(String),
    /// A pluggable codec failed to decode its payload
    #[error("Codec failure: {0}")]
    CodecFailure(String),
}

/// Errors raised when a column does not match its declared shape
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Stream layout contradicts the column description
    #[error("Schema contract violation: {0}")]
    ContractViolation(String),
    /// Column type with no decoder
    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),
}

/// Errors raised by the write path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Input values cannot be represented with the requested encoding
    #[error("Invalid encoder input: {0}")]
    InvalidInput(String),
    /// Requested technique has no encoder
    #[error("Unsupported technique: {0}")]
    UnsupportedTechnique(String),
}

/// Top-level error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TileError {
    /// Corrupt or truncated stream
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Technique error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Column shape error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Write path error
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Any of the above, attributed to a named column
    #[error("Column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: Box<TileError>,
    },
}

impl TileError {
    /// Attach a column name to this error.
    ///
    /// Errors that already carry a column are returned unchanged so the
    /// innermost (most specific) column name wins.
    pub fn in_column(self, column: impl Into<String>) -> Self {
        match self {
            err @ TileError::Column { .. } => err,
            err => TileError::Column {
                column: column.into(),
                source: Box::new(err),
            },
        }
    }

    /// The error with any column context stripped.
    pub fn root(&self) -> &TileError {
        match self {
            TileError::Column { source, .. } => source.root(),
            err => err,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = TileError> = std::result::Result<T, E>;
