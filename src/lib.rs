//! Columnar vector tile stream codec
//!
//! This library decodes and encodes the property columns of a columnar
//! vector tile: self-describing stream headers, integer streams with chained
//! logical techniques (zigzag, delta, RLE, Morton, componentwise delta) over
//! a physical technique (varint or a pluggable FastPFOR codec), plain,
//! dictionary and FSST string columns, present-bit nullability, and
//! shared-dictionary struct columns.
//!
//! Decoded columns are returned as vectors that keep the cheapest
//! representation the stream allows: a single repeated value, an arithmetic
//! sequence, or fully materialised values.
//!
//! ```
//! use tilecolumn::{
//!     encode_property_column, read_property_column, DecodedColumn, DecoderOptions,
//!     EncoderOptions, Offset, PropertyColumn, PropertyValue, PropertyValues,
//! };
//!
//! let column = PropertyColumn::Primitive {
//!     name: "height".to_string(),
//!     nullable: true,
//!     values: PropertyValues::Int(vec![Some(12), None, Some(30)]),
//! };
//! let bytes = encode_property_column(&column, &EncoderOptions::default()).unwrap();
//!
//! let mut offset = Offset::default();
//! let decoded =
//!     read_property_column(&bytes, &mut offset, &column.column(), 3, &DecoderOptions::default())
//!         .unwrap();
//! let Some(DecodedColumn::Single(vector)) = decoded else {
//!     panic!("expected a scalar column");
//! };
//! assert_eq!(vector.get(1), None);
//! assert_eq!(vector.get(2), Some(PropertyValue::Int(30)));
//! ```

pub mod codec;
pub mod error;
pub mod integer;
pub mod metadata;
pub mod offset;
pub mod options;
pub mod reader;
pub mod schema;
pub mod string;
pub mod vector;
pub mod writer;

// Re-export main types
pub use codec::{IntegerCodec, PhysicalTechnique};
pub use error::{CodecError, DecodeError, EncodeError, Result, SchemaError, TileError};
pub use metadata::{
    DictionaryType, LengthType, LogicalEncoding, LogicalTechnique, OffsetType, StreamHeader,
    StreamMetadata, StreamType,
};
pub use offset::Offset;
pub use options::{DecoderOptions, EncoderOptions, IntegerEncodingChoice};
pub use reader::{
    decode_present_stream, decode_property_column, decode_shared_dictionary, decode_string_column,
    read_property_column, skip_column, vector_type, DecodedColumn,
};
pub use schema::{Column, ColumnType, ComplexColumn, Field, FieldType, ScalarType};
pub use vector::{
    BitVector, BooleanVector, ColumnVector, ConstVector, Dictionary, FlatVector, FsstDictionary,
    NumericVector, PropertyValue, SequenceVector, StringDictionaryVector, StringFlatVector,
    StringFsstDictionaryVector, StringVector, Vector, VectorType,
};
pub use writer::{
    encode_property_column, EncodedStream, PropertyColumn, PropertyValues, SharedChild,
};
