//! Property column encoding, the inverse of `reader::property`.

use tracing::debug;

use super::integer::{
    encode_int_stream, encode_long_stream, encode_nullable_int_stream, encode_nullable_long_stream,
};
use super::string::{encode_dictionary_strings, encode_plain_strings, encode_shared_dictionary};
use super::{encode_boolean_stream, encode_present_stream, EncodedStream};
use crate::codec::float::{encode_doubles_le, encode_floats_le};
use crate::codec::varint::encode_varint_into;
use crate::error::EncodeError;
use crate::metadata::{DictionaryType, StreamType};
use crate::options::EncoderOptions;
use crate::schema::{Column, Field, ScalarType};
use crate::vector::BitVector;

const DATA: StreamType = StreamType::Data(DictionaryType::None);

/// Values of a scalar column, `None` marking an absent value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValues {
    Boolean(Vec<Option<bool>>),
    Int(Vec<Option<i32>>),
    UInt(Vec<Option<u32>>),
    Long(Vec<Option<i64>>),
    ULong(Vec<Option<u64>>),
    Float(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl PropertyValues {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            PropertyValues::Boolean(_) => ScalarType::Boolean,
            PropertyValues::Int(_) => ScalarType::Int32,
            PropertyValues::UInt(_) => ScalarType::UInt32,
            PropertyValues::Long(_) => ScalarType::Int64,
            PropertyValues::ULong(_) => ScalarType::UInt64,
            PropertyValues::Float(_) => ScalarType::Float,
            PropertyValues::Double(_) => ScalarType::Double,
            PropertyValues::String(_) => ScalarType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PropertyValues::Boolean(v) => v.len(),
            PropertyValues::Int(v) => v.len(),
            PropertyValues::UInt(v) => v.len(),
            PropertyValues::Long(v) => v.len(),
            PropertyValues::ULong(v) => v.len(),
            PropertyValues::Float(v) => v.len(),
            PropertyValues::Double(v) => v.len(),
            PropertyValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Child of a shared dictionary struct column
#[derive(Debug, Clone, PartialEq)]
pub struct SharedChild {
    pub name: String,
    pub values: Vec<Option<String>>,
}

impl SharedChild {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A property column to encode
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyColumn {
    /// Scalar column; strings are stored plain
    Primitive {
        name: String,
        nullable: bool,
        values: PropertyValues,
    },
    /// String column stored through a dictionary (FSST when configured)
    Dictionary {
        name: String,
        nullable: bool,
        values: Vec<Option<String>>,
    },
    /// Struct column whose string children share one dictionary
    SharedDictionary {
        name: String,
        children: Vec<SharedChild>,
    },
}

impl PropertyColumn {
    pub fn name(&self) -> &str {
        match self {
            PropertyColumn::Primitive { name, .. }
            | PropertyColumn::Dictionary { name, .. }
            | PropertyColumn::SharedDictionary { name, .. } => name,
        }
    }

    /// Column description the decoder needs to read this column back.
    pub fn column(&self) -> Column {
        match self {
            PropertyColumn::Primitive {
                name,
                nullable,
                values,
            } => Column::scalar(name.clone(), values.scalar_type(), *nullable),
            PropertyColumn::Dictionary { name, nullable, .. } => {
                Column::scalar(name.clone(), ScalarType::String, *nullable)
            }
            PropertyColumn::SharedDictionary { name, children } => Column::shared_dictionary(
                name.clone(),
                children
                    .iter()
                    .map(|child| Field::string(child.name.clone()))
                    .collect(),
            ),
        }
    }
}

/// Present bitset for a nullable column; `None` for a non-nullable one, which
/// must not hold absent values.
fn present_of<T>(values: &[Option<T>], nullable: bool) -> Result<Option<BitVector>, EncodeError> {
    if nullable {
        let bits: Vec<bool> = values.iter().map(Option::is_some).collect();
        return Ok(Some(BitVector::from_bools(&bits)));
    }
    if values.iter().any(Option::is_none) {
        return Err(EncodeError::InvalidInput(
            "null value in a non-nullable column".to_string(),
        ));
    }
    Ok(None)
}

fn words<T: Copy + Default, W>(values: &[Option<T>], cast: impl Fn(T) -> W) -> Vec<W> {
    values
        .iter()
        .map(|value| cast(value.unwrap_or_default()))
        .collect()
}

fn encode_u32_column(
    words: &[u32],
    present: Option<&BitVector>,
    signed: bool,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    match present {
        Some(present) => encode_nullable_int_stream(words, present, signed, DATA, options),
        None => encode_int_stream(words, signed, DATA, options),
    }
}

fn encode_u64_column(
    words: &[u64],
    present: Option<&BitVector>,
    signed: bool,
    options: &EncoderOptions,
) -> Result<EncodedStream, EncodeError> {
    match present {
        Some(present) => encode_nullable_long_stream(words, present, signed, DATA, options),
        None => encode_long_stream(words, signed, DATA, options),
    }
}

fn encode_scalar(
    values: &PropertyValues,
    nullable: bool,
    options: &EncoderOptions,
) -> Result<Vec<EncodedStream>, EncodeError> {
    let (present, data) = match values {
        PropertyValues::String(strings) => return encode_plain_strings(strings, nullable, options),
        PropertyValues::Boolean(v) => {
            let present = present_of(v, nullable)?;
            let bits: Vec<bool> = v.iter().flatten().copied().collect();
            (present, encode_boolean_stream(&BitVector::from_bools(&bits)))
        }
        PropertyValues::Int(v) => {
            let present = present_of(v, nullable)?;
            let words = words(v, |x| x as u32);
            let data = encode_u32_column(&words, present.as_ref(), true, options)?;
            (present, data)
        }
        PropertyValues::UInt(v) => {
            let present = present_of(v, nullable)?;
            let data = encode_u32_column(&words(v, |x| x), present.as_ref(), false, options)?;
            (present, data)
        }
        PropertyValues::Long(v) => {
            let present = present_of(v, nullable)?;
            let words = words(v, |x| x as u64);
            let data = encode_u64_column(&words, present.as_ref(), true, options)?;
            (present, data)
        }
        PropertyValues::ULong(v) => {
            let present = present_of(v, nullable)?;
            let data = encode_u64_column(&words(v, |x| x), present.as_ref(), false, options)?;
            (present, data)
        }
        PropertyValues::Float(v) => {
            let present = present_of(v, nullable)?;
            let floats: Vec<f32> = v.iter().flatten().copied().collect();
            let data = EncodedStream::raw(DATA, floats.len(), encode_floats_le(&floats));
            (present, data)
        }
        PropertyValues::Double(v) => {
            let present = present_of(v, nullable)?;
            let doubles: Vec<f64> = v.iter().flatten().copied().collect();
            let data = EncodedStream::raw(DATA, doubles.len(), encode_doubles_le(&doubles));
            (present, data)
        }
    };

    let mut streams = Vec::with_capacity(2);
    if let Some(present) = &present {
        streams.push(encode_present_stream(present));
    }
    streams.push(data);
    Ok(streams)
}

fn write_streams(streams: &[EncodedStream], out: &mut Vec<u8>) {
    encode_varint_into(streams.len() as u64, out);
    for stream in streams {
        stream.write_to(out);
    }
}

/// Encode a property column: its stream count followed by its streams.
///
/// [`crate::reader::read_property_column`] reads the result back given
/// [`PropertyColumn::column`].
pub fn encode_property_column(
    column: &PropertyColumn,
    options: &EncoderOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    match column {
        PropertyColumn::Primitive {
            name,
            nullable,
            values,
        } => {
            debug!(column = %name, scalar_type = %values.scalar_type(), "encoding property column");
            write_streams(&encode_scalar(values, *nullable, options)?, &mut out);
        }
        PropertyColumn::Dictionary {
            name,
            nullable,
            values,
        } => {
            debug!(column = %name, "encoding dictionary column");
            write_streams(
                &encode_dictionary_strings(values, *nullable, options)?,
                &mut out,
            );
        }
        PropertyColumn::SharedDictionary { name, children } => {
            debug!(column = %name, children = children.len(), "encoding shared dictionary");
            let values: Vec<&[Option<String>]> =
                children.iter().map(|child| child.values.as_slice()).collect();
            encode_varint_into(1, &mut out);
            out.extend(encode_shared_dictionary(&values, options)?);
        }
    }
    Ok(out)
}
