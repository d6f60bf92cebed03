//! String column encoding: plain, dictionary, FSST dictionary and shared
//! dictionary layouts.

use std::collections::HashMap;

use tracing::debug;

use super::integer::{encode_int_stream, encode_length_stream, encode_nullable_int_stream};
use super::{encode_present_stream, EncodedStream};
use crate::codec::varint::encode_varint_into;
use crate::error::EncodeError;
use crate::metadata::{DictionaryType, LengthType, OffsetType, StreamType};
use crate::options::EncoderOptions;
use crate::string::fsst::SymbolTable;
use crate::vector::BitVector;

/// Present bitset (for nullable columns) and the present strings.
fn split_present<S: AsRef<str>>(
    values: &[Option<S>],
    nullable: bool,
) -> Result<(Option<BitVector>, Vec<&str>), EncodeError> {
    if !nullable {
        let strings = values
            .iter()
            .map(|value| value.as_ref().map(AsRef::as_ref))
            .collect::<Option<Vec<&str>>>()
            .ok_or_else(|| {
                EncodeError::InvalidInput("null value in a non-nullable column".to_string())
            })?;
        return Ok((None, strings));
    }
    let present: Vec<bool> = values.iter().map(Option::is_some).collect();
    let strings = values.iter().flatten().map(AsRef::as_ref).collect();
    Ok((Some(BitVector::from_bools(&present)), strings))
}

fn lengths<S: AsRef<str>>(strings: &[S]) -> Vec<u32> {
    strings.iter().map(|s| s.as_ref().len() as u32).collect()
}

fn concat<S: AsRef<str>>(strings: &[S]) -> Vec<u8> {
    strings
        .iter()
        .flat_map(|s| s.as_ref().bytes())
        .collect()
}

/// Distinct strings in first-seen order and the index of every input.
fn deduplicate<'a>(strings: &[&'a str]) -> (Vec<&'a str>, Vec<u32>) {
    let mut entries = Vec::new();
    let mut positions: HashMap<&str, u32> = HashMap::new();
    let indices = strings
        .iter()
        .map(|&s| {
            *positions.entry(s).or_insert_with(|| {
                entries.push(s);
                (entries.len() - 1) as u32
            })
        })
        .collect();
    (entries, indices)
}

/// LENGTH and DATA streams of a dictionary, FSST compressed when the
/// options carry symbols.
fn encode_dictionary(
    entries: &[&str],
    dictionary_type: DictionaryType,
    options: &EncoderOptions,
) -> Result<Vec<EncodedStream>, EncodeError> {
    let mut streams = Vec::with_capacity(4);
    let data = concat(entries);
    let data = match &options.fsst_symbols {
        Some(symbols) => {
            let table = SymbolTable::new(symbols)?;
            streams.push(encode_length_stream(
                &table.lengths(),
                LengthType::Symbol,
                options,
            )?);
            let table_bytes = table.to_bytes();
            streams.push(EncodedStream::raw(
                StreamType::Data(DictionaryType::Fsst),
                table_bytes.len(),
                table_bytes,
            ));
            let compressed = table.encode(&data);
            debug!(
                symbols = table.len(),
                raw = data.len(),
                compressed = compressed.len(),
                "FSST compressed dictionary"
            );
            compressed
        }
        None => data,
    };
    streams.push(encode_length_stream(
        &lengths(entries),
        LengthType::Dictionary,
        options,
    )?);
    streams.push(EncodedStream::raw(
        StreamType::Data(dictionary_type),
        data.len(),
        data,
    ));
    Ok(streams)
}

/// Encode a string column as a PRESENT stream (when `nullable`), a
/// VAR_BINARY LENGTH stream and the concatenated UTF-8 bytes.
pub fn encode_plain_strings<S: AsRef<str>>(
    values: &[Option<S>],
    nullable: bool,
    options: &EncoderOptions,
) -> Result<Vec<EncodedStream>, EncodeError> {
    let (present, strings) = split_present(values, nullable)?;
    let mut streams = Vec::with_capacity(3);
    if let Some(present) = &present {
        streams.push(encode_present_stream(present));
    }
    streams.push(encode_length_stream(
        &lengths(&strings),
        LengthType::VarBinary,
        options,
    )?);
    let data = concat(&strings);
    streams.push(EncodedStream::raw(
        StreamType::Data(DictionaryType::None),
        data.len(),
        data,
    ));
    Ok(streams)
}

/// Encode a string column as indices into a dictionary of its distinct
/// values, FSST compressing the dictionary when the options carry symbols.
pub fn encode_dictionary_strings<S: AsRef<str>>(
    values: &[Option<S>],
    nullable: bool,
    options: &EncoderOptions,
) -> Result<Vec<EncodedStream>, EncodeError> {
    let (present, strings) = split_present(values, nullable)?;
    let (entries, indices) = deduplicate(&strings);
    debug!(
        values = strings.len(),
        entries = entries.len(),
        "built string dictionary"
    );

    let mut streams = Vec::with_capacity(6);
    if let Some(present) = &present {
        streams.push(encode_present_stream(present));
    }
    streams.push(encode_int_stream(
        &indices,
        false,
        StreamType::Offset(OffsetType::String),
        options,
    )?);
    streams.extend(encode_dictionary(&entries, DictionaryType::Single, options)?);
    Ok(streams)
}

/// Encode the children of a struct column over one shared dictionary.
///
/// Writes the dictionary streams, then per child a stream count followed by
/// its PRESENT and OFFSET streams. A child without any present value is
/// written as a stream count of 0.
///
/// # Errors
/// `EncodeError::InvalidInput` if the children differ in length.
pub fn encode_shared_dictionary<S: AsRef<str>>(
    children: &[&[Option<S>]],
    options: &EncoderOptions,
) -> Result<Vec<u8>, EncodeError> {
    let num_features = children.first().map_or(0, |child| child.len());
    if children.iter().any(|child| child.len() != num_features) {
        return Err(EncodeError::InvalidInput(
            "struct children must have one value per feature".to_string(),
        ));
    }

    let mut positions: HashMap<&str, u32> = HashMap::new();
    let mut entries: Vec<&str> = Vec::new();
    let mut child_indices = Vec::with_capacity(children.len());
    for child in children {
        let indices: Vec<u32> = child
            .iter()
            .map(|value| match value {
                Some(s) => *positions.entry(s.as_ref()).or_insert_with(|| {
                    entries.push(s.as_ref());
                    (entries.len() - 1) as u32
                }),
                None => 0,
            })
            .collect();
        child_indices.push(indices);
    }

    let mut out = Vec::new();
    for stream in encode_dictionary(&entries, DictionaryType::Shared, options)? {
        stream.write_to(&mut out);
    }

    for (child, indices) in children.iter().zip(&child_indices) {
        let present: Vec<bool> = child.iter().map(Option::is_some).collect();
        if !present.contains(&true) {
            encode_varint_into(0, &mut out);
            continue;
        }
        let present = BitVector::from_bools(&present);
        encode_varint_into(2, &mut out);
        encode_present_stream(&present).write_to(&mut out);
        encode_nullable_int_stream(
            indices,
            &present,
            false,
            StreamType::Offset(OffsetType::String),
            options,
        )?
        .write_to(&mut out);
    }
    Ok(out)
}
