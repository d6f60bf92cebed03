//! Run-length encoding.
//!
//! The physical layout is two equal halves: the first `runs` words are run
//! lengths, the next `runs` words are the run values. Whether values are
//! zigzag-signed is a decode-time choice.

use super::Word;
use crate::error::DecodeError;

/// Validate an RLE buffer and return the total expanded length.
fn expanded_len<W: Word>(data: &[W], runs: usize) -> Result<usize, DecodeError> {
    if runs.checked_mul(2) != Some(data.len()) {
        return Err(DecodeError::InvalidData(format!(
            "RLE stream with {} runs has {} words, expected {}",
            runs,
            data.len(),
            runs.saturating_mul(2)
        )));
    }
    data[..runs].iter().try_fold(0usize, |total, length| {
        length
            .run_length()
            .and_then(|length| total.checked_add(length))
            .ok_or_else(|| DecodeError::InvalidData(format!("invalid run length {:?}", length)))
    })
}

/// Expand runs into a dense buffer of exactly `num_values` words.
///
/// # Errors
/// `DecodeError::InvalidData` if the buffer is not `2 * runs` long or the run
/// lengths do not add up to `num_values`.
pub fn decode_rle<W: Word>(
    data: &[W],
    runs: usize,
    num_values: usize,
) -> Result<Vec<W>, DecodeError> {
    let total = expanded_len(data, runs)?;
    if total != num_values {
        return Err(DecodeError::InvalidData(format!(
            "RLE runs expand to {} values, header declares {}",
            total, num_values
        )));
    }
    Ok(expand(data, runs, total))
}

/// Expand runs and zigzag-decode the values.
pub fn decode_zigzag_rle<W: Word>(
    data: &[W],
    runs: usize,
    num_values: usize,
) -> Result<Vec<W>, DecodeError> {
    let mut values = decode_rle(data, runs, num_values)?;
    super::zigzag::decode_zigzag_in_place(&mut values);
    Ok(values)
}

/// Expand runs without checking the total against a header count.
pub(crate) fn decode_rle_unchecked_total<W: Word>(
    data: &[W],
    runs: usize,
) -> Result<Vec<W>, DecodeError> {
    let total = expanded_len(data, runs)?;
    Ok(expand(data, runs, total))
}

fn expand<W: Word>(data: &[W], runs: usize, total: usize) -> Vec<W> {
    let mut values = Vec::with_capacity(total);
    for (length, &value) in data[..runs].iter().zip(&data[runs..]) {
        // lengths were validated by `expanded_len`
        let length = length.run_length().unwrap_or(0);
        values.extend(std::iter::repeat(value).take(length));
    }
    values
}

/// Value of a single-run (const) RLE stream.
pub fn decode_const_rle<W: Word>(data: &[W]) -> Result<W, DecodeError> {
    match data {
        [_, value] => Ok(*value),
        _ => Err(DecodeError::InvalidData(format!(
            "const RLE stream must hold 2 words, got {}",
            data.len()
        ))),
    }
}

/// Zigzag value of a single-run (const) RLE stream.
pub fn decode_zigzag_const_rle<W: Word>(data: &[W]) -> Result<W, DecodeError> {
    decode_const_rle(data).map(Word::zigzag_decode)
}

/// Base and step of a delta-RLE stream describing an arithmetic sequence.
///
/// A single run stores the step once and it doubles as the base (the first
/// delta is the first value). Two runs store the base delta and the step
/// separately.
pub fn decode_zigzag_sequence_rle<W: Word>(data: &[W]) -> Result<(W, W), DecodeError> {
    match data {
        [_, value] => {
            let value = value.zigzag_decode();
            Ok((value, value))
        }
        [_, _, base, delta] => Ok((base.zigzag_decode(), delta.zigzag_decode())),
        _ => Err(DecodeError::InvalidData(format!(
            "sequence RLE stream must hold 2 or 4 words, got {}",
            data.len()
        ))),
    }
}

/// Run-length encode `values`, returning the buffer and its run count.
pub fn encode_rle<W: Word>(values: &[W]) -> (Vec<W>, usize) {
    let mut lengths = Vec::new();
    let mut run_values = Vec::new();
    let mut iter = values.iter().copied();
    if let Some(first) = iter.next() {
        let mut current = first;
        let mut length = 1usize;
        for value in iter {
            if value == current {
                length += 1;
            } else {
                lengths.push(W::from_run_length(length));
                run_values.push(current);
                current = value;
                length = 1;
            }
        }
        lengths.push(W::from_run_length(length));
        run_values.push(current);
    }
    let runs = lengths.len();
    lengths.extend(run_values);
    (lengths, runs)
}

/// Run-length encode zigzag-encoded `values`.
pub fn encode_zigzag_rle<W: Word>(values: &[W]) -> (Vec<W>, usize) {
    encode_rle(&super::zigzag::encode_zigzag(values))
}
