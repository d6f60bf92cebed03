//! Delta, delta-RLE, Morton and componentwise delta coding.

use super::rle::decode_rle;
use super::Word;
use crate::error::DecodeError;

/// Clamp and scale parameters for componentwise-delta vertex decoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryScaling {
    pub scale: f64,
    pub min: i32,
    pub max: i32,
}

/// Decode zigzag deltas in place into absolute values.
pub fn decode_zigzag_delta<W: Word>(values: &mut [W]) {
    let mut previous = W::default();
    for value in values.iter_mut() {
        previous = previous.add(value.zigzag_decode());
        *value = previous;
    }
}

/// Encode absolute values as zigzag deltas.
pub fn encode_zigzag_delta<W: Word>(values: &[W]) -> Vec<W> {
    let mut previous = W::default();
    values
        .iter()
        .map(|&value| {
            let delta = value.sub(previous);
            previous = value;
            delta.zigzag_encode()
        })
        .collect()
}

/// Expand zigzag-delta runs and accumulate them into absolute values.
///
/// The running value carries over from one run to the next.
pub fn decode_delta_rle<W: Word>(
    data: &[W],
    runs: usize,
    num_values: usize,
) -> Result<Vec<W>, DecodeError> {
    let mut values = decode_rle(data, runs, num_values)?;
    decode_zigzag_delta(&mut values);
    Ok(values)
}

/// Inverse of plain (non-zigzag) delta coding, used for Morton codes which
/// are sorted and so never produce negative deltas.
pub fn inverse_delta<W: Word>(values: &mut [W]) {
    let mut previous = W::default();
    for value in values.iter_mut() {
        previous = previous.add(*value);
        *value = previous;
    }
}

/// Plain (non-zigzag) delta coding.
pub fn encode_delta<W: Word>(values: &[W]) -> Vec<W> {
    let mut previous = W::default();
    values
        .iter()
        .map(|&value| {
            let delta = value.sub(previous);
            previous = value;
            delta
        })
        .collect()
}

/// Decode interleaved `(x, y)` zigzag deltas in place, each component with its
/// own running sum.
pub fn decode_componentwise_delta<W: Word>(values: &mut [W]) -> Result<(), DecodeError> {
    check_pairs(values.len())?;
    let mut previous = [W::default(); 2];
    for (index, value) in values.iter_mut().enumerate() {
        let component = &mut previous[index % 2];
        *component = component.add(value.zigzag_decode());
        *value = *component;
    }
    Ok(())
}

/// Componentwise delta decode followed by scaling and clamping.
///
/// The running sums are kept unscaled; each output coordinate is
/// `clamp(floor(sum * scale + 0.5), min, max)`, so half-way values round
/// towards positive infinity.
pub fn decode_componentwise_delta_scaled(
    values: &mut [u32],
    scaling: GeometryScaling,
) -> Result<(), DecodeError> {
    check_pairs(values.len())?;
    let mut previous = [0i32; 2];
    for (index, value) in values.iter_mut().enumerate() {
        let component = &mut previous[index % 2];
        *component = component.wrapping_add(value.zigzag_decode() as i32);
        let scaled = (*component as f64 * scaling.scale + 0.5).floor();
        let clamped = scaled.clamp(scaling.min as f64, scaling.max as f64) as i32;
        *value = clamped as u32;
    }
    Ok(())
}

/// Encode interleaved `(x, y)` values as componentwise zigzag deltas.
pub fn encode_componentwise_delta<W: Word>(values: &[W]) -> Result<Vec<W>, DecodeError> {
    check_pairs(values.len())?;
    let mut previous = [W::default(); 2];
    Ok(values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let component = &mut previous[index % 2];
            let delta = value.sub(*component);
            *component = value;
            delta.zigzag_encode()
        })
        .collect())
}

/// Turn a list of lengths into `lengths.len() + 1` offsets starting at 0.
pub fn lengths_to_offsets(lengths: &[u32]) -> Result<Vec<u32>, DecodeError> {
    let mut offsets = Vec::with_capacity(lengths.len() + 1);
    let mut total: u32 = 0;
    offsets.push(total);
    for &length in lengths {
        total = total.checked_add(length).ok_or_else(|| {
            DecodeError::InvalidData("length stream offsets overflow 32 bits".to_string())
        })?;
        offsets.push(total);
    }
    Ok(offsets)
}

fn check_pairs(len: usize) -> Result<(), DecodeError> {
    if len % 2 != 0 {
        return Err(DecodeError::InvalidData(format!(
            "componentwise delta stream has odd length {}",
            len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u32> {
        values.iter().map(|&v| v as u32).collect()
    }

    #[test]
    fn test_zigzag_delta_roundtrip() {
        let values = words(&[5, 3, 3, 10, -4]);
        let mut encoded = encode_zigzag_delta(&values);
        assert_eq!(encoded, vec![10, 3, 0, 14, 27]);
        decode_zigzag_delta(&mut encoded);
        assert_eq!(encoded, values);
    }

    #[test]
    fn test_delta_rle_carries_previous_value() {
        // deltas [1, 1, 1, 5, 5] -> runs (3 x 1), (2 x 5)
        let data = [3u32, 2, 2, 10];
        assert_eq!(decode_delta_rle(&data, 2, 5).unwrap(), vec![1, 2, 3, 8, 13]);
    }

    #[test]
    fn test_inverse_delta() {
        let mut values = encode_delta(&[2u32, 7, 7, 100]);
        assert_eq!(values, vec![2, 5, 0, 93]);
        inverse_delta(&mut values);
        assert_eq!(values, vec![2, 7, 7, 100]);
    }

    #[test]
    fn test_componentwise_delta() {
        let vertices = words(&[10, 20, 12, 18, 5, 30]);
        let mut encoded = encode_componentwise_delta(&vertices).unwrap();
        assert_eq!(encoded, vec![20, 40, 4, 3, 13, 24]);
        decode_componentwise_delta(&mut encoded).unwrap();
        assert_eq!(encoded, vertices);

        assert!(decode_componentwise_delta(&mut [1u32, 2, 3][..]).is_err());
    }

    #[test]
    fn test_componentwise_delta_scaled_clamps() {
        let vertices = words(&[10, 20, 12, 18, 5, 30]);
        let mut encoded = encode_componentwise_delta(&vertices).unwrap();
        let scaling = GeometryScaling {
            scale: 2.0,
            min: 0,
            max: 40,
        };
        decode_componentwise_delta_scaled(&mut encoded, scaling).unwrap();
        let decoded: Vec<i32> = encoded.iter().map(|&w| w as i32).collect();
        assert_eq!(decoded, vec![20, 40, 24, 36, 10, 40]);
    }

    #[test]
    fn test_componentwise_delta_scaled_rounds_half_up() {
        // running sums (-5, -1) scaled by 0.5 land on -2.5 and -0.5
        let mut encoded = vec![9u32, 1];
        let scaling = GeometryScaling {
            scale: 0.5,
            min: -100,
            max: 100,
        };
        decode_componentwise_delta_scaled(&mut encoded, scaling).unwrap();
        let decoded: Vec<i32> = encoded.iter().map(|&w| w as i32).collect();
        assert_eq!(decoded, vec![-2, 0]);
    }

    #[test]
    fn test_lengths_to_offsets() {
        assert_eq!(lengths_to_offsets(&[]).unwrap(), vec![0]);
        assert_eq!(lengths_to_offsets(&[3, 0, 2]).unwrap(), vec![0, 3, 3, 5]);
        assert!(lengths_to_offsets(&[u32::MAX, 1]).is_err());
    }
}
