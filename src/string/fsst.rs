//! FSST symbol-table decoding, plus a greedy encoder over a fixed table.
//!
//! A compressed body is a sequence of codes. Code `0xFF` escapes the next
//! byte, which is copied literally; any other code `c` expands to symbol `c`
//! of the table.

use crate::error::{DecodeError, EncodeError};

/// Escape code
pub const ESCAPE: u8 = 0xFF;

/// Largest number of symbols addressable by a one-byte code
pub const MAX_SYMBOLS: usize = 255;

/// Expand an FSST-compressed body.
///
/// `symbol_offsets` holds `n + 1` offsets into `symbols`, one span per
/// symbol, as produced from the SYMBOL length stream.
pub fn decode_fsst(
    symbols: &[u8],
    symbol_offsets: &[u32],
    compressed: &[u8],
) -> Result<Vec<u8>, DecodeError> {
    let num_symbols = symbol_offsets.len().saturating_sub(1);
    let mut out = Vec::with_capacity(compressed.len() * 2);
    let mut index = 0;

    while index < compressed.len() {
        let code = compressed[index];
        if code == ESCAPE {
            let literal = compressed.get(index + 1).ok_or_else(|| {
                DecodeError::InvalidData("FSST escape at end of compressed data".to_string())
            })?;
            out.push(*literal);
            index += 2;
            continue;
        }

        let code = code as usize;
        if code >= num_symbols {
            return Err(DecodeError::InvalidData(format!(
                "FSST code {} outside of a {} symbol table",
                code, num_symbols
            )));
        }
        let start = symbol_offsets[code] as usize;
        let end = symbol_offsets[code + 1] as usize;
        let symbol = symbols.get(start..end).ok_or_else(|| {
            DecodeError::InvalidData(format!(
                "FSST symbol {} spans {}..{} outside of the symbol table",
                code, start, end
            ))
        })?;
        out.extend_from_slice(symbol);
        index += 1;
    }
    Ok(out)
}

/// Symbol table used for encoding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolTable {
    symbols: Vec<Vec<u8>>,
}

impl SymbolTable {
    /// Build a table from non-empty symbols.
    pub fn new<S: AsRef<[u8]>>(symbols: &[S]) -> Result<Self, EncodeError> {
        if symbols.len() > MAX_SYMBOLS {
            return Err(EncodeError::InvalidInput(format!(
                "FSST symbol table holds at most {} symbols, got {}",
                MAX_SYMBOLS,
                symbols.len()
            )));
        }
        let symbols: Vec<Vec<u8>> = symbols.iter().map(|s| s.as_ref().to_vec()).collect();
        if symbols.iter().any(|s| s.is_empty()) {
            return Err(EncodeError::InvalidInput("empty FSST symbol".to_string()));
        }
        Ok(Self { symbols })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol lengths, the content of the SYMBOL length stream.
    pub fn lengths(&self) -> Vec<u32> {
        self.symbols.iter().map(|s| s.len() as u32).collect()
    }

    /// Concatenated symbols, the content of the symbol table DATA stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.symbols.concat()
    }

    /// Compress `input`, choosing the longest matching symbol at each
    /// position and escaping bytes no symbol covers.
    pub fn encode(&self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());
        let mut index = 0;
        while index < input.len() {
            let rest = &input[index..];
            let best = self
                .symbols
                .iter()
                .enumerate()
                .filter(|(_, symbol)| rest.starts_with(symbol))
                .max_by_key(|(code, symbol)| (symbol.len(), std::cmp::Reverse(*code)));
            match best {
                Some((code, symbol)) => {
                    out.push(code as u8);
                    index += symbol.len();
                }
                None => {
                    out.push(ESCAPE);
                    out.push(input[index]);
                    index += 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integer::delta::lengths_to_offsets;

    #[test]
    fn test_decode_with_escape() {
        let symbols = b"ab";
        let offsets = [0, 1, 2];
        assert_eq!(
            decode_fsst(symbols, &offsets, &[0, 1, ESCAPE, b'z', 0]).unwrap(),
            b"abza".to_vec()
        );
    }

    #[test]
    fn test_decode_rejects_bad_codes() {
        let offsets = [0, 1];
        assert!(decode_fsst(b"a", &offsets, &[3]).is_err());
        assert!(decode_fsst(b"a", &offsets, &[ESCAPE]).is_err());
        assert!(decode_fsst(b"", &offsets, &[0]).is_err());
    }

    #[test]
    fn test_greedy_encode_roundtrip() {
        let table = SymbolTable::new(&["Str", "Straße", "e"]).unwrap();
        let input = "Straße Street".as_bytes();
        let encoded = table.encode(input);
        // "Straße" is the longest match at position 0
        assert_eq!(encoded[0], 1);

        let offsets = lengths_to_offsets(&table.lengths()).unwrap();
        assert_eq!(decode_fsst(&table.to_bytes(), &offsets, &encoded).unwrap(), input);
    }

    #[test]
    fn test_symbol_table_limits() {
        let too_many: Vec<String> = (0..256).map(|i| format!("s{}", i)).collect();
        assert!(SymbolTable::new(&too_many[..]).is_err());
        assert!(SymbolTable::new(&[""]).is_err());
        assert!(SymbolTable::new::<&str>(&[]).unwrap().is_empty());
    }
}
