//! Decoder and encoder options.
//!
//! Both structs are plain data with public fields, a `Default`, and
//! `with_*` builders for chained construction.

use std::collections::HashSet;
use std::sync::Arc;

use crate::codec::{IntegerCodec, PhysicalTechnique};
use crate::metadata::LogicalTechnique;

/// Options controlling how property columns are decoded.
///
/// # Example
/// ```
/// use tilecolumn::DecoderOptions;
///
/// let opts = DecoderOptions::new()
///     .with_property_columns(["name", "class"])
///     .with_max_stream_values(1 << 20);
/// assert!(opts.wants_column("name"));
/// assert!(!opts.wants_column("height"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct DecoderOptions {
    /// Columns to decode (None = all).
    ///
    /// Excluded columns are skipped without decoding their streams. For
    /// shared dictionary structs the filter applies to each child's full
    /// `parent:child` name.
    pub property_columns: Option<HashSet<String>>,

    /// Codec used for FastPFOR streams (None = FastPFOR streams are rejected).
    pub fast_pfor: Option<Arc<dyn IntegerCodec>>,

    /// Largest value count a single stream header may declare (None = no limit).
    ///
    /// Guards allocations made from header counts on untrusted input.
    pub max_stream_values: Option<usize>,
}

impl DecoderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_fast_pfor(mut self, codec: Arc<dyn IntegerCodec>) -> Self {
        self.fast_pfor = Some(codec);
        self
    }

    pub fn with_max_stream_values(mut self, limit: usize) -> Self {
        self.max_stream_values = Some(limit);
        self
    }

    /// Whether a column of this name should be decoded.
    pub fn wants_column(&self, name: &str) -> bool {
        self.property_columns
            .as_ref()
            .map_or(true, |columns| columns.contains(name))
    }

    pub(crate) fn fast_pfor_codec(&self) -> Option<&dyn IntegerCodec> {
        self.fast_pfor.as_deref()
    }
}

/// Logical encoding used for integer streams on the write path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegerEncodingChoice {
    /// Encode with every applicable technique and keep the smallest.
    #[default]
    Auto,
    /// Always use one technique (NONE, DELTA or RLE; DELTA+RLE via `DeltaRle`)
    Fixed(LogicalTechnique),
    /// Delta followed by RLE
    DeltaRle,
}

/// Options controlling how columns are encoded.
#[derive(Clone, Debug)]
pub struct EncoderOptions {
    /// Physical technique for integer streams (default: varint).
    pub physical_technique: PhysicalTechnique,

    /// Logical technique selection for integer streams.
    pub integer_encoding: IntegerEncodingChoice,

    /// FSST symbols used for string dictionaries (None = no FSST).
    pub fsst_symbols: Option<Vec<String>>,

    /// Codec used when `physical_technique` is FastPFOR.
    pub fast_pfor: Option<Arc<dyn IntegerCodec>>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            physical_technique: PhysicalTechnique::Varint,
            integer_encoding: IntegerEncodingChoice::Auto,
            fsst_symbols: None,
            fast_pfor: None,
        }
    }
}

impl EncoderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_physical_technique(mut self, technique: PhysicalTechnique) -> Self {
        self.physical_technique = technique;
        self
    }

    pub fn with_integer_encoding(mut self, choice: IntegerEncodingChoice) -> Self {
        self.integer_encoding = choice;
        self
    }

    pub fn with_fsst_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fsst_symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_fast_pfor(mut self, codec: Arc<dyn IntegerCodec>) -> Self {
        self.fast_pfor = Some(codec);
        self
    }

    pub(crate) fn fast_pfor_codec(&self) -> Option<&dyn IntegerCodec> {
        self.fast_pfor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_defaults() {
        let opts = DecoderOptions::default();
        assert!(opts.property_columns.is_none());
        assert!(opts.fast_pfor.is_none());
        assert!(opts.max_stream_values.is_none());
        assert!(opts.wants_column("anything"));
    }

    #[test]
    fn test_decoder_builders() {
        let opts = DecoderOptions::new()
            .with_property_columns(vec!["name:en".to_string()])
            .with_max_stream_values(10);
        assert!(opts.wants_column("name:en"));
        assert!(!opts.wants_column("name"));
        assert_eq!(opts.max_stream_values, Some(10));
    }

    #[test]
    fn test_encoder_defaults_and_builders() {
        let opts = EncoderOptions::default();
        assert_eq!(opts.physical_technique, PhysicalTechnique::Varint);
        assert_eq!(opts.integer_encoding, IntegerEncodingChoice::Auto);
        assert!(opts.fsst_symbols.is_none());

        let opts = EncoderOptions::new()
            .with_physical_technique(PhysicalTechnique::None)
            .with_integer_encoding(IntegerEncodingChoice::DeltaRle)
            .with_fsst_symbols(["Str", "eet"]);
        assert_eq!(opts.physical_technique, PhysicalTechnique::None);
        assert_eq!(opts.integer_encoding, IntegerEncodingChoice::DeltaRle);
        assert_eq!(opts.fsst_symbols.as_deref().map(|s| s.len()), Some(2));
    }
}
