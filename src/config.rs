//! Extraction configuration.

/// Options controlling text extraction.
///
/// The numeric thresholds are the tunable heuristics of the pipeline;
/// the defaults match common PDF producer behavior.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Token inserted for operator-induced line breaks within a page and
    /// between fallback-path stream emissions.
    pub divider: String,

    /// Enable diagnostic logging to standard error. Development aid only;
    /// the output content is not part of the contract.
    pub debug: bool,

    /// A `TJ` numeric adjustment below this value emits a single space
    /// (negative numbers advance the text cursor forward).
    pub tj_gap_threshold: f64,

    /// A ToUnicode map with fewer entries than this still triggers the
    /// embedded-font parse; subset fonts frequently ship an incomplete
    /// ToUnicode alongside a complete embedded `cmap`.
    pub min_tounicode_entries: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self {
            divider: "\n".to_string(),
            debug: false,
            tj_gap_threshold: -80.0,
            min_tounicode_entries: 100,
        }
    }

    /// Set the line-break divider.
    pub fn with_divider(mut self, divider: impl Into<String>) -> Self {
        self.divider = divider.into();
        self
    }

    /// Enable diagnostic logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the `TJ` inter-word gap threshold.
    pub fn with_tj_gap_threshold(mut self, threshold: f64) -> Self {
        self.tj_gap_threshold = threshold;
        self
    }

    /// Set the minimum ToUnicode entry count below which the embedded
    /// font is also parsed.
    pub fn with_min_tounicode_entries(mut self, count: usize) -> Self {
        self.min_tounicode_entries = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.divider, "\n");
        assert!(!options.debug);
        assert_eq!(options.tj_gap_threshold, -80.0);
        assert_eq!(options.min_tounicode_entries, 100);
    }

    #[test]
    fn test_builders() {
        let options = ExtractOptions::new()
            .with_divider(" | ")
            .with_debug(true)
            .with_tj_gap_threshold(-120.0)
            .with_min_tounicode_entries(10);
        assert_eq!(options.divider, " | ");
        assert!(options.debug);
        assert_eq!(options.tj_gap_threshold, -120.0);
        assert_eq!(options.min_tounicode_entries, 10);
    }
}
