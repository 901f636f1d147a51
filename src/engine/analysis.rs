//! Term extraction for analyzed string fields.
//!
//! Text is split on Unicode word boundaries (UAX #29) and lowercased.
//! Punctuation and whitespace segments are dropped.
//!
//! ```
//! use docmap::engine::analysis::WordAnalyzer;
//!
//! let terms: Vec<String> = WordAnalyzer::new().analyze("Hello, World!").collect();
//! assert_eq!(terms, vec!["hello", "world"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

/// Lowercasing Unicode word analyzer.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordAnalyzer;

impl WordAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        WordAnalyzer
    }

    /// Terms of `text`, in order, duplicates included.
    pub fn analyze<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.unicode_words().map(str::to_lowercase)
    }
}
