//! Word tokenization for corpus reading.

use crate::config::TextConfig;
use crate::error::Result;
use crate::text::Normalizer;
use rayon::prelude::*;
use std::io::BufRead;
use unicode_segmentation::UnicodeSegmentation;

/// Tokenizer that splits text on Unicode word boundaries.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    normalizer: Normalizer,
}

impl Tokenizer {
    /// Creates a new tokenizer with the given configuration.
    pub fn new(config: TextConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    /// Creates a tokenizer with default configuration.
    pub fn default_config() -> Self {
        Self::new(TextConfig::default())
    }

    /// Tokenizes text into normalized words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(|word| self.normalizer.normalize_token(word))
            .collect()
    }

    /// Tokenizes a reader line by line into a single token stream.
    ///
    /// Lines are tokenized in parallel; the stream keeps line order.
    pub fn tokenize_lines<R: BufRead>(&self, reader: R) -> Result<Vec<String>> {
        let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
        let per_line: Vec<Vec<String>> = lines.par_iter().map(|line| self.tokenize(line)).collect();
        Ok(per_line.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_tokenize() {
        let tokenizer = Tokenizer::default_config();
        assert_eq!(tokenizer.tokenize("Hello, world!"), vec!["hello", "world"]);
    }

    #[test]
    fn test_unicode_tokenization() {
        let tokenizer = Tokenizer::default_config();
        let tokens = tokenizer.tokenize("Привет мир");
        assert_eq!(tokens, vec!["привет", "мир"]);
    }

    #[test]
    fn test_tokenize_lines_joins_stream() {
        let tokenizer = Tokenizer::default_config();
        let input = Cursor::new("The cat sat.\n\nOn the mat!\n");
        let tokens = tokenizer.tokenize_lines(input).unwrap();
        assert_eq!(tokens, vec!["the", "cat", "sat", "on", "the", "mat"]);
    }

    #[test]
    fn test_numbers_are_words() {
        let tokenizer = Tokenizer::default_config();
        assert_eq!(tokenizer.tokenize("route 66"), vec!["route", "66"]);
    }
}
