//! Token normalization.

use crate::config::TextConfig;
use unicode_normalization::UnicodeNormalization;

/// Token normalizer driven by a [`TextConfig`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: TextConfig,
}

impl Normalizer {
    /// Creates a new normalizer with the given configuration.
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Creates a normalizer with default configuration.
    pub fn default_config() -> Self {
        Self::new(TextConfig::default())
    }

    /// Normalizes a single token.
    ///
    /// Returns `None` if the token should be filtered out.
    pub fn normalize_token(&self, token: &str) -> Option<String> {
        let mut result: String = if self.config.unicode_normalize {
            token.nfc().collect()
        } else {
            token.to_string()
        };

        if self.config.lowercase {
            result = result.to_lowercase();
        }

        if self.config.remove_punctuation {
            result.retain(|c| !c.is_ascii_punctuation());
        }

        if self.config.remove_numbers && result.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        // Length bounds count characters, not bytes.
        let len = result.chars().count();
        if len == 0 || len < self.config.min_token_length || len > self.config.max_token_length {
            return None;
        }

        Some(result)
    }

    /// Normalizes whitespace-separated text and returns all valid tokens.
    pub fn normalize_text(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter_map(|token| self.normalize_token(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_token("HELLO"), Some("hello".to_string()));
    }

    #[test]
    fn test_remove_punctuation() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_token("hello,"), Some("hello".to_string()));
        assert_eq!(normalizer.normalize_token("!!!"), None);
    }

    #[test]
    fn test_single_letter_words_kept() {
        let normalizer = Normalizer::default_config();
        assert_eq!(normalizer.normalize_token("a"), Some("a".to_string()));
    }

    #[test]
    fn test_length_counts_chars() {
        let config = TextConfig {
            max_token_length: 4,
            ..Default::default()
        };
        let normalizer = Normalizer::new(config);
        // "мир" is six bytes but three characters.
        assert_eq!(normalizer.normalize_token("мир!"), Some("мир".to_string()));
        assert_eq!(normalizer.normalize_token("привет"), None);
    }

    #[test]
    fn test_composed_and_decomposed_agree() {
        let normalizer = Normalizer::default_config();
        let composed = normalizer.normalize_token("caf\u{e9}");
        let decomposed = normalizer.normalize_token("cafe\u{301}");
        assert_eq!(composed, decomposed);
    }

    #[test]
    fn test_remove_numbers() {
        let config = TextConfig {
            remove_numbers: true,
            ..Default::default()
        };
        let normalizer = Normalizer::new(config);
        assert_eq!(normalizer.normalize_token("123"), None);
        assert_eq!(normalizer.normalize_token("abc123"), Some("abc123".to_string()));
    }

    #[test]
    fn test_normalize_text() {
        let normalizer = Normalizer::default_config();
        let tokens = normalizer.normalize_text("Hello, World! This is a test.");
        assert_eq!(tokens, vec!["hello", "world", "this", "is", "a", "test"]);
    }
}
