//! Corpus reader and skip-gram batch generation.

use crate::config::TextConfig;
use crate::data::Vocabulary;
use crate::error::{Result, SkipGramError};
use crate::text::Tokenizer;
use log::info;
use rand::Rng;
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A batch of (center, target) word-index pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Corpus cursor to pass to the next call of [`DataReader::batch_generator`].
    pub data_index: usize,
    /// Center word of each pair.
    pub centers: Vec<usize>,
    /// Context word each center has to predict.
    pub targets: Vec<usize>,
}

impl Batch {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Iterates over `(center, target)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.centers.iter().copied().zip(self.targets.iter().copied())
    }
}

/// Reads a corpus, builds its vocabulary and serves training batches.
#[derive(Debug, Clone)]
pub struct DataReader {
    tokens: Vec<String>,
    vocabulary: Option<Vocabulary>,
    data: Vec<usize>,
}

impl DataReader {
    /// Tokenizes the file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P, config: &TextConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SkipGramError::FileNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let tokens = Tokenizer::new(config.clone()).tokenize_lines(reader)?;
        info!("Read {} tokens from {}", tokens.len(), path.display());
        Ok(Self::from_tokens(tokens))
    }

    /// Tokenizes an in-memory text.
    pub fn from_text(text: &str, config: &TextConfig) -> Self {
        Self::from_tokens(Tokenizer::new(config.clone()).tokenize(text))
    }

    /// Wraps an already tokenized corpus.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self {
            tokens,
            vocabulary: None,
            data: Vec::new(),
        }
    }

    /// Number of corpus tokens.
    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    /// Builds the vocabulary and maps the corpus onto its indices.
    pub fn get_data(&mut self, vocab_size: usize) -> Result<()> {
        let vocabulary = Vocabulary::build(&self.tokens, vocab_size)?;
        self.data = self
            .tokens
            .iter()
            .map(|token| vocabulary.index_or_unk(token))
            .collect();
        info!(
            "Vocabulary: {} entries, {} unknown tokens",
            vocabulary.len(),
            vocabulary.count(crate::data::UNK_INDEX).unwrap_or(0)
        );
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    /// The vocabulary built by [`DataReader::get_data`].
    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary
            .as_ref()
            .ok_or_else(|| SkipGramError::Corpus("get_data has not been called".to_string()))
    }

    /// The corpus as vocabulary indices.
    pub fn data(&self) -> &[usize] {
        &self.data
    }

    /// Produces the next skip-gram batch starting at `data_index`.
    ///
    /// A window of `2 * skip_window + 1` indices slides over the corpus. For
    /// each center position, `num_skips` distinct context slots are drawn at
    /// random and emitted as `(center, context)` pairs; the window then moves
    /// one token. The corpus wraps around. The returned cursor is rewound by
    /// one window so that consecutive batches do not skip words.
    pub fn batch_generator<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        num_skips: usize,
        skip_window: usize,
        data_index: usize,
        rng: &mut R,
    ) -> Result<Batch> {
        if num_skips == 0 || batch_size % num_skips != 0 {
            return Err(SkipGramError::Config(format!(
                "batch_size ({batch_size}) must be a positive multiple of num_skips ({num_skips})"
            )));
        }
        if num_skips > 2 * skip_window {
            return Err(SkipGramError::Config(format!(
                "num_skips ({num_skips}) must be <= 2 * skip_window ({})",
                2 * skip_window
            )));
        }

        let span = 2 * skip_window + 1;
        let n = self.data.len();
        if n < span {
            return Err(SkipGramError::Corpus(format!(
                "corpus has {n} indexed tokens, need at least {span}"
            )));
        }

        let mut cursor = data_index % n;
        let mut buffer: VecDeque<usize> = VecDeque::with_capacity(span);
        for _ in 0..span {
            buffer.push_back(self.data[cursor]);
            cursor = (cursor + 1) % n;
        }

        // Context slots: every window position except the center.
        let slots: Vec<usize> = (0..span).filter(|&j| j != skip_window).collect();
        let mut centers = Vec::with_capacity(batch_size);
        let mut targets = Vec::with_capacity(batch_size);

        for _ in 0..batch_size / num_skips {
            let center = buffer[skip_window];
            for pick in rand::seq::index::sample(rng, slots.len(), num_skips) {
                centers.push(center);
                targets.push(buffer[slots[pick]]);
            }
            buffer.pop_front();
            buffer.push_back(self.data[cursor]);
            cursor = (cursor + 1) % n;
        }

        let data_index = (cursor + n - span) % n;
        Ok(Batch {
            data_index,
            centers,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Reader whose vocabulary indices equal corpus positions + 1.
    fn sequential(n: usize) -> DataReader {
        let tokens: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
        let mut reader = DataReader::from_tokens(tokens);
        reader.get_data(n + 1).unwrap();
        reader
    }

    #[test]
    fn test_get_data_maps_tokens() {
        let mut reader = DataReader::from_text("the cat the dog the end", &TextConfig::default());
        reader.get_data(3).unwrap();

        let vocab = reader.vocabulary().unwrap();
        assert_eq!(vocab.word(1), Some("the"));
        assert_eq!(reader.data().len(), 6);
        assert_eq!(reader.data()[0], 1);
        // "dog" is out of a 3-entry vocabulary.
        assert_eq!(reader.data()[3], crate::data::UNK_INDEX);
    }

    #[test]
    fn test_vocabulary_before_get_data_errors() {
        let reader = DataReader::from_text("a b c", &TextConfig::default());
        assert!(reader.vocabulary().is_err());
    }

    #[test]
    fn test_batch_shape_and_window() {
        let reader = sequential(20);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let batch = reader.batch_generator(8, 2, 1, 0, &mut rng).unwrap();

        assert_eq!(batch.len(), 8);
        // Centers repeat num_skips times and walk the corpus.
        let expected_centers: Vec<usize> = vec![2, 2, 3, 3, 4, 4, 5, 5];
        assert_eq!(batch.centers, expected_centers);
        for (center, target) in batch.pairs() {
            assert_ne!(center, target);
            assert!(center.abs_diff(target) <= 1);
        }
    }

    #[test]
    fn test_num_skips_are_distinct_contexts() {
        let reader = sequential(30);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let batch = reader.batch_generator(12, 4, 2, 0, &mut rng).unwrap();

        for chunk in batch.targets.chunks(4) {
            let mut seen = chunk.to_vec();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), 4);
        }
    }

    #[test]
    fn test_cursor_advances_without_skipping() {
        let reader = sequential(50);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let first = reader.batch_generator(8, 2, 1, 0, &mut rng).unwrap();
        assert_eq!(first.data_index, 4);

        let second = reader.batch_generator(8, 2, 1, first.data_index, &mut rng).unwrap();
        assert_eq!(second.centers[0], first.centers[7] + 1);
    }

    #[test]
    fn test_cursor_wraps_around() {
        let reader = sequential(5);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut index = 0;
        for _ in 0..10 {
            let batch = reader.batch_generator(4, 2, 1, index, &mut rng).unwrap();
            assert!(batch.data_index < 5);
            index = batch.data_index;
        }
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        let reader = sequential(10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(reader.batch_generator(7, 2, 1, 0, &mut rng).is_err());
        assert!(reader.batch_generator(8, 4, 1, 0, &mut rng).is_err());
    }

    #[test]
    fn test_rejects_short_corpus() {
        let reader = sequential(2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(reader.batch_generator(2, 2, 1, 0, &mut rng).is_err());
    }
}
