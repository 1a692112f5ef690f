//! Frequency-ranked vocabulary.

use crate::error::{Result, SkipGramError};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Token standing in for every word outside the vocabulary.
pub const UNK_TOKEN: &str = "UNK";

/// Index of [`UNK_TOKEN`].
pub const UNK_INDEX: usize = 0;

/// Word/index mapping ranked by corpus frequency.
///
/// Index 0 is always [`UNK_TOKEN`]. The remaining entries hold the most
/// frequent words in descending count order, ties broken by first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    word2index: HashMap<String, usize>,
    index2word: Vec<String>,
    counts: Vec<u64>,
}

impl Vocabulary {
    /// Builds a vocabulary of at most `vocab_size` entries (including `UNK`).
    ///
    /// The `UNK` count is the number of tokens that did not make the cut.
    pub fn build<S: AsRef<str>>(tokens: &[S], vocab_size: usize) -> Result<Self> {
        if vocab_size < 2 {
            return Err(SkipGramError::Config(format!(
                "vocab_size must be >= 2, got {vocab_size}"
            )));
        }
        if tokens.is_empty() {
            return Err(SkipGramError::Corpus("corpus contains no tokens".to_string()));
        }

        // word -> (count, first position)
        let mut stats: HashMap<&str, (u64, usize)> = HashMap::new();
        for (pos, token) in tokens.iter().enumerate() {
            let entry = stats.entry(token.as_ref()).or_insert((0, pos));
            entry.0 += 1;
        }

        let mut ranked: Vec<(&str, u64, usize)> = stats
            .into_iter()
            .filter(|(word, _)| *word != UNK_TOKEN)
            .map(|(word, (count, first))| (word, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(vocab_size - 1);

        let mut index2word = Vec::with_capacity(ranked.len() + 1);
        let mut counts = Vec::with_capacity(ranked.len() + 1);
        index2word.push(UNK_TOKEN.to_string());
        counts.push(0);

        let mut known = 0u64;
        for (word, count, _) in ranked {
            index2word.push(word.to_string());
            counts.push(count);
            known += count;
        }
        counts[UNK_INDEX] = tokens.len() as u64 - known;

        let word2index = index2word
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();

        Ok(Self {
            word2index,
            index2word,
            counts,
        })
    }

    /// Rebuilds a vocabulary from an index-ordered word list.
    pub fn from_index2word(index2word: Vec<String>) -> Result<Self> {
        let word2index: HashMap<String, usize> = index2word
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        if word2index.len() != index2word.len() {
            return Err(SkipGramError::InvalidArtifactFormat(
                "duplicate words in vocabulary".to_string(),
            ));
        }
        let counts = vec![0; index2word.len()];
        Ok(Self {
            word2index,
            index2word,
            counts,
        })
    }

    /// Number of entries, including `UNK`.
    pub fn len(&self) -> usize {
        self.index2word.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.index2word.is_empty()
    }

    /// Index of `word`, if it is in the vocabulary.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.word2index.get(word).copied()
    }

    /// Index of `word`, falling back to `UNK`.
    pub fn index_or_unk(&self, word: &str) -> usize {
        self.index_of(word).unwrap_or(UNK_INDEX)
    }

    /// Word at `index`.
    pub fn word(&self, index: usize) -> Option<&str> {
        self.index2word.get(index).map(String::as_str)
    }

    /// Corpus count of the entry at `index` (0 when loaded from an artifact).
    pub fn count(&self, index: usize) -> Option<u64> {
        self.counts.get(index).copied()
    }

    /// Word to index map.
    pub fn word2index(&self) -> &HashMap<String, usize> {
        &self.word2index
    }

    /// Index to word list.
    pub fn index2word(&self) -> &[String] {
        &self.index2word
    }

    /// Writes the first `limit` words, one per line, for the embedding projector.
    pub fn write_metadata_tsv<P: AsRef<Path>>(&self, path: P, limit: usize) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        for word in self.index2word.iter().take(limit) {
            writeln!(writer, "{word}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_ranked_by_frequency() {
        let vocab = Vocabulary::build(&tokens("b a c a b a"), 10).unwrap();
        assert_eq!(vocab.index2word(), &["UNK", "a", "b", "c"]);
        assert_eq!(vocab.count(1), Some(3));
        assert_eq!(vocab.count(UNK_INDEX), Some(0));
    }

    #[test]
    fn test_ties_follow_first_appearance() {
        let vocab = Vocabulary::build(&tokens("z y x"), 10).unwrap();
        assert_eq!(vocab.index2word(), &["UNK", "z", "y", "x"]);
    }

    #[test]
    fn test_truncation_counts_unknown() {
        let vocab = Vocabulary::build(&tokens("a a a b b c d"), 3).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("c"), None);
        assert_eq!(vocab.index_or_unk("d"), UNK_INDEX);
        assert_eq!(vocab.count(UNK_INDEX), Some(2));
    }

    #[test]
    fn test_maps_are_inverse() {
        let vocab = Vocabulary::build(&tokens("one two two three three three"), 10).unwrap();
        for (i, word) in vocab.index2word().iter().enumerate() {
            assert_eq!(vocab.index_of(word), Some(i));
        }
    }

    #[test]
    fn test_empty_corpus_errors() {
        let empty: Vec<String> = Vec::new();
        assert!(Vocabulary::build(&empty, 10).is_err());
    }

    #[test]
    fn test_from_index2word_rejects_duplicates() {
        let words = vec!["UNK".to_string(), "a".to_string(), "a".to_string()];
        assert!(Vocabulary::from_index2word(words).is_err());
    }

    #[test]
    fn test_metadata_tsv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("vocab.tsv");
        let vocab = Vocabulary::build(&tokens("a a b c"), 10).unwrap();
        vocab.write_metadata_tsv(&path, 2).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "UNK\na\n");
    }
}
