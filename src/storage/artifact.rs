//! Trained embeddings together with the vocabulary that indexes them.

use crate::config::Config;
use crate::data::Vocabulary;
use crate::error::{Result, SkipGramError};
use crate::similarity::{l2_normalize_rows, nearest, CosineSimilarity, SimilarityMeasure};
use crate::storage::format::EmbeddingFormat;
use log::info;
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of embedding artifacts.
pub const ARTIFACT_EXTENSION: &str = "sgem";

/// The persisted result of a training run.
///
/// Holds the word/index mappings, the raw embedding matrix and, when saved
/// by the trainer, the configuration that produced it.
#[derive(Debug, Clone)]
pub struct EmbeddingArtifact {
    vocabulary: Vocabulary,
    embeddings: Array2<f32>,
    normalized: Array2<f32>,
    config: Option<Config>,
}

impl EmbeddingArtifact {
    /// Creates an artifact, checking that every word has a row.
    pub fn new(vocabulary: Vocabulary, embeddings: Array2<f32>, config: Option<Config>) -> Result<Self> {
        if embeddings.nrows() != vocabulary.len() {
            return Err(SkipGramError::ShapeMismatch {
                expected: (vocabulary.len(), embeddings.ncols()),
                actual: embeddings.dim(),
            });
        }
        let normalized = l2_normalize_rows(embeddings.view());
        Ok(Self {
            vocabulary,
            embeddings,
            normalized,
            config,
        })
    }

    /// Loads an artifact from a binary file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SkipGramError::FileNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let decoded = EmbeddingFormat::decode(&bytes)?;
        Self::new(decoded.vocabulary, decoded.embeddings, decoded.config)
    }

    /// Saves the artifact to a binary file.
    ///
    /// The bytes go to a sibling temporary file first and are renamed into
    /// place, so readers never see a partial artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = EmbeddingFormat::encode(&self.vocabulary, &self.embeddings, self.config.as_ref())?;
        persist(path, &bytes)?;
        info!(
            "Saved {} x {} embeddings to {}",
            self.vocabulary.len(),
            self.embed_size(),
            path.display()
        );
        Ok(())
    }

    /// Returns the vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Word to index map.
    pub fn word2index(&self) -> &HashMap<String, usize> {
        self.vocabulary.word2index()
    }

    /// Index to word list.
    pub fn index2word(&self) -> &[String] {
        self.vocabulary.index2word()
    }

    /// Raw embedding matrix.
    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    /// Embedding matrix with unit-length rows.
    pub fn normalized_embeddings(&self) -> &Array2<f32> {
        &self.normalized
    }

    /// Training configuration, if stored.
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// Returns the number of words.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Returns the embedding dimensionality.
    pub fn embed_size(&self) -> usize {
        self.embeddings.ncols()
    }

    /// Checks if a word exists in the vocabulary.
    pub fn contains(&self, word: &str) -> bool {
        self.vocabulary.index_of(word).is_some()
    }

    /// Raw embedding of `word`.
    pub fn vector(&self, word: &str) -> Result<ArrayView1<f32>> {
        let index = self.index(word)?;
        Ok(self.embeddings.row(index))
    }

    /// Cosine similarity between two words.
    pub fn word_similarity(&self, word1: &str, word2: &str) -> Result<f32> {
        let a = self.vector(word1)?;
        let b = self.vector(word2)?;
        Ok(CosineSimilarity.similarity(a, b))
    }

    /// The `k` words closest to `word` by cosine similarity, best first.
    ///
    /// The query word itself is never returned.
    pub fn nearest(&self, word: &str, k: usize) -> Result<Vec<(String, f32)>> {
        let index = self.index(word)?;
        let scores = self.normalized.dot(&self.normalized.row(index));
        Ok(nearest(scores.view(), k, Some(index))
            .into_iter()
            .filter_map(|i| self.vocabulary.word(i).map(|w| (w.to_string(), scores[i])))
            .collect())
    }

    fn index(&self, word: &str) -> Result<usize> {
        self.vocabulary
            .index_of(word)
            .ok_or_else(|| SkipGramError::WordNotFound(word.to_string()))
    }
}

/// Default location of the artifact trained on `corpus`: `<dir>/<stem>.sgem`.
pub fn artifact_path<P: AsRef<Path>, Q: AsRef<Path>>(output_dir: P, corpus: Q) -> PathBuf {
    let stem = corpus
        .as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("corpus");
    output_dir
        .as_ref()
        .join(format!("{stem}.{ARTIFACT_EXTENSION}"))
}

/// Writes `payload` to a temporary sibling of `path`, then renames it.
fn persist(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("artifact");
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));
    fs::write(&tmp_path, payload)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
