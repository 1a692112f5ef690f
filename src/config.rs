//! Configuration for the skip-gram trainer.

use crate::error::{Result, SkipGramError};
use log::warn;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration: hyperparameters plus the fixed validation sample.
///
/// The validation sample is drawn once in [`Config::new`] and stays fixed for
/// the lifetime of the configuration, so every nearest-neighbour report during
/// a run looks at the same words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model and training hyperparameters.
    pub skipgram: SkipGramConfig,

    /// Text processing configuration.
    pub text: TextConfig,

    /// Output locations.
    pub output: OutputConfig,

    /// Vocabulary indices used for nearest-neighbour checks.
    valid_examples: Vec<usize>,
}

impl Config {
    /// Validates the hyperparameters and draws the validation sample.
    pub fn new(skipgram: SkipGramConfig, text: TextConfig, output: OutputConfig) -> Result<Self> {
        skipgram.validate()?;
        let valid_examples = skipgram.draw_validation_sample();
        Ok(Self {
            skipgram,
            text,
            output,
            valid_examples,
        })
    }

    /// Configuration with every section at its default.
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            SkipGramConfig::default(),
            TextConfig::default(),
            OutputConfig::default(),
        )
    }

    /// The fixed validation sample.
    pub fn valid_examples(&self) -> &[usize] {
        &self.valid_examples
    }

    /// Shrinks the configuration to a vocabulary of `actual` words.
    ///
    /// A corpus can hold fewer distinct words than `vocab_size` asks for.
    /// Sizes that depend on the vocabulary are clamped, and the validation
    /// sample is redrawn only when it no longer fits.
    pub fn fit_vocabulary(&mut self, actual: usize) -> Result<()> {
        if actual < 2 {
            return Err(SkipGramError::Corpus(format!(
                "vocabulary needs at least 2 entries, found {actual}"
            )));
        }
        let cfg = &mut self.skipgram;
        if actual >= cfg.vocab_size {
            return Ok(());
        }

        warn!(
            "Corpus only has {} distinct entries; shrinking vocab_size from {}",
            actual, cfg.vocab_size
        );
        cfg.vocab_size = actual;
        cfg.num_sampled = cfg.num_sampled.min(actual - 1);
        cfg.valid_window = cfg.valid_window.min(actual);
        cfg.valid_size = cfg.valid_size.min(cfg.valid_window);
        cfg.validate()?;

        let fits = self.valid_examples.len() == cfg.valid_size
            && self.valid_examples.iter().all(|&i| i < cfg.valid_window);
        if !fits {
            self.valid_examples = cfg.draw_validation_sample();
        }
        Ok(())
    }
}

/// Skip-gram model and training hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipGramConfig {
    /// Number of vocabulary entries, including the unknown token.
    /// Default: 50,000.
    pub vocab_size: usize,

    /// Number of (center, context) pairs per batch.
    /// Default: 128.
    pub batch_size: usize,

    /// Dimensionality of the embedding vectors.
    /// Default: 128.
    pub embed_size: usize,

    /// Words considered on each side of the center word.
    /// Default: 1.
    pub skip_window: usize,

    /// Times each center word is reused within a batch.
    /// Default: 2.
    pub num_skips: usize,

    /// Negative classes sampled for the softmax approximation.
    /// Default: 64.
    pub num_sampled: usize,

    /// Adagrad learning rate.
    /// Default: 1.0.
    pub learning_rate: f32,

    /// Number of training steps.
    /// Default: 100,001.
    pub num_steps: usize,

    /// Report the average loss every this many steps.
    /// Default: 2,000.
    pub show_step: usize,

    /// Report nearest neighbours every this many steps.
    /// Default: 10,000.
    pub verbose_step: usize,

    /// Number of validation words.
    /// Default: 16.
    pub valid_size: usize,

    /// Validation words are drawn from the `valid_window` most frequent.
    /// Default: 100.
    pub valid_window: usize,

    /// Neighbours listed per validation word.
    /// Default: 8.
    pub top_k: usize,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for SkipGramConfig {
    fn default() -> Self {
        Self {
            vocab_size: 50_000,
            batch_size: 128,
            embed_size: 128,
            skip_window: 1,
            num_skips: 2,
            num_sampled: 64,
            learning_rate: 1.0,
            num_steps: 100_001,
            show_step: 2_000,
            verbose_step: 10_000,
            valid_size: 16,
            valid_window: 100,
            top_k: 8,
            seed: None,
        }
    }
}

impl SkipGramConfig {
    /// Width of the sliding window around a center word.
    #[inline]
    pub fn span(&self) -> usize {
        2 * self.skip_window + 1
    }

    /// Creates the RNG for a named stream of this run.
    ///
    /// Each consumer gets its own stream so that, for a fixed seed, adding
    /// draws in one place does not shift the others.
    pub fn rng(&self, stream: u64) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(stream);
                rng
            }
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Checks the relationships between hyperparameters.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("vocab_size", self.vocab_size),
            ("batch_size", self.batch_size),
            ("embed_size", self.embed_size),
            ("skip_window", self.skip_window),
            ("num_skips", self.num_skips),
            ("num_sampled", self.num_sampled),
            ("num_steps", self.num_steps),
            ("show_step", self.show_step),
            ("verbose_step", self.verbose_step),
            ("top_k", self.top_k),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SkipGramError::Config(format!("{name} must be > 0")));
            }
        }

        if self.num_skips > 2 * self.skip_window {
            return Err(SkipGramError::Config(format!(
                "num_skips ({}) must be <= 2 * skip_window ({})",
                self.num_skips,
                2 * self.skip_window
            )));
        }
        if self.batch_size % self.num_skips != 0 {
            return Err(SkipGramError::Config(format!(
                "batch_size ({}) must be a multiple of num_skips ({})",
                self.batch_size, self.num_skips
            )));
        }
        if self.num_sampled >= self.vocab_size {
            return Err(SkipGramError::Config(format!(
                "num_sampled ({}) must be < vocab_size ({})",
                self.num_sampled, self.vocab_size
            )));
        }
        if self.valid_size > self.valid_window {
            return Err(SkipGramError::Config(format!(
                "valid_size ({}) must be <= valid_window ({})",
                self.valid_size, self.valid_window
            )));
        }
        if self.valid_window > self.vocab_size {
            return Err(SkipGramError::Config(format!(
                "valid_window ({}) must be <= vocab_size ({})",
                self.valid_window, self.vocab_size
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(SkipGramError::Config(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    fn draw_validation_sample(&self) -> Vec<usize> {
        let mut rng = self.rng(streams::VALIDATION);
        rand::seq::index::sample(&mut rng, self.valid_window, self.valid_size).into_vec()
    }
}

/// RNG stream identifiers, see [`SkipGramConfig::rng`].
pub mod streams {
    /// Validation sample.
    pub const VALIDATION: u64 = 1;
    /// Parameter initialisation.
    pub const INIT: u64 = 2;
    /// Batch generation.
    pub const BATCHES: u64 = 3;
    /// Negative candidate sampling.
    pub const SAMPLER: u64 = 4;
}

/// Text processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Convert all text to lowercase.
    /// Default: true.
    pub lowercase: bool,

    /// Minimum token length to include.
    /// Default: 1.
    pub min_token_length: usize,

    /// Maximum token length to include.
    /// Default: 50.
    pub max_token_length: usize,

    /// Remove punctuation from tokens.
    /// Default: true.
    pub remove_punctuation: bool,

    /// Remove numeric tokens.
    /// Default: false.
    pub remove_numbers: bool,

    /// Apply Unicode normalization (NFC).
    /// Default: true.
    pub unicode_normalize: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            min_token_length: 1,
            max_token_length: 50,
            remove_punctuation: true,
            remove_numbers: false,
            unicode_normalize: true,
        }
    }
}

/// Where a training run writes its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the trained artifact.
    /// Default: "vectors".
    pub artifact_dir: PathBuf,

    /// Directory for the embedding projector bundle.
    /// Default: "processed".
    pub projector_dir: PathBuf,

    /// Parent directory of per-run summary logs.
    /// Default: "logs".
    pub log_dir: PathBuf,

    /// Rows exported to the projector.
    /// Default: 1,000.
    pub projector_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("vectors"),
            projector_dir: PathBuf::from("processed"),
            log_dir: PathBuf::from("logs"),
            projector_limit: 1_000,
        }
    }
}
