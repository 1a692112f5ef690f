//! # skipgram - word embeddings with sampled softmax
//!
//! A skip-gram word2vec trainer. Raw text is tokenized, ranked into a
//! vocabulary and turned into `(center, context)` pairs; a model learns one
//! embedding per word by predicting context words through a sampled softmax
//! and sparse Adagrad updates.
//!
//! ## Key Features
//!
//! - **Skip-gram batches** from a sliding window over the corpus
//! - **Sampled softmax** with a log-uniform candidate sampler
//! - **Nearest-neighbour reports** for a fixed set of validation words
//! - **Efficient binary format** bundling vocabulary, embeddings and config
//! - **Projector export** for browsing embeddings in TensorBoard
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skipgram::{run_training, Config, DataReader, EmbeddingArtifact, SkipGramModel, TrainOptions};
//!
//! let mut config = Config::with_defaults()?;
//! let mut reader = DataReader::from_path("text8.txt", &config.text)?;
//! reader.get_data(config.skipgram.vocab_size)?;
//! config.fit_vocabulary(reader.vocabulary()?.len())?;
//!
//! let mut model = SkipGramModel::new(&config.skipgram)?;
//! let report = run_training(&mut model, &reader, &config, TrainOptions::default())?;
//!
//! let artifact = EmbeddingArtifact::new(
//!     reader.vocabulary()?.clone(),
//!     model.into_embeddings(),
//!     Some(config),
//! )?;
//! artifact.save("vectors/text8.sgem")?;
//! println!("{:?}", artifact.nearest("king", 8)?);
//! ```
//!
//! ## Architecture
//!
//! - [`text`] - Text normalization and tokenization
//! - [`data`] - Vocabulary and skip-gram batch generation
//! - [`model`] - Skip-gram model, candidate sampler and optimizer
//! - [`similarity`] - Cosine similarity and nearest-neighbour search
//! - [`train`] - Training loop and run summaries
//! - [`storage`] - Binary format, artifacts and projector export

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod similarity;
pub mod storage;
pub mod text;
pub mod train;

// Re-export commonly used types
pub use config::{Config, OutputConfig, SkipGramConfig, TextConfig};
pub use data::{Batch, DataReader, Vocabulary, UNK_INDEX, UNK_TOKEN};
pub use error::{Result, SkipGramError};
pub use model::{Adagrad, LogUniformSampler, LossGradients, SkipGramModel};
pub use similarity::{nearest, CosineSimilarity, SimilarityMeasure};
pub use storage::{artifact_path, export_projector, EmbeddingArtifact, EmbeddingFormat};
pub use text::{Normalizer, Tokenizer};
pub use train::{run_training, run_training_with_progress, SummaryWriter, TrainEvent, TrainOptions, TrainReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vocabulary size forced when training on the bundled sample corpus.
pub const BASIC_VOCAB_SIZE: usize = 500;

/// The bundled sample corpus.
pub const BASIC_CORPUS: &str = include_str!("../corpus/basic.txt");
