//! Integration tests for the skip-gram trainer.

use skipgram::{
    artifact_path, run_training, Config, DataReader, EmbeddingArtifact, OutputConfig, SkipGramConfig,
    SkipGramError, SkipGramModel, TextConfig, TrainOptions, BASIC_CORPUS, BASIC_VOCAB_SIZE,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Creates a simple test corpus for training.
fn create_test_corpus() -> String {
    [
        "The quick brown fox jumps over the lazy dog.",
        "A fast red fox leaps above the sleeping hound.",
        "The cat and the dog are good friends.",
        "Cats and dogs can be friendly animals.",
        "The king and queen ruled the kingdom.",
        "A queen is a female king in royal terms.",
        "The man and woman walked through the park.",
        "Men and women enjoy walking in parks.",
    ]
    .join("\n")
        + "\n"
}

fn write_corpus(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("royal.txt");
    fs::write(&path, create_test_corpus().repeat(25)).unwrap();
    path
}

fn small_config(root: &Path, num_steps: usize) -> Config {
    let skipgram = SkipGramConfig {
        vocab_size: 100,
        batch_size: 32,
        embed_size: 16,
        num_sampled: 8,
        num_steps,
        show_step: 50,
        verbose_step: 100,
        valid_size: 4,
        valid_window: 10,
        seed: Some(42),
        ..Default::default()
    };
    let output = OutputConfig {
        artifact_dir: root.join("vectors"),
        projector_dir: root.join("processed"),
        log_dir: root.join("logs"),
        ..Default::default()
    };
    Config::new(skipgram, TextConfig::default(), output).unwrap()
}

fn prepare(reader: &mut DataReader, config: &mut Config) -> SkipGramModel {
    reader.get_data(config.skipgram.vocab_size).unwrap();
    config
        .fit_vocabulary(reader.vocabulary().unwrap().len())
        .unwrap();
    SkipGramModel::new(&config.skipgram).unwrap()
}

#[test]
fn test_full_pipeline() {
    let dir = tempdir().unwrap();
    let corpus = write_corpus(dir.path());
    let mut config = small_config(dir.path(), 200);

    let mut reader = DataReader::from_path(&corpus, &config.text).unwrap();
    let mut model = prepare(&mut reader, &mut config);
    let vocab_size = config.skipgram.vocab_size;
    assert!(vocab_size < 100, "vocabulary should shrink to the corpus");

    let report = run_training(&mut model, &reader, &config, TrainOptions::default()).unwrap();
    assert_eq!(report.final_embeddings.dim(), (vocab_size, 16));
    assert!(report.log_dir.is_some());
    assert!(dir.path().join("processed/projector_config.pbtxt").exists());

    let path = artifact_path(&config.output.artifact_dir, &corpus);
    assert!(path.ends_with("vectors/royal.sgem"));

    let vocabulary = reader.vocabulary().unwrap().clone();
    let artifact = EmbeddingArtifact::new(vocabulary, report.final_embeddings, Some(config.clone())).unwrap();
    artifact.save(&path).unwrap();

    let loaded = EmbeddingArtifact::load(&path).unwrap();
    assert_eq!(loaded.vocab_size(), vocab_size);
    assert_eq!(loaded.embed_size(), 16);
    assert_eq!(loaded.index2word()[0], "UNK");
    assert_eq!(loaded.index2word()[1], "the");
    assert_eq!(loaded.word2index().get("king"), artifact.word2index().get("king"));

    let stored = loaded.config().unwrap();
    assert_eq!(stored.skipgram, config.skipgram);
    assert_eq!(stored.valid_examples(), config.valid_examples());

    let neighbours = loaded.nearest("king", 3).unwrap();
    assert_eq!(neighbours.len(), 3);
    assert!(neighbours.iter().all(|(w, _)| w != "king"));
    assert!(neighbours.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[test]
fn test_loss_decreases() {
    let dir = tempdir().unwrap();
    let mut config = small_config(dir.path(), 400);
    let mut reader = DataReader::from_text(&create_test_corpus().repeat(25), &config.text);
    let mut model = prepare(&mut reader, &mut config);

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let probe = reader.batch_generator(128, 2, 1, 0, &mut rng).unwrap();
    let before = model.full_softmax_loss(&probe).unwrap();

    let options = TrainOptions {
        verbose: false,
        visualization: false,
        debug: false,
    };
    let report = run_training(&mut model, &reader, &config, options).unwrap();
    let after = model.full_softmax_loss(&probe).unwrap();

    assert!(after < before, "loss did not decrease: {before} -> {after}");
    assert_eq!(report.loss_history.len(), 7);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let dir = tempdir().unwrap();
    let options = TrainOptions {
        verbose: false,
        visualization: false,
        debug: false,
    };

    let run = || {
        let mut config = small_config(dir.path(), 50);
        let mut reader = DataReader::from_text(&create_test_corpus().repeat(10), &config.text);
        let mut model = prepare(&mut reader, &mut config);
        run_training(&mut model, &reader, &config, options).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.final_embeddings, second.final_embeddings);
    assert_eq!(first.mean_loss, second.mean_loss);
}

#[test]
fn test_basic_corpus() {
    let dir = tempdir().unwrap();
    let mut config = small_config(dir.path(), 30);
    config.skipgram.vocab_size = BASIC_VOCAB_SIZE;

    let mut reader = DataReader::from_text(BASIC_CORPUS, &config.text);
    let mut model = prepare(&mut reader, &mut config);
    assert!(config.skipgram.vocab_size <= BASIC_VOCAB_SIZE);

    let options = TrainOptions {
        verbose: true,
        visualization: false,
        debug: false,
    };
    let report = run_training(&mut model, &reader, &config, options).unwrap();
    assert_eq!(report.final_embeddings.nrows(), config.skipgram.vocab_size);
    assert!(report.final_loss.is_finite());
}

#[test]
fn test_load_rejects_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.sgem");
    fs::write(&path, b"definitely not an embedding file, but long enough for a header").unwrap();

    let result = EmbeddingArtifact::load(&path);
    assert!(matches!(result, Err(SkipGramError::InvalidArtifactFormat(_))));
}

#[test]
fn test_missing_corpus() {
    let dir = tempdir().unwrap();
    let result = DataReader::from_path(dir.path().join("missing.txt"), &TextConfig::default());
    assert!(matches!(result, Err(SkipGramError::FileNotFound(_))));
}
