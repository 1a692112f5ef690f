//! skipgram CLI - word2vec trainer
//!
//! Command-line interface for training skip-gram embeddings and querying
//! saved artifacts.

use clap::{Args, Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::error;
use skipgram::{
    artifact_path, run_training_with_progress, Config, DataReader, EmbeddingArtifact, Normalizer,
    OutputConfig, Result, SkipGramConfig, SkipGramModel, TextConfig, TrainEvent, TrainOptions,
    BASIC_CORPUS, BASIC_VOCAB_SIZE,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Corpus name selecting the bundled sample text.
const BASIC: &str = "basic";

#[derive(Parser)]
#[command(name = "skipgram")]
#[command(author = "skipgram contributors")]
#[command(version)]
#[command(about = "Skip-gram word embeddings trained with sampled softmax", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train embeddings on a corpus
    Train(TrainArgs),

    /// Find the nearest words in a saved artifact
    Similar {
        /// Artifact file to use
        artifact: PathBuf,

        /// Word to find neighbours for
        word: String,

        /// Number of neighbours
        #[arg(short = 'k', long, default_value = "8")]
        top_k: usize,
    },

    /// Show artifact information
    Info {
        /// Artifact file to inspect
        artifact: PathBuf,
    },
}

#[derive(Args)]
struct TrainArgs {
    /// Corpus file, or "basic" for the bundled sample (forces vocab size 500)
    #[arg(short, long, default_value = BASIC)]
    file: String,

    /// Number of training steps
    #[arg(short = 's', long, default_value = "100000")]
    num_steps: usize,

    /// Vocabulary size, including the unknown token
    #[arg(short = 'v', long, default_value = "50000")]
    vocab_size: usize,

    /// Pairs per batch
    #[arg(short, long, default_value = "128")]
    batch_size: usize,

    /// Embedding dimensionality
    #[arg(short, long, default_value = "128")]
    embed_size: usize,

    /// Words considered on each side of the center word
    #[arg(short = 'k', long, default_value = "1")]
    skip_window: usize,

    /// Times each center word is reused in a batch
    #[arg(short = 'n', long, default_value = "2")]
    num_skips: usize,

    /// Negative classes sampled per batch
    #[arg(short = 'S', long, default_value = "64")]
    num_sampled: usize,

    /// Adagrad learning rate
    #[arg(short, long, default_value = "1.0")]
    learning_rate: f32,

    /// Report the average loss every N steps
    #[arg(short = 'w', long, default_value = "2000")]
    show_step: usize,

    /// Report nearest neighbours every N steps
    #[arg(short = 'B', long, default_value = "10000")]
    verbose_step: usize,

    /// Number of validation words
    #[arg(short = 'V', long, default_value = "16")]
    valid_size: usize,

    /// Validation words are drawn from the N most frequent
    #[arg(short = 'W', long, default_value = "100")]
    valid_window: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the trained artifact
    #[arg(long, default_value = "vectors")]
    output_dir: PathBuf,

    /// Parent directory of run summaries
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Directory for the projector bundle
    #[arg(long, default_value = "processed")]
    projector_dir: PathBuf,

    /// Skip run summaries and the projector export
    #[arg(long)]
    no_visualization: bool,

    /// Skip the nearest-neighbour reports
    #[arg(long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Train(args) => train(args, cli.verbose),
        Commands::Similar {
            artifact,
            word,
            top_k,
        } => find_similar(artifact, word, top_k),
        Commands::Info { artifact } => show_info(artifact),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn train(args: TrainArgs, debug: bool) -> Result<()> {
    let start_time = Instant::now();

    println!("skipgram word2vec trainer");
    println!("   Corpus: {}", args.file);
    println!();

    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let bar_style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .map(|style| style.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

    let vocab_size = if args.file == BASIC {
        BASIC_VOCAB_SIZE
    } else {
        args.vocab_size
    };

    let skipgram = SkipGramConfig {
        vocab_size,
        batch_size: args.batch_size,
        embed_size: args.embed_size,
        skip_window: args.skip_window,
        num_skips: args.num_skips,
        num_sampled: args.num_sampled,
        learning_rate: args.learning_rate,
        num_steps: args.num_steps,
        show_step: args.show_step,
        verbose_step: args.verbose_step,
        valid_size: args.valid_size,
        valid_window: args.valid_window,
        seed: args.seed,
        ..Default::default()
    };
    let output = OutputConfig {
        artifact_dir: args.output_dir,
        projector_dir: args.projector_dir,
        log_dir: args.log_dir,
        ..Default::default()
    };
    let mut config = Config::new(skipgram, TextConfig::default(), output)?;

    // Step 1: Load corpus
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style.clone());
    pb.set_message("Loading corpus...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut reader = if args.file == BASIC {
        DataReader::from_text(BASIC_CORPUS, &config.text)
    } else {
        DataReader::from_path(&args.file, &config.text)?
    };
    reader.get_data(config.skipgram.vocab_size)?;
    let vocabulary = reader.vocabulary()?.clone();
    config.fit_vocabulary(vocabulary.len())?;

    pb.finish_and_clear();
    println!(
        "✓ Loaded {} tokens, vocabulary of {} words",
        format_number(reader.num_tokens()),
        format_number(vocabulary.len())
    );

    // Step 2: Initialize model
    let mut model = SkipGramModel::new(&config.skipgram)?;
    println!(
        "✓ Initialized model ({} x {} embeddings, {} sampled classes)",
        format_number(model.vocab_size()),
        model.embed_size(),
        model.num_sampled()
    );

    // Step 3: Train
    println!();
    println!("Training...");

    let pb = ProgressBar::new(config.skipgram.num_steps as u64);
    pb.set_style(bar_style);
    pb.set_message("Training skip-gram model...");

    let options = TrainOptions {
        verbose: !args.quiet,
        visualization: !args.no_visualization,
        debug,
    };
    let report = run_training_with_progress(&mut model, &reader, &config, options, |event| match event {
        TrainEvent::Step { step, loss } => {
            pb.set_position(step as u64 + 1);
            if step % 100 == 0 {
                pb.set_message(format!("Training skip-gram model... loss {:.4}", loss));
            }
        }
        TrainEvent::Report(line) => pb.println(line),
    })?;

    pb.finish_and_clear();
    println!(
        "✓ Trained {} steps (mean loss {:.4}, final loss {:.4})",
        format_number(config.skipgram.num_steps),
        report.mean_loss,
        report.final_loss
    );

    // Step 4: Save artifact
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style);
    pb.set_message("Saving embeddings...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let output_path = artifact_path(&config.output.artifact_dir, &args.file);
    let artifact = EmbeddingArtifact::new(vocabulary, report.final_embeddings, Some(config))?;
    artifact.save(&output_path)?;

    pb.finish_and_clear();
    println!("✓ Saved embeddings to {}", output_path.display());

    // Summary
    let elapsed = start_time.elapsed();
    println!();
    println!("Training complete in {}", HumanDuration(elapsed));
    println!("   Vocabulary: {} words", format_number(artifact.vocab_size()));
    println!("   Embeddings: {} x {}", format_number(artifact.vocab_size()), artifact.embed_size());
    if let Some(log_dir) = &report.log_dir {
        println!("   Summaries: {}", log_dir.display());
    }
    if let Some(projector) = &report.projector {
        println!("   Projector: {}", projector.config.display());
    }
    println!("   Output: {}", output_path.display());
    println!();
    println!("The artifact stores the word to index map, the index to word list");
    println!("and the ({}, {}) embedding matrix.", artifact.vocab_size(), artifact.embed_size());

    Ok(())
}

/// Format large numbers with commas for readability
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn find_similar(artifact_path: PathBuf, word: String, k: usize) -> Result<()> {
    let artifact = EmbeddingArtifact::load(&artifact_path)?;

    let text_config = artifact
        .config()
        .map(|config| config.text.clone())
        .unwrap_or_default();
    let query = Normalizer::new(text_config)
        .normalize_token(&word)
        .unwrap_or(word);

    if !artifact.contains(&query) {
        println!("Word '{}' not found in vocabulary", query);
        return Ok(());
    }

    println!("Words similar to '{}':", query);
    for (w, score) in artifact.nearest(&query, k)? {
        println!("  {:.4}  {}", score, w);
    }

    Ok(())
}

fn show_info(artifact_path: PathBuf) -> Result<()> {
    let artifact = EmbeddingArtifact::load(&artifact_path)?;

    println!("Artifact: {:?}", artifact_path);
    println!("  Vocabulary size: {}", format_number(artifact.vocab_size()));
    println!("  Embedding size: {}", artifact.embed_size());

    let preview: Vec<&str> = artifact.index2word().iter().take(10).map(String::as_str).collect();
    println!("  Most frequent: {}", preview.join(", "));

    match artifact.config() {
        Some(config) => {
            let cfg = &config.skipgram;
            println!("  Training config:");
            println!("    steps: {}", format_number(cfg.num_steps));
            println!("    batch size: {}", cfg.batch_size);
            println!("    skip window: {}, num skips: {}", cfg.skip_window, cfg.num_skips);
            println!("    sampled classes: {}", cfg.num_sampled);
            println!("    learning rate: {}", cfg.learning_rate);
            match cfg.seed {
                Some(seed) => println!("    seed: {}", seed),
                None => println!("    seed: random"),
            }
        }
        None => println!("  Training config: not stored"),
    }

    Ok(())
}
