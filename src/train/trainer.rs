//! The training loop.
//!
//! Pulls batches from a [`DataReader`], feeds them through the
//! [`SkipGramModel`] and reports progress: the average loss every
//! `show_step` steps and, when verbose, the nearest neighbours of the
//! validation words every `verbose_step` steps. With visualization on, every
//! step's loss goes to a [`SummaryWriter`] and the final embeddings are
//! exported for the projector.

use crate::config::{streams, Config};
use crate::data::{DataReader, Vocabulary, UNK_TOKEN};
use crate::error::{Result, SkipGramError};
use crate::model::SkipGramModel;
use crate::similarity::nearest;
use crate::storage::{export_projector, ProjectorFiles};
use crate::train::summary::{new_log_dir, SummaryWriter, EVENTS_FILE};
use log::{debug, info};
use ndarray::Array2;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Switches for a training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    /// Report nearest neighbours of the validation words.
    /// Default: true.
    pub verbose: bool,

    /// Write scalar summaries and export the projector bundle.
    /// Default: true.
    pub visualization: bool,

    /// Log the elapsed time and mean loss when done.
    /// Default: false.
    pub debug: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            verbose: true,
            visualization: true,
            debug: false,
        }
    }
}

/// Progress notifications emitted during training.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainEvent {
    /// A step finished with the given batch loss.
    Step {
        /// Zero-based step.
        step: usize,
        /// Sampled softmax loss of the step's batch.
        loss: f32,
    },
    /// A line of the human-readable report.
    Report(String),
}

/// Outcome of [`run_training`].
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Wall time of the loop.
    pub elapsed: Duration,
    /// Total loss divided by the number of steps.
    pub mean_loss: f32,
    /// Loss of the last step.
    pub final_loss: f32,
    /// `(step, average loss)` for every completed `show_step` window.
    pub loss_history: Vec<(usize, f32)>,
    /// Embeddings scaled to unit length.
    pub final_embeddings: Array2<f32>,
    /// Run directory of the scalar summaries.
    pub log_dir: Option<PathBuf>,
    /// Files written for the projector.
    pub projector: Option<ProjectorFiles>,
}

/// Trains `model` on `reader`, reporting through `info!`.
pub fn run_training(
    model: &mut SkipGramModel,
    reader: &DataReader,
    config: &Config,
    options: TrainOptions,
) -> Result<TrainReport> {
    run_training_with_progress(model, reader, config, options, |event| {
        if let TrainEvent::Report(line) = event {
            info!("{}", line);
        }
    })
}

/// Trains `model` on `reader`, handing every [`TrainEvent`] to `progress`.
pub fn run_training_with_progress<F>(
    model: &mut SkipGramModel,
    reader: &DataReader,
    config: &Config,
    options: TrainOptions,
    mut progress: F,
) -> Result<TrainReport>
where
    F: FnMut(TrainEvent),
{
    let cfg = &config.skipgram;
    let vocabulary = reader.vocabulary()?;
    if vocabulary.len() != model.vocab_size() || cfg.embed_size != model.embed_size() {
        return Err(SkipGramError::ShapeMismatch {
            expected: (vocabulary.len(), cfg.embed_size),
            actual: (model.vocab_size(), model.embed_size()),
        });
    }
    if cfg.num_steps == 0 {
        return Err(SkipGramError::Config("num_steps must be > 0".to_string()));
    }

    let mut batch_rng = cfg.rng(streams::BATCHES);
    let mut sample_rng = cfg.rng(streams::SAMPLER);

    let mut summary = if options.visualization {
        let dir = new_log_dir(&config.output.log_dir)?;
        let writer = SummaryWriter::new(&dir)?;
        writer.write_config(config)?;
        progress(TrainEvent::Report(format!(
            "Scalar summaries: {}",
            dir.join(EVENTS_FILE).display()
        )));
        progress(TrainEvent::Report(format!(
            "Projector bundle: {}",
            config.output.projector_dir.display()
        )));
        Some(writer)
    } else {
        None
    };

    info!(
        "Training {} steps (batch_size={}, num_sampled={}, vocab_size={})",
        cfg.num_steps, cfg.batch_size, cfg.num_sampled, cfg.vocab_size
    );
    let start = Instant::now();

    let mut data_index = 0;
    let mut window_loss = 0.0f64;
    let mut window_steps = 0usize;
    let mut total_loss = 0.0f64;
    let mut final_loss = 0.0f32;
    let mut loss_history = Vec::new();

    for step in 0..cfg.num_steps {
        let batch = reader.batch_generator(
            cfg.batch_size,
            cfg.num_skips,
            cfg.skip_window,
            data_index,
            &mut batch_rng,
        )?;
        data_index = batch.data_index;

        let loss = model.train_step(&batch, &mut sample_rng)?;
        window_loss += loss as f64;
        window_steps += 1;
        total_loss += loss as f64;
        final_loss = loss;

        if let Some(writer) = summary.as_mut() {
            writer.add_scalar("loss", loss, step)?;
            writer.flush()?;
        }
        progress(TrainEvent::Step { step, loss });

        if step > 0 && step % cfg.show_step == 0 {
            let average = (window_loss / window_steps as f64) as f32;
            loss_history.push((step, average));
            progress(TrainEvent::Report(format_average_loss(step, average)));
            window_loss = 0.0;
            window_steps = 0;
        }

        if options.verbose && step % cfg.verbose_step == 0 {
            for line in nearest_report(model, vocabulary, config.valid_examples(), cfg.top_k)? {
                progress(TrainEvent::Report(line));
            }
        }
    }

    let elapsed = start.elapsed();
    let final_embeddings = model.normalized_embeddings();

    let projector = if options.visualization {
        Some(export_projector(
            &config.output.projector_dir,
            vocabulary,
            final_embeddings.view(),
            config.output.projector_limit,
        )?)
    } else {
        None
    };

    let mean_loss = (total_loss / cfg.num_steps as f64) as f32;
    if options.debug {
        info!("Elapsed {:.2?}, mean loss {:.4}", elapsed, mean_loss);
    } else {
        debug!("Elapsed {:.2?}, mean loss {:.4}", elapsed, mean_loss);
    }

    Ok(TrainReport {
        elapsed,
        mean_loss,
        final_loss,
        loss_history,
        final_embeddings,
        log_dir: summary.map(|writer| writer.dir().to_path_buf()),
        projector,
    })
}

/// One line per validation word listing its `top_k` nearest words.
pub fn nearest_report(
    model: &SkipGramModel,
    vocabulary: &Vocabulary,
    valid_examples: &[usize],
    top_k: usize,
) -> Result<Vec<String>> {
    let sim = model.similarity(valid_examples)?;
    let lines = valid_examples
        .iter()
        .enumerate()
        .map(|(row, &index)| {
            let neighbours: Vec<&str> = nearest(sim.row(row), top_k, Some(index))
                .into_iter()
                .map(|i| vocabulary.word(i).unwrap_or(UNK_TOKEN))
                .collect();
            format_nearest(vocabulary.word(index).unwrap_or(UNK_TOKEN), &neighbours)
        })
        .collect();
    Ok(lines)
}

/// Format the periodic average loss line.
pub fn format_average_loss(step: usize, average: f32) -> String {
    format!("Average loss at step {}: {:.4}", step, average)
}

/// Format a nearest-neighbour line, e.g. `Nearest to king: queen, prince,`.
pub fn format_nearest(word: &str, neighbours: &[&str]) -> String {
    neighbours
        .iter()
        .fold(format!("Nearest to {word}:"), |mut line, neighbour| {
            line.push(' ');
            line.push_str(neighbour);
            line.push(',');
            line
        })
}
