//! Skip-gram model trained with sampled softmax.
//!
//! Each center word looks up its row of the embedding matrix and tries to
//! predict one context word. Instead of normalising over the whole
//! vocabulary, every batch shares a small set of negative classes drawn from
//! a [`LogUniformSampler`]; logits are corrected by the log expected count of
//! their class so the estimate stays unbiased for frequent words.

use crate::config::{streams, SkipGramConfig};
use crate::data::Batch;
use crate::error::{Result, SkipGramError};
use crate::model::optimizer::{Adagrad, INITIAL_ACCUMULATOR};
use crate::model::sampler::{LogUniformSampler, SampledCandidates};
use crate::similarity::l2_normalize_rows;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;

/// Loss of one batch and the gradients of the rows it touched.
///
/// Rows that appear several times in a batch have their gradients summed.
#[derive(Debug, Clone, Default)]
pub struct LossGradients {
    /// Mean cross-entropy over the batch.
    pub loss: f32,
    /// Embedding row gradients, keyed by vocabulary index.
    pub embeddings: BTreeMap<usize, Array1<f32>>,
    /// Softmax weight row gradients.
    pub weights: BTreeMap<usize, Array1<f32>>,
    /// Softmax bias gradients.
    pub biases: BTreeMap<usize, f32>,
}

/// Skip-gram embedding model.
#[derive(Debug, Clone)]
pub struct SkipGramModel {
    num_sampled: usize,
    embeddings: Array2<f32>,
    weights: Array2<f32>,
    biases: Array1<f32>,
    embed_accum: Array2<f32>,
    weight_accum: Array2<f32>,
    bias_accum: Array1<f32>,
    optimizer: Adagrad,
    sampler: LogUniformSampler,
}

impl SkipGramModel {
    /// Creates a freshly initialised model.
    ///
    /// Embeddings are uniform in `[-1, 1)`. Softmax weights follow a normal
    /// distribution with standard deviation `1 / sqrt(embed_size)`, truncated
    /// at two deviations. Biases start at zero.
    pub fn new(config: &SkipGramConfig) -> Result<Self> {
        config.validate()?;
        let shape = (config.vocab_size, config.embed_size);
        let mut rng = config.rng(streams::INIT);

        let embeddings = Array2::from_shape_fn(shape, |_| rng.gen_range(-1.0f32..1.0));

        let std = 1.0 / (config.embed_size as f32).sqrt();
        let normal = Normal::new(0.0f32, std).map_err(|e| SkipGramError::Config(e.to_string()))?;
        let weights = Array2::from_shape_fn(shape, |_| truncated_sample(&normal, 2.0 * std, &mut rng));
        let biases = Array1::zeros(config.vocab_size);

        debug!(
            "Initialised skip-gram model: vocab_size={}, embed_size={}",
            config.vocab_size, config.embed_size
        );
        Self::with_parameters(
            embeddings,
            weights,
            biases,
            config.num_sampled,
            config.learning_rate,
        )
    }

    /// Creates a model from existing parameters.
    pub fn with_parameters(
        embeddings: Array2<f32>,
        weights: Array2<f32>,
        biases: Array1<f32>,
        num_sampled: usize,
        learning_rate: f32,
    ) -> Result<Self> {
        let shape = embeddings.dim();
        if weights.dim() != shape {
            return Err(SkipGramError::ShapeMismatch {
                expected: shape,
                actual: weights.dim(),
            });
        }
        if biases.len() != shape.0 {
            return Err(SkipGramError::ShapeMismatch {
                expected: (shape.0, 1),
                actual: (biases.len(), 1),
            });
        }
        if num_sampled == 0 || num_sampled >= shape.0 {
            return Err(SkipGramError::Config(format!(
                "num_sampled ({num_sampled}) must be in 1..{}",
                shape.0
            )));
        }

        Ok(Self {
            num_sampled,
            embed_accum: Array2::from_elem(shape, INITIAL_ACCUMULATOR),
            weight_accum: Array2::from_elem(shape, INITIAL_ACCUMULATOR),
            bias_accum: Array1::from_elem(shape.0, INITIAL_ACCUMULATOR),
            optimizer: Adagrad::new(learning_rate),
            sampler: LogUniformSampler::new(shape.0),
            embeddings,
            weights,
            biases,
        })
    }

    /// Number of vocabulary rows.
    pub fn vocab_size(&self) -> usize {
        self.embeddings.nrows()
    }

    /// Embedding dimensionality.
    pub fn embed_size(&self) -> usize {
        self.embeddings.ncols()
    }

    /// Negative classes drawn per batch.
    pub fn num_sampled(&self) -> usize {
        self.num_sampled
    }

    /// Raw embedding matrix.
    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    /// Softmax weight matrix.
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Softmax biases.
    pub fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    /// Consumes the model and returns the embedding matrix.
    pub fn into_embeddings(self) -> Array2<f32> {
        self.embeddings
    }

    /// Embedding rows for a batch of center words.
    pub fn embed(&self, centers: &[usize]) -> Result<Array2<f32>> {
        self.check_indices(centers)?;
        Ok(self.embeddings.select(Axis(0), centers))
    }

    /// Sampled softmax loss and gradients for `batch`.
    pub fn sampled_softmax_loss<R: Rng + ?Sized>(&self, batch: &Batch, rng: &mut R) -> Result<LossGradients> {
        let sampled = self.sampler.sample_unique(self.num_sampled, rng)?;
        self.loss_and_gradients(batch, &sampled)
    }

    /// Sampled softmax loss and gradients against fixed candidates.
    ///
    /// A candidate equal to a pair's true class is masked out of that pair's
    /// softmax.
    pub fn loss_and_gradients(&self, batch: &Batch, sampled: &SampledCandidates) -> Result<LossGradients> {
        check_batch(batch)?;
        self.check_indices(&batch.centers)?;
        self.check_indices(&batch.targets)?;
        self.check_indices(&sampled.candidates)?;

        let embed_size = self.embed_size();
        let tries = sampled.num_tries.max(1);
        let log_q = |k: usize| (self.sampler.expected_count(k, tries).max(f64::MIN_POSITIVE)).ln() as f32;
        let candidate_log_q: Vec<f32> = sampled.candidates.iter().map(|&k| log_q(k)).collect();
        let scale = 1.0 / batch.len() as f32;

        let mut grads = LossGradients::default();
        let mut total_loss = 0.0f64;
        let mut logits = vec![0.0f32; sampled.candidates.len() + 1];
        let mut classes = Vec::with_capacity(logits.len());

        for (center, target) in batch.pairs() {
            let e = self.embeddings.row(center);

            classes.clear();
            classes.push(target);
            classes.extend_from_slice(&sampled.candidates);

            logits[0] = self.weights.row(target).dot(&e) + self.biases[target] - log_q(target);
            for (j, &k) in sampled.candidates.iter().enumerate() {
                logits[j + 1] = if k == target {
                    f32::NEG_INFINITY
                } else {
                    self.weights.row(k).dot(&e) + self.biases[k] - candidate_log_q[j]
                };
            }

            let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let true_shifted = logits[0] - max;
            let mut sum = 0.0f32;
            for l in logits.iter_mut() {
                *l = (*l - max).exp();
                sum += *l;
            }
            total_loss += (sum.ln() - true_shifted) as f64;

            let mut grad_e = Array1::<f32>::zeros(embed_size);
            for (j, &class) in classes.iter().enumerate() {
                let p = logits[j] / sum;
                let g = (if j == 0 { p - 1.0 } else { p }) * scale;
                if g == 0.0 {
                    continue;
                }
                grad_e.scaled_add(g, &self.weights.row(class));
                grads
                    .weights
                    .entry(class)
                    .or_insert_with(|| Array1::zeros(embed_size))
                    .scaled_add(g, &e);
                *grads.biases.entry(class).or_insert(0.0) += g;
            }
            *grads
                .embeddings
                .entry(center)
                .or_insert_with(|| Array1::zeros(embed_size)) += &grad_e;
        }

        grads.loss = (total_loss / batch.len() as f64) as f32;
        Ok(grads)
    }

    /// Applies one Adagrad update to the rows in `grads`.
    pub fn apply_gradients(&mut self, grads: &LossGradients) {
        for (&row, grad) in &grads.embeddings {
            self.optimizer.update_row(
                self.embeddings.row_mut(row),
                self.embed_accum.row_mut(row),
                grad.view(),
            );
        }
        for (&row, grad) in &grads.weights {
            self.optimizer.update_row(
                self.weights.row_mut(row),
                self.weight_accum.row_mut(row),
                grad.view(),
            );
        }
        for (&row, &grad) in &grads.biases {
            self.optimizer
                .update_scalar(&mut self.biases[row], &mut self.bias_accum[row], grad);
        }
    }

    /// Runs one optimisation step and returns the batch loss.
    pub fn train_step<R: Rng + ?Sized>(&mut self, batch: &Batch, rng: &mut R) -> Result<f32> {
        let grads = self.sampled_softmax_loss(batch, rng)?;
        if !grads.loss.is_finite() {
            return Err(SkipGramError::Training(format!(
                "loss diverged: {}",
                grads.loss
            )));
        }
        self.apply_gradients(&grads);
        Ok(grads.loss)
    }

    /// Sampled softmax loss of `batch` without updating the model.
    pub fn loss<R: Rng + ?Sized>(&self, batch: &Batch, rng: &mut R) -> Result<f32> {
        Ok(self.sampled_softmax_loss(batch, rng)?.loss)
    }

    /// Exact softmax cross-entropy over the whole vocabulary.
    pub fn full_softmax_loss(&self, batch: &Batch) -> Result<f32> {
        check_batch(batch)?;
        self.check_indices(&batch.targets)?;
        let logits = self.embed(&batch.centers)?.dot(&self.weights.t()) + &self.biases;

        let total: f32 = logits
            .axis_iter(Axis(0))
            .zip(batch.targets.iter())
            .map(|(row, &target)| {
                let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
                let lse = row.fold(0.0f32, |s, &x| s + (x - max).exp()).ln() + max;
                lse - row[target]
            })
            .sum();
        Ok(total / batch.len() as f32)
    }

    /// Embeddings scaled to unit length.
    pub fn normalized_embeddings(&self) -> Array2<f32> {
        l2_normalize_rows(self.embeddings.view())
    }

    /// Cosine similarity of each `valid` word against the whole vocabulary.
    ///
    /// Returns a `(valid.len(), vocab_size)` matrix.
    pub fn similarity(&self, valid: &[usize]) -> Result<Array2<f32>> {
        self.check_indices(valid)?;
        let normalized = self.normalized_embeddings();
        let queries = normalized.select(Axis(0), valid);
        Ok(queries.dot(&normalized.t()))
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        let max = self.vocab_size();
        match indices.iter().find(|&&i| i >= max) {
            Some(&index) => Err(SkipGramError::IndexOutOfBounds { index, max }),
            None => Ok(()),
        }
    }
}

/// Rejects empty batches and batches whose labels do not line up with their centers.
fn check_batch(batch: &Batch) -> Result<()> {
    if batch.is_empty() {
        return Err(SkipGramError::Training("empty batch".to_string()));
    }
    if batch.centers.len() != batch.targets.len() {
        return Err(SkipGramError::ShapeMismatch {
            expected: (batch.centers.len(), 1),
            actual: (batch.targets.len(), 1),
        });
    }
    Ok(())
}

/// Draws from `normal`, rejecting samples farther than `bound` from zero.
fn truncated_sample<R: Rng + ?Sized>(normal: &Normal<f32>, bound: f32, rng: &mut R) -> f32 {
    loop {
        let x = normal.sample(rng);
        if x.abs() <= bound {
            return x;
        }
    }
}
