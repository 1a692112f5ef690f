//! Log-uniform (Zipfian) candidate sampling.
//!
//! Vocabulary indices are frequency ranked, so a log-uniform distribution
//! over indices approximates the unigram distribution without needing the
//! counts:
//!
//! ```text
//! P(k) = (ln(k + 2) - ln(k + 1)) / ln(range + 1)
//! ```

use crate::error::{Result, SkipGramError};
use rand::Rng;

/// Negative candidates drawn for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCandidates {
    /// Distinct candidate classes.
    pub candidates: Vec<usize>,
    /// Draws needed to collect them.
    pub num_tries: usize,
}

/// Sampler over `0..range` with log-uniform probabilities.
#[derive(Debug, Clone)]
pub struct LogUniformSampler {
    range: usize,
    log_range: f64,
}

impl LogUniformSampler {
    /// Creates a sampler over `0..range`.
    pub fn new(range: usize) -> Self {
        Self {
            range,
            log_range: ((range + 1) as f64).ln(),
        }
    }

    /// Number of classes.
    pub fn range(&self) -> usize {
        self.range
    }

    /// Probability of drawing class `k` in a single draw.
    #[inline]
    pub fn probability(&self, k: usize) -> f64 {
        (1.0 / (k as f64 + 1.0)).ln_1p() / self.log_range
    }

    /// Draws a single class.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.gen();
        let k = ((u * self.log_range).exp() as usize).saturating_sub(1);
        k.min(self.range - 1)
    }

    /// Draws until `n` distinct classes have been seen.
    pub fn sample_unique<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<SampledCandidates> {
        if n >= self.range {
            return Err(SkipGramError::Config(format!(
                "cannot draw {n} distinct candidates from {} classes",
                self.range
            )));
        }

        let mut seen = vec![false; self.range];
        let mut candidates = Vec::with_capacity(n);
        let mut num_tries = 0;
        while candidates.len() < n {
            let k = self.sample(rng);
            num_tries += 1;
            if !seen[k] {
                seen[k] = true;
                candidates.push(k);
            }
        }
        Ok(SampledCandidates {
            candidates,
            num_tries,
        })
    }

    /// Expected number of times class `k` shows up in `num_tries` draws,
    /// counted at most once.
    #[inline]
    pub fn expected_count(&self, k: usize, num_tries: usize) -> f64 {
        let p = self.probability(k);
        -(num_tries as f64 * (-p).ln_1p()).exp_m1()
    }
}
