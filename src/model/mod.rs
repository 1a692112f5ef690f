//! Skip-gram model, candidate sampler and optimizer.

mod optimizer;
mod sampler;
mod skipgram;

pub use optimizer::{Adagrad, INITIAL_ACCUMULATOR};
pub use sampler::{LogUniformSampler, SampledCandidates};
pub use skipgram::{LossGradients, SkipGramModel};
