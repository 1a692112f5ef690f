//! Text processing module for normalization and tokenization.

mod normalizer;
mod tokenizer;

pub use normalizer::Normalizer;
pub use tokenizer::Tokenizer;
