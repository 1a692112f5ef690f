//! Corpus reading, vocabulary construction and batch generation.

mod reader;
mod vocabulary;

pub use reader::{Batch, DataReader};
pub use vocabulary::{Vocabulary, UNK_INDEX, UNK_TOKEN};
