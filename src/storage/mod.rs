//! Storage module for trained embeddings and projector exports.

mod artifact;
mod format;
mod projector;

pub use artifact::{artifact_path, EmbeddingArtifact, ARTIFACT_EXTENSION};
pub use format::{ArtifactHeader, DecodedArtifact, EmbeddingFormat, HEADER_SIZE};
pub use projector::{export_projector, ProjectorFiles, CONFIG_FILE, TENSOR_NAME};
