//! Export for the TensorBoard embedding projector.
//!
//! The projector reads a tab-separated tensor, a metadata file with one label
//! per row and a small text-proto config linking the two.

use crate::data::Vocabulary;
use crate::error::{Result, SkipGramError};
use log::info;
use ndarray::ArrayView2;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Tensor name used in the projector config.
pub const TENSOR_NAME: &str = "embedding";

/// Config file name.
pub const CONFIG_FILE: &str = "projector_config.pbtxt";

/// Files written by [`export_projector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorFiles {
    /// Word labels, one per line.
    pub metadata: PathBuf,
    /// Tab-separated embedding rows.
    pub tensor: PathBuf,
    /// Projector config.
    pub config: PathBuf,
    /// Number of exported rows.
    pub rows: usize,
}

/// Writes the first `limit` embedding rows and their labels into `dir`.
pub fn export_projector<P: AsRef<Path>>(
    dir: P,
    vocabulary: &Vocabulary,
    embeddings: ArrayView2<f32>,
    limit: usize,
) -> Result<ProjectorFiles> {
    let dir = dir.as_ref();
    if embeddings.nrows() != vocabulary.len() {
        return Err(SkipGramError::ShapeMismatch {
            expected: (vocabulary.len(), embeddings.ncols()),
            actual: embeddings.dim(),
        });
    }
    fs::create_dir_all(dir)?;

    let rows = limit.min(vocabulary.len());
    let metadata = dir.join(format!("vocab_{limit}.tsv"));
    let tensor = dir.join(format!("embeddings_{limit}.tsv"));
    let config = dir.join(CONFIG_FILE);

    vocabulary.write_metadata_tsv(&metadata, rows)?;

    let mut writer = BufWriter::new(File::create(&tensor)?);
    for row in embeddings.rows().into_iter().take(rows) {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", line.join("\t"))?;
    }
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(&config)?);
    writeln!(writer, "embeddings {{")?;
    writeln!(writer, "  tensor_name: \"{TENSOR_NAME}\"")?;
    writeln!(writer, "  tensor_path: \"{}\"", file_name(&tensor))?;
    writeln!(writer, "  metadata_path: \"{}\"", file_name(&metadata))?;
    writeln!(writer, "}}")?;
    writer.flush()?;

    info!("Exported {} rows for the projector to {}", rows, dir.display());
    Ok(ProjectorFiles {
        metadata,
        tensor,
        config,
        rows,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use tempfile::tempdir;

    #[test]
    fn test_export_projector() {
        let dir = tempdir().unwrap();
        let vocab = Vocabulary::from_index2word(vec!["UNK".into(), "a".into(), "b".into()]).unwrap();
        let matrix = arr2(&[[0.0f32, 1.0], [0.5, 0.5], [1.0, 0.0]]);

        let files = export_projector(dir.path(), &vocab, matrix.view(), 2).unwrap();
        assert_eq!(files.rows, 2);
        assert!(files.metadata.ends_with("vocab_2.tsv"));

        let labels = fs::read_to_string(&files.metadata).unwrap();
        assert_eq!(labels.lines().collect::<Vec<_>>(), vec!["UNK", "a"]);

        let tensor = fs::read_to_string(&files.tensor).unwrap();
        let lines: Vec<&str> = tensor.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "0.5\t0.5");

        let config = fs::read_to_string(&files.config).unwrap();
        assert!(config.contains("tensor_name: \"embedding\""));
        assert!(config.contains("metadata_path: \"vocab_2.tsv\""));
    }

    #[test]
    fn test_limit_larger_than_vocabulary() {
        let dir = tempdir().unwrap();
        let vocab = Vocabulary::from_index2word(vec!["UNK".into(), "a".into()]).unwrap();
        let matrix = arr2(&[[1.0f32], [2.0]]);

        let files = export_projector(dir.path(), &vocab, matrix.view(), 1000).unwrap();
        assert_eq!(files.rows, 2);
        assert!(files.tensor.ends_with("embeddings_1000.tsv"));
    }
}
