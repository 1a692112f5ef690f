//! Binary format for trained embeddings.
//!
//! ## Format Layout
//!
//! ```text
//! +------------------+
//! | Header (48 bytes)|
//! +------------------+
//! | Word Index Table |
//! | (6 bytes/word)   |
//! +------------------+
//! | String Pool      |
//! | (variable)       |
//! +------------------+
//! | Embedding Matrix |
//! | (f32 LE, rows)   |
//! +------------------+
//! | Config           |  (optional, if HAS_CONFIG flag set)
//! | (bincode)        |
//! +------------------+
//! ```
//!
//! ### Header (48 bytes)
//! - Magic number (4 bytes): "SGEM"
//! - Version (2 bytes)
//! - Flags (2 bytes): bit 0 = has config
//! - Vocabulary size (4 bytes)
//! - Embedding size (4 bytes)
//! - String pool offset (8 bytes)
//! - Matrix offset (8 bytes)
//! - Config offset (8 bytes)
//! - Reserved (8 bytes)
//!
//! ### Word Index Table
//! - One `(string_offset: u32, string_len: u16)` per vocabulary index, in
//!   index order.

use crate::config::Config;
use crate::data::Vocabulary;
use crate::error::{Result, SkipGramError};
use ndarray::Array2;

/// Magic number for embedding files.
const MAGIC: &[u8; 4] = b"SGEM";

/// Current format version.
const VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 48;

/// Flag indicating the file carries the training configuration.
const FLAG_HAS_CONFIG: u16 = 0x0001;

/// Embedding file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// Format version.
    pub version: u16,
    /// Flags.
    pub flags: u16,
    /// Number of vocabulary rows.
    pub vocab_size: u32,
    /// Embedding dimensionality.
    pub embed_size: u32,
    /// Offset to the string pool.
    pub string_pool_offset: u64,
    /// Offset to the embedding matrix.
    pub matrix_offset: u64,
    /// Offset to the config (end of matrix when absent).
    pub config_offset: u64,
}

impl ArtifactHeader {
    /// Creates a header with offsets left at zero.
    pub fn new(vocab_size: u32, embed_size: u32) -> Self {
        Self {
            version: VERSION,
            flags: 0,
            vocab_size,
            embed_size,
            string_pool_offset: 0,
            matrix_offset: 0,
            config_offset: 0,
        }
    }

    /// Returns true if a bincode config follows the matrix.
    pub fn has_config(&self) -> bool {
        self.flags & FLAG_HAS_CONFIG != 0
    }

    /// Offset of the word index table.
    pub fn index_offset(&self) -> u64 {
        HEADER_SIZE as u64
    }

    /// Writes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.vocab_size.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.embed_size.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.string_pool_offset.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.matrix_offset.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.config_offset.to_le_bytes());
        // Reserved (bytes 40-47)
        bytes
    }

    /// Reads a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(SkipGramError::InvalidArtifactFormat(
                "Header too short".to_string(),
            ));
        }
        if &bytes[0..4] != MAGIC {
            return Err(SkipGramError::InvalidArtifactFormat(
                "Invalid magic number".to_string(),
            ));
        }

        let version = read_u16(bytes, 4);
        if version != VERSION {
            return Err(SkipGramError::InvalidArtifactFormat(format!(
                "Unsupported version {version}"
            )));
        }

        Ok(Self {
            version,
            flags: read_u16(bytes, 6),
            vocab_size: read_u32(bytes, 8),
            embed_size: read_u32(bytes, 12),
            string_pool_offset: read_u64(bytes, 16),
            matrix_offset: read_u64(bytes, 24),
            config_offset: read_u64(bytes, 32),
        })
    }
}

/// Index entry for a word.
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// Offset into the string pool.
    string_offset: u32,
    /// Length of the word in bytes.
    string_len: u16,
}

impl IndexEntry {
    const SIZE: usize = 6;

    fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.string_offset.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.string_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            string_offset: read_u32(bytes, 0),
            string_len: read_u16(bytes, 4),
        }
    }
}

/// Decoded contents of an embedding file.
#[derive(Debug, Clone)]
pub struct DecodedArtifact {
    /// File header.
    pub header: ArtifactHeader,
    /// Vocabulary in index order.
    pub vocabulary: Vocabulary,
    /// Embedding matrix, one row per vocabulary entry.
    pub embeddings: Array2<f32>,
    /// Training configuration, if stored.
    pub config: Option<Config>,
}

/// Binary format reader/writer for embedding files.
pub struct EmbeddingFormat;

impl EmbeddingFormat {
    /// Encodes an artifact into bytes.
    pub fn encode(
        vocabulary: &Vocabulary,
        embeddings: &Array2<f32>,
        config: Option<&Config>,
    ) -> Result<Vec<u8>> {
        let (rows, cols) = embeddings.dim();
        if rows != vocabulary.len() {
            return Err(SkipGramError::ShapeMismatch {
                expected: (vocabulary.len(), cols),
                actual: (rows, cols),
            });
        }
        let vocab_size = to_u32(rows, "vocab_size")?;
        let embed_size = to_u32(cols, "embed_size")?;

        let mut entries = Vec::with_capacity(rows);
        let mut string_pool = Vec::new();
        for word in vocabulary.index2word() {
            let string_len = u16::try_from(word.len()).map_err(|_| {
                SkipGramError::InvalidArtifactFormat(format!("word too long: {} bytes", word.len()))
            })?;
            let string_offset = to_u32(string_pool.len(), "string pool")?;
            string_pool.extend_from_slice(word.as_bytes());
            entries.push(IndexEntry {
                string_offset,
                string_len,
            });
        }

        let config_bytes = match config {
            Some(config) => Some(bincode::serialize(config)?),
            None => None,
        };

        let mut header = ArtifactHeader::new(vocab_size, embed_size);
        header.string_pool_offset = header.index_offset() + (rows * IndexEntry::SIZE) as u64;
        header.matrix_offset = header.string_pool_offset + string_pool.len() as u64;
        header.config_offset = header.matrix_offset + (rows * cols * 4) as u64;
        if config_bytes.is_some() {
            header.flags |= FLAG_HAS_CONFIG;
        }

        let total = header.config_offset as usize + config_bytes.as_ref().map_or(0, Vec::len);
        let mut bytes = Vec::with_capacity(total);

        // Write header
        bytes.extend_from_slice(&header.to_bytes());

        // Write index
        for entry in &entries {
            bytes.extend_from_slice(&entry.to_bytes());
        }

        // Write string pool
        bytes.extend_from_slice(&string_pool);

        // Write matrix, row-major regardless of memory layout
        for value in embeddings.iter() {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        if let Some(config_bytes) = config_bytes {
            bytes.extend_from_slice(&config_bytes);
        }

        Ok(bytes)
    }

    /// Decodes bytes written by [`EmbeddingFormat::encode`].
    pub fn decode(bytes: &[u8]) -> Result<DecodedArtifact> {
        let header = ArtifactHeader::from_bytes(bytes)?;
        let rows = header.vocab_size as usize;
        let cols = header.embed_size as usize;

        let inconsistent =
            || SkipGramError::InvalidArtifactFormat("Inconsistent section offsets".to_string());

        let index_end = rows
            .checked_mul(IndexEntry::SIZE)
            .and_then(|n| n.checked_add(header.index_offset() as usize))
            .ok_or_else(inconsistent)?;
        let pool_start = header.string_pool_offset as usize;
        let matrix_start = header.matrix_offset as usize;
        let config_start = header.config_offset as usize;
        let matrix_end = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| matrix_start.checked_add(n))
            .ok_or_else(inconsistent)?;

        if pool_start != index_end
            || matrix_start < pool_start
            || config_start != matrix_end
            || config_start > bytes.len()
        {
            return Err(inconsistent());
        }

        // Read index and string pool
        let string_pool = &bytes[pool_start..matrix_start];
        let mut index2word = Vec::with_capacity(rows);
        for chunk in bytes[HEADER_SIZE..index_end].chunks_exact(IndexEntry::SIZE) {
            let entry = IndexEntry::from_bytes(chunk);
            let start = entry.string_offset as usize;
            let end = start + entry.string_len as usize;
            let raw = string_pool.get(start..end).ok_or_else(|| {
                SkipGramError::InvalidArtifactFormat("Word outside string pool".to_string())
            })?;
            let word = std::str::from_utf8(raw)
                .map_err(|e| SkipGramError::InvalidArtifactFormat(e.to_string()))?;
            index2word.push(word.to_string());
        }
        let vocabulary = Vocabulary::from_index2word(index2word)?;

        // Read matrix
        let values: Vec<f32> = bytes[matrix_start..config_start]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let embeddings = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| SkipGramError::InvalidArtifactFormat(e.to_string()))?;

        // Read config if present
        let config = if header.has_config() {
            Some(bincode::deserialize(&bytes[config_start..])?)
        } else {
            None
        };

        Ok(DecodedArtifact {
            header,
            vocabulary,
            embeddings,
            config,
        })
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| SkipGramError::InvalidArtifactFormat(format!("{what} too large: {value}")))
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn sample_vocab() -> Vocabulary {
        Vocabulary::from_index2word(vec!["UNK".into(), "the".into(), "café".into()]).unwrap()
    }

    #[test]
    fn test_header_bytes() {
        let mut header = ArtifactHeader::new(3, 2);
        header.string_pool_offset = 66;
        header.flags = FLAG_HAS_CONFIG;
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..4], b"SGEM");
        assert_eq!(ArtifactHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_bad_magic_and_version() {
        let mut bytes = ArtifactHeader::new(1, 1).to_bytes();
        bytes[0] = b'X';
        assert!(ArtifactHeader::from_bytes(&bytes).is_err());

        let mut bytes = ArtifactHeader::new(1, 1).to_bytes();
        bytes[4..6].copy_from_slice(&9u16.to_le_bytes());
        assert!(ArtifactHeader::from_bytes(&bytes).is_err());

        assert!(ArtifactHeader::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_decode_preserves_words_and_matrix() {
        let vocab = sample_vocab();
        let matrix = arr2(&[[0.0f32, 1.0], [0.5, -0.5], [2.0, 3.0]]);
        let bytes = EmbeddingFormat::encode(&vocab, &matrix, None).unwrap();
        let decoded = EmbeddingFormat::decode(&bytes).unwrap();

        assert_eq!(decoded.vocabulary.index2word(), vocab.index2word());
        assert_eq!(decoded.embeddings, matrix);
        assert!(decoded.config.is_none());
        assert!(!decoded.header.has_config());
    }

    #[test]
    fn test_transposed_matrix_written_row_major() {
        let vocab = sample_vocab();
        let stored = arr2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let matrix = stored.t().to_owned();
        let bytes = EmbeddingFormat::encode(&vocab, &matrix, None).unwrap();
        let decoded = EmbeddingFormat::decode(&bytes).unwrap();
        assert_eq!(decoded.embeddings.row(0).to_vec(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_encode_rejects_row_mismatch() {
        let vocab = sample_vocab();
        let matrix = Array2::<f32>::zeros((2, 4));
        assert!(matches!(
            EmbeddingFormat::encode(&vocab, &matrix, None),
            Err(SkipGramError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_file() {
        let vocab = sample_vocab();
        let matrix = Array2::<f32>::ones((3, 4));
        let bytes = EmbeddingFormat::encode(&vocab, &matrix, None).unwrap();
        assert!(EmbeddingFormat::decode(&bytes[..bytes.len() - 5]).is_err());
    }

    #[test]
    fn test_decode_rejects_oversized_dimensions() {
        let mut header = ArtifactHeader::new(u32::MAX, u32::MAX);
        let index_end = HEADER_SIZE as u64 + u64::from(u32::MAX) * IndexEntry::SIZE as u64;
        header.string_pool_offset = index_end;
        header.matrix_offset = index_end;
        header.config_offset = 0;
        let bytes = header.to_bytes();

        assert!(matches!(
            EmbeddingFormat::decode(&bytes),
            Err(SkipGramError::InvalidArtifactFormat(_))
        ));
    }
}
