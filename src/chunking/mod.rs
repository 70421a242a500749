//! Transcript chunking.
//!
//! Splits arbitrary-length text into overlapping, bounded-size windows. The
//! boundaries are purely positional: a split may land mid-word.

mod window;

pub use window::{chunk_text, TextChunker};

use crate::error::{Result, TubeqError};
use serde::{Deserialize, Serialize};

/// A contiguous slice of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Text content of this chunk.
    pub text: String,
    /// Start offset in characters (inclusive).
    pub start_offset: usize,
    /// End offset in characters (exclusive).
    pub end_offset: usize,
    /// Order of this chunk in its source text.
    pub order: usize,
}

impl TranscriptChunk {
    /// Length of this chunk in characters.
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

/// Window parameters for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1500,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Create a validated chunking config.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        let config = Self { max_chars, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters for which the cursor would never advance.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(TubeqError::Config(
                "chunking.max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.max_chars {
            return Err(TubeqError::Config(format!(
                "chunking.overlap ({}) must be less than chunking.max_chars ({})",
                self.overlap, self.max_chars
            )));
        }
        Ok(())
    }

    /// Distance the cursor advances between chunks.
    pub fn stride(&self) -> usize {
        self.max_chars - self.overlap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChunkingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stride(), 1450);
    }

    #[test]
    fn test_overlap_equal_to_max_is_rejected() {
        let err = ChunkingConfig::new(10, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_max_chars_is_rejected() {
        let err = ChunkingConfig::new(0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
