//! Error types for tubeq.

use thiserror::Error;

/// Library-level error type for tubeq operations.
#[derive(Error, Debug)]
pub enum TubeqError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Ingestion aborted after storing {stored} of {chunks_produced} chunks: {source}")]
    IngestAborted {
        stored: usize,
        chunks_produced: usize,
        #[source]
        source: Box<TubeqError>,
    },

    #[error("Answering agent unavailable: {0}")]
    AnswerUnavailable(String),

    #[error("Transcript source error: {0}")]
    TranscriptSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification of a [`TubeqError`].
///
/// Callers branch on the kind rather than on individual variants, e.g. to
/// tell "the store is down" apart from "nothing matched".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    EmbeddingUnavailable,
    StoreUnavailable,
    AnswerUnavailable,
    TranscriptSource,
    Other,
}

impl TubeqError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TubeqError::Config(_) | TubeqError::TomlParse(_) => ErrorKind::Configuration,
            TubeqError::EmbeddingUnavailable(_) => ErrorKind::EmbeddingUnavailable,
            TubeqError::StoreUnavailable(_)
            | TubeqError::IngestAborted { .. }
            | TubeqError::Database(_) => ErrorKind::StoreUnavailable,
            TubeqError::AnswerUnavailable(_) => ErrorKind::AnswerUnavailable,
            TubeqError::TranscriptSource(_) | TubeqError::ToolNotFound(_) => {
                ErrorKind::TranscriptSource
            }
            TubeqError::Io(_)
            | TubeqError::Json(_)
            | TubeqError::Http(_)
            | TubeqError::InvalidInput(_) => ErrorKind::Other,
        }
    }
}

/// Result type alias for tubeq operations.
pub type Result<T> = std::result::Result<T, TubeqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_aborted_is_store_kind() {
        let err = TubeqError::IngestAborted {
            stored: 3,
            chunks_produced: 10,
            source: Box::new(TubeqError::StoreUnavailable("disk full".to_string())),
        };
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(err.to_string().contains("3 of 10"));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            TubeqError::Config("overlap".to_string()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            TubeqError::EmbeddingUnavailable("quota".to_string()).kind(),
            ErrorKind::EmbeddingUnavailable
        );
        assert_eq!(
            TubeqError::InvalidInput("x".to_string()).kind(),
            ErrorKind::Other
        );
    }
}
