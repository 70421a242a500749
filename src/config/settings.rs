//! Configuration settings for tubeq.

use crate::chunking::ChunkingConfig;
use crate::error::{Result, TubeqError};
use crate::openai::EndpointConfig;
use crate::transcript_source::YoutubeSourceConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub answer: AnswerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubeq".to_string(),
        }
    }
}

/// YouTube search and transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to `api_key_env`, then to yt-dlp search.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Videos to fetch per search.
    pub max_results: usize,
    /// Transcript language.
    pub language: String,
    /// Path to the yt-dlp executable.
    pub ytdlp_path: String,
    /// Timeout for each search, metadata or caption request.
    pub timeout_secs: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "YOUTUBE_API_KEY".to_string(),
            max_results: 5,
            language: "en".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Embedding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// OpenAI-compatible base URL.
    pub base_url: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// Send `dimensions` with each request (OpenAI text-embedding-3 only).
    pub send_dimensions: bool,
    /// API key. Falls back to `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Concurrent embedding requests during ingestion.
    pub max_concurrent: usize,
    /// Maximum inputs per batch request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.together.xyz/v1".to_string(),
            model: "togethercomputer/m2-bert-80M-8k-retrieval".to_string(),
            dimensions: 768,
            send_dimensions: false,
            api_key: None,
            api_key_env: "TOGETHER_API_KEY".to_string(),
            timeout_secs: 60,
            max_concurrent: 4,
            batch_size: 100,
        }
    }
}

/// Chunking window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        let defaults = ChunkingConfig::default();
        Self {
            max_chars: defaults.max_chars,
            overlap: defaults.overlap,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Records written per insert call during ingestion.
    pub insert_batch_size: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.tubeq/vectors.db".to_string(),
            insert_batch_size: 32,
        }
    }
}

/// Query-path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks to retrieve.
    pub top_k: usize,
    /// Minimum cosine similarity (0.0-1.0).
    pub similarity_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.8,
        }
    }
}

/// Answering model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// OpenAI-compatible base URL.
    pub base_url: String,
    /// Chat model.
    pub model: String,
    /// API key. Falls back to `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Explicit key first, then the named environment variable.
fn resolve_key(explicit: &Option<String>, env_var: &str) -> Option<String> {
    explicit
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the pipeline cannot run with. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        self.chunking_config().validate()?;

        if self.retrieval.top_k == 0 {
            return Err(TubeqError::Config(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(TubeqError::Config(format!(
                "retrieval.similarity_threshold must be within [0, 1], got {}",
                self.retrieval.similarity_threshold
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(TubeqError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.embedding.max_concurrent == 0
            || self.embedding.batch_size == 0
            || self.vector_store.insert_batch_size == 0
        {
            return Err(TubeqError::Config(
                "embedding.max_concurrent, embedding.batch_size and vector_store.insert_batch_size \
                 must be greater than zero"
                    .to_string(),
            ));
        }
        match self.vector_store.provider.as_str() {
            "sqlite" | "memory" => Ok(()),
            other => Err(TubeqError::Config(format!(
                "Unknown vector store provider: {}",
                other
            ))),
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubeqError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubeq")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    pub fn chunking_config(&self) -> ChunkingConfig {
        ChunkingConfig {
            max_chars: self.chunking.max_chars,
            overlap: self.chunking.overlap,
        }
    }

    /// Resolved YouTube Data API key, if any.
    pub fn youtube_api_key(&self) -> Option<String> {
        resolve_key(&self.youtube.api_key, &self.youtube.api_key_env)
    }

    pub fn youtube_source_config(&self) -> YoutubeSourceConfig {
        YoutubeSourceConfig {
            api_key: self.youtube_api_key(),
            max_results: self.youtube.max_results,
            language: self.youtube.language.clone(),
            ytdlp_path: self.youtube.ytdlp_path.clone(),
            timeout: Duration::from_secs(self.youtube.timeout_secs),
        }
    }

    /// Endpoint for the embedding API. Fails if no key can be resolved.
    pub fn embedding_endpoint(&self) -> Result<EndpointConfig> {
        let api_key = resolve_key(&self.embedding.api_key, &self.embedding.api_key_env)
            .ok_or_else(|| {
                TubeqError::Config(format!(
                    "No embedding API key. Set embedding.api_key or export {}",
                    self.embedding.api_key_env
                ))
            })?;

        Ok(EndpointConfig {
            base_url: self.embedding.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(self.embedding.timeout_secs),
        })
    }

    /// Endpoint for the chat API. Fails if no key can be resolved.
    pub fn answer_endpoint(&self) -> Result<EndpointConfig> {
        let api_key = resolve_key(&self.answer.api_key, &self.answer.api_key_env).ok_or_else(
            || {
                TubeqError::Config(format!(
                    "No answer API key. Set answer.api_key or export {}",
                    self.answer.api_key_env
                ))
            },
        )?;

        Ok(EndpointConfig {
            base_url: self.answer.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(self.answer.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunking.max_chars, 1500);
        assert_eq!(settings.chunking.overlap, 50);
        assert_eq!(settings.retrieval.top_k, 5);
        assert!((settings.retrieval.similarity_threshold - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chunking]
            max_chars = 400

            [retrieval]
            top_k = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.chunking.max_chars, 400);
        assert_eq!(settings.chunking.overlap, 50);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.embedding.dimensions, 768);
    }

    #[test]
    fn test_invalid_chunking_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nmax_chars = 10\noverlap = 10\n").unwrap();

        let err = Settings::load_from(Some(&path)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.similarity_threshold = 1.5;
        assert!(settings.validate().is_err());

        settings.retrieval.similarity_threshold = 0.5;
        settings.retrieval.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "pinecone".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_explicit_key_wins_over_env() {
        let mut settings = Settings::default();
        settings.embedding.api_key = Some("explicit".to_string());
        settings.embedding.api_key_env = "TUBEQ_TEST_UNSET_EMBEDDING_KEY".to_string();
        assert_eq!(settings.embedding_endpoint().unwrap().api_key, "explicit");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let mut settings = Settings::default();
        settings.answer.api_key = None;
        settings.answer.api_key_env = "TUBEQ_TEST_UNSET_ANSWER_KEY".to_string();
        let err = settings.answer_endpoint().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubeq").join("config.toml");

        let mut settings = Settings::default();
        settings.youtube.max_results = 12;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.youtube.max_results, 12);
    }
}
