//! OpenAI-compatible client construction.
//!
//! Embeddings and chat both go through `async-openai`, pointed at whichever
//! OpenAI-compatible endpoint the settings name (OpenAI, Together, Groq, ...).

use crate::error::{Result, TubeqError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Connection parameters for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Base URL, e.g. `https://api.together.xyz/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// Create a client for the given endpoint with its timeout applied.
pub fn create_client(endpoint: &EndpointConfig) -> Result<Client<OpenAIConfig>> {
    if endpoint.api_key.trim().is_empty() {
        return Err(TubeqError::Config(format!(
            "missing API key for {}",
            endpoint.base_url
        )));
    }

    let http_client = reqwest::Client::builder()
        .timeout(endpoint.timeout)
        .build()
        .map_err(|e| TubeqError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(endpoint.base_url.trim_end_matches('/'))
        .with_api_key(endpoint.api_key.trim());

    Ok(Client::with_config(config).with_http_client(http_client))
}
