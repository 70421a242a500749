//! OpenAI-compatible embeddings implementation.

use super::Embedder;
use crate::error::{Result, TubeqError};
use crate::openai::{create_client, EndpointConfig};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    send_dimensions: bool,
    batch_size: usize,
}

impl OpenAIEmbedder {
    /// Create a new embedder for `model` producing `dimensions`-long vectors.
    pub fn new(endpoint: &EndpointConfig, model: &str, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(TubeqError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            client: create_client(endpoint)?,
            model: model.to_string(),
            dimensions,
            send_dimensions: false,
            batch_size: 100,
        })
    }

    /// Ask the endpoint for `dimensions`-long vectors explicitly.
    ///
    /// Only OpenAI's `text-embedding-3-*` models accept the parameter.
    pub fn with_send_dimensions(mut self, send: bool) -> Self {
        self.send_dimensions = send;
        self
    }

    /// Set the maximum number of inputs per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TubeqError::EmbeddingUnavailable("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let mut args = CreateEmbeddingRequestArgs::default();
            args.model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()));
            if self.send_dimensions {
                args.dimensions(self.dimensions as u32);
            }
            let request = args.build().map_err(|e| {
                TubeqError::EmbeddingUnavailable(format!("Failed to build request: {}", e))
            })?;

            let response = self.client.embeddings().create(request).await.map_err(|e| {
                TubeqError::EmbeddingUnavailable(format!("Embedding API error: {}", e))
            })?;

            if response.data.len() != chunk.len() {
                return Err(TubeqError::EmbeddingUnavailable(format!(
                    "Endpoint returned {} embeddings for {} inputs",
                    response.data.len(),
                    chunk.len()
                )));
            }

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            all_embeddings.extend(embeddings.into_iter().map(|e| e.embedding));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
