//! Orchestrator for tubeq.
//!
//! Wires settings into concrete collaborators and runs the end-to-end flows:
//! topic search to stored chunks, and question to grounded answer.

use crate::answer::{AnsweringAgent, OpenAIAnswerer};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubeqError};
use crate::pipeline::{IngestReport, RetrievalConfig, RetrievalPipeline};
use crate::rag::{RagEngine, RagResponse};
use crate::transcript_source::{TranscriptBatch, TranscriptSource, YoutubeSource};
use crate::vector_store::{
    MemoryVectorStore, ScoredChunk, SqliteVectorStore, TopicStats, VectorStore,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for tubeq.
pub struct Orchestrator {
    settings: Settings,
    source: Arc<dyn TranscriptSource>,
    store: Arc<dyn VectorStore>,
    pipeline: Arc<RetrievalPipeline>,
    agent: Option<Arc<dyn AnsweringAgent>>,
}

impl Orchestrator {
    /// Build every collaborator from `settings`.
    ///
    /// The answering agent is created on first use, so ingestion works
    /// without a chat API key.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let source: Arc<dyn TranscriptSource> =
            Arc::new(YoutubeSource::new(settings.youtube_source_config())?);

        let embedder: Arc<dyn Embedder> = Arc::new(
            OpenAIEmbedder::new(
                &settings.embedding_endpoint()?,
                &settings.embedding.model,
                settings.embedding.dimensions,
            )?
            .with_send_dimensions(settings.embedding.send_dimensions)
            .with_batch_size(settings.embedding.batch_size),
        );

        let store = create_store(&settings)?;

        Self::with_components(settings, source, embedder, store, None)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        source: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        agent: Option<Arc<dyn AnsweringAgent>>,
    ) -> Result<Self> {
        let pipeline = RetrievalPipeline::new(settings.chunking_config(), embedder, store.clone())?
            .with_retrieval(RetrievalConfig {
                top_k: settings.retrieval.top_k,
                similarity_threshold: settings.retrieval.similarity_threshold,
            })?
            .with_max_concurrent(settings.embedding.max_concurrent)
            .with_embed_batch_size(settings.embedding.batch_size)
            .with_insert_batch_size(settings.vector_store.insert_batch_size);

        Ok(Self {
            settings,
            source,
            store,
            pipeline: Arc::new(pipeline),
            agent,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    pub fn pipeline(&self) -> Arc<RetrievalPipeline> {
        self.pipeline.clone()
    }

    /// Search YouTube for `topic`, fetch transcripts and ingest them as one
    /// text labelled with the topic.
    #[instrument(skip(self))]
    pub async fn ingest_topic(&self, topic: &str) -> Result<TopicReport> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(TubeqError::InvalidInput("Topic must not be empty".to_string()));
        }

        let batch = self.source.fetch_transcripts(topic).await;

        if let Some(failure) = &batch.search_failure {
            warn!("Search for '{}' failed: {}", topic, failure);
        }
        for skipped in &batch.skipped {
            info!("Skipped {}: {}", skipped.video_id, skipped.reason);
        }

        if batch.is_empty() {
            info!("No transcripts for '{}'", topic);
            return Ok(TopicReport {
                batch,
                ingest: IngestReport::default(),
            });
        }

        let ingest = self
            .pipeline
            .ingest_with_topic(&batch.combined_text(), Some(topic))
            .await?;

        Ok(TopicReport { batch, ingest })
    }

    /// Ingest raw text, optionally labelled with a topic.
    pub async fn ingest_text(&self, text: &str, topic: Option<&str>) -> Result<IngestReport> {
        self.pipeline.ingest_with_topic(text, topic).await
    }

    /// Ranked chunks for `query`. `None` falls back to the configured values.
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
    ) -> Result<Vec<ScoredChunk>> {
        let defaults = self.pipeline.retrieval();
        self.pipeline
            .retrieve(
                query,
                top_k.unwrap_or(defaults.top_k),
                threshold.unwrap_or(defaults.similarity_threshold),
            )
            .await
    }

    /// Answer `question` from the knowledge base.
    pub async fn ask(
        &self,
        question: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
        model: Option<&str>,
    ) -> Result<RagResponse> {
        let agent = match (&self.agent, model) {
            (Some(agent), None) => agent.clone(),
            (_, model) => self.create_agent(model)?,
        };

        let defaults = self.pipeline.retrieval();
        RagEngine::new(self.pipeline.clone(), agent)
            .ask_with(
                question,
                top_k.unwrap_or(defaults.top_k),
                threshold.unwrap_or(defaults.similarity_threshold),
            )
            .await
    }

    /// Record count, dimensionality and per-topic counts.
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            provider: self.settings.vector_store.provider.clone(),
            records: self.store.count().await?,
            dimensions: self.store.dimensions().await?,
            topics: self.store.topics().await?,
        })
    }

    fn create_agent(&self, model: Option<&str>) -> Result<Arc<dyn AnsweringAgent>> {
        let prompts = Prompts::load(
            self.settings.prompts.custom_dir.as_deref(),
            Some(&self.settings.prompts.variables),
        )?;

        let answerer = OpenAIAnswerer::new(
            &self.settings.answer_endpoint()?,
            model.unwrap_or(&self.settings.answer.model),
        )?
        .with_prompts(prompts)
        .with_temperature(self.settings.answer.temperature);

        Ok(Arc::new(answerer))
    }
}

/// Open the configured vector store backend.
pub fn create_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(TubeqError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Result of ingesting one topic.
#[derive(Debug, Clone)]
pub struct TopicReport {
    /// What the transcript source found and skipped.
    pub batch: TranscriptBatch,
    /// What the pipeline stored.
    pub ingest: IngestReport,
}

/// Snapshot of the vector store.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub provider: String,
    pub records: usize,
    pub dimensions: Option<usize>,
    pub topics: Vec<TopicStats>,
}
