//! Retrieval pipeline: the ingestion path (chunk, embed, store) and the query
//! path (embed, search, rank), plus context assembly.

use crate::chunking::{ChunkingConfig, TextChunker, TranscriptChunk};
use crate::embedding::Embedder;
use crate::error::{ErrorKind, Result, TubeqError};
use crate::vector_store::{ScoredChunk, StoredRecord, VectorStore};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Separator placed between chunks in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Query-path parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    /// Maximum number of chunks returned.
    pub top_k: usize,
    /// Minimum cosine similarity, in [0, 1].
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.8,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(TubeqError::Config("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(TubeqError::Config(format!(
                "similarity threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks produced by the chunker.
    pub chunks_produced: usize,
    /// Records written to the store.
    pub stored: usize,
    /// Chunks skipped because their embedding request failed.
    pub embedding_failures: usize,
}

/// Chunk -> embed -> store, and query -> embed -> search.
pub struct RetrievalPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    retrieval: RetrievalConfig,
    max_concurrent: usize,
    embed_batch_size: usize,
    insert_batch_size: usize,
}

/// A chunk paired with its embedding, or the reason it has none.
type Embedded = (TranscriptChunk, Result<Vec<f32>>);

impl RetrievalPipeline {
    /// Create a pipeline. Fails on invalid chunking parameters.
    pub fn new(
        chunking: ChunkingConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        Ok(Self {
            chunker: TextChunker::new(chunking)?,
            embedder,
            store,
            retrieval: RetrievalConfig::default(),
            max_concurrent: 4,
            embed_batch_size: 100,
            insert_batch_size: 32,
        })
    }

    /// Set the default query parameters.
    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Result<Self> {
        retrieval.validate()?;
        self.retrieval = retrieval;
        Ok(self)
    }

    /// Set the number of embedding requests in flight during ingestion.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Set the number of chunks sent per embedding request.
    pub fn with_embed_batch_size(mut self, batch_size: usize) -> Self {
        self.embed_batch_size = batch_size.max(1);
        self
    }

    /// Set the number of records written per insert call.
    pub fn with_insert_batch_size(mut self, batch_size: usize) -> Self {
        self.insert_batch_size = batch_size.max(1);
        self
    }

    pub fn retrieval(&self) -> RetrievalConfig {
        self.retrieval
    }

    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    /// Ingest unlabelled text.
    pub async fn ingest(&self, raw_text: &str) -> Result<IngestReport> {
        self.ingest_with_topic(raw_text, None).await
    }

    /// Chunk, embed and store `raw_text`, labelling records with `topic`.
    ///
    /// Chunks are embedded in groups of `embed_batch_size`, with up to
    /// `max_concurrent` groups in flight. A chunk whose embedding is
    /// unavailable is skipped and counted; any other embedder error aborts.
    /// A store failure abandons the rest of the batch and is returned as
    /// [`TubeqError::IngestAborted`] carrying the partial count. An embedding
    /// of the wrong dimensionality is a configuration error.
    #[instrument(skip(self, raw_text), fields(chars = raw_text.len()))]
    pub async fn ingest_with_topic(
        &self,
        raw_text: &str,
        topic: Option<&str>,
    ) -> Result<IngestReport> {
        let chunks = self.chunker.chunk(raw_text);
        let mut report = IngestReport {
            chunks_produced: chunks.len(),
            ..Default::default()
        };

        if chunks.is_empty() {
            return Ok(report);
        }

        info!("Embedding {} chunks", chunks.len());

        let groups: Vec<Vec<TranscriptChunk>> = chunks
            .chunks(self.embed_batch_size)
            .map(<[TranscriptChunk]>::to_vec)
            .collect();

        // `buffered` keeps chunk order while groups run concurrently.
        let embedded: Vec<Result<Vec<Embedded>>> = stream::iter(groups)
            .map(|group| self.embed_group(group))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let expected_dims = self.embedder.dimensions();
        let mut records = Vec::with_capacity(report.chunks_produced);

        let embedded: Vec<Vec<Embedded>> = embedded.into_iter().collect::<Result<_>>()?;

        for (chunk, embedding) in embedded.into_iter().flatten() {
            match embedding {
                Ok(embedding) if embedding.len() != expected_dims => {
                    return Err(TubeqError::Config(format!(
                        "embedder is configured for {} dimensions but returned {}",
                        expected_dims,
                        embedding.len()
                    )));
                }
                Ok(embedding) => records.push(StoredRecord::new(
                    topic.map(str::to_string),
                    chunk.text,
                    embedding,
                )),
                Err(e) => {
                    warn!("Skipping chunk {}: {}", chunk.order, e);
                    report.embedding_failures += 1;
                }
            }
        }

        for batch in records.chunks(self.insert_batch_size) {
            match self.store.insert(batch).await {
                Ok(n) => report.stored += n,
                Err(e) if e.kind() != ErrorKind::StoreUnavailable => return Err(e),
                Err(e) => {
                    warn!(
                        "Store failed after {} of {} chunks: {}",
                        report.stored, report.chunks_produced, e
                    );
                    return Err(TubeqError::IngestAborted {
                        stored: report.stored,
                        chunks_produced: report.chunks_produced,
                        source: Box::new(e),
                    });
                }
            }
        }

        info!(
            "Stored {}/{} chunks ({} embedding failures)",
            report.stored, report.chunks_produced, report.embedding_failures
        );
        Ok(report)
    }

    /// Embed one group with a single batch request. If the batch is
    /// unavailable, retry its chunks one by one so a single bad chunk only
    /// costs itself.
    async fn embed_group(&self, group: Vec<TranscriptChunk>) -> Result<Vec<Embedded>> {
        let texts: Vec<String> = group.iter().map(|c| c.text.clone()).collect();

        let failure = match self.embedder.embed_batch(&texts).await {
            Ok(embeddings) if embeddings.len() == group.len() => {
                return Ok(group.into_iter().zip(embeddings.into_iter().map(Ok)).collect());
            }
            Ok(embeddings) => TubeqError::EmbeddingUnavailable(format!(
                "{} embeddings returned for {} chunks",
                embeddings.len(),
                group.len()
            )),
            Err(e) if e.kind() == ErrorKind::EmbeddingUnavailable => e,
            Err(e) => return Err(e),
        };

        if group.len() == 1 {
            let mut failure = Some(failure);
            return Ok(group
                .into_iter()
                .map(|chunk| (chunk, Err(failure.take().expect("single-chunk group"))))
                .collect());
        }

        debug!("Batch of {} failed ({}), embedding individually", group.len(), failure);
        let mut embedded = Vec::with_capacity(group.len());
        for chunk in group {
            match self.embedder.embed(&chunk.text).await {
                Err(e) if e.kind() != ErrorKind::EmbeddingUnavailable => return Err(e),
                embedding => embedded.push((chunk, embedding)),
            }
        }
        Ok(embedded)
    }

    /// Retrieve with the pipeline's configured `top_k` and threshold.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retrieve(query, self.retrieval.top_k, self.retrieval.similarity_threshold)
            .await
    }

    /// Top `top_k` stored chunks with similarity `>= threshold`, best first.
    ///
    /// If the query cannot be embedded the result is empty: "no context" is a
    /// valid outcome for answering. Store failures propagate.
    #[instrument(skip(self))]
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredChunk>> {
        RetrievalConfig {
            top_k,
            similarity_threshold: threshold,
        }
        .validate()?;

        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) if e.kind() == ErrorKind::EmbeddingUnavailable => {
                warn!("Query embedding unavailable, returning no context: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let results = self.store.search(&query_embedding, top_k, threshold).await?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    /// Like [`retrieve`](Self::retrieve), returning only the chunk texts.
    pub async fn retrieve_texts(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<String>> {
        Ok(self
            .retrieve(query, top_k, threshold)
            .await?
            .into_iter()
            .map(|r| r.record.content)
            .collect())
    }
}

/// Join chunks into one context string, preserving their order.
pub fn assemble_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
