//! RAG response generation.

use super::context::{format_context_for_prompt, ContextChunk};
use crate::answer::{is_no_relevant_data, AnsweringAgent};
use crate::config::NO_RELEVANT_DATA;
use crate::error::Result;
use crate::pipeline::RetrievalPipeline;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// How an answer came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The agent answered from retrieved context.
    Answered,
    /// Nothing was retrieved, or the agent found the context irrelevant.
    NoRelevantData,
}

/// RAG engine for question answering.
pub struct RagEngine {
    pipeline: Arc<RetrievalPipeline>,
    agent: Arc<dyn AnsweringAgent>,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(pipeline: Arc<RetrievalPipeline>, agent: Arc<dyn AnsweringAgent>) -> Self {
        Self { pipeline, agent }
    }

    /// Ask a question with the pipeline's default `top_k` and threshold.
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let retrieval = self.pipeline.retrieval();
        self.ask_with(question, retrieval.top_k, retrieval.similarity_threshold)
            .await
    }

    /// Retrieve context for `question` and answer from it.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask_with(
        &self,
        question: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let sources: Vec<ContextChunk> = self
            .pipeline
            .retrieve(question, top_k, threshold)
            .await?
            .into_iter()
            .map(ContextChunk::from)
            .collect();

        if sources.is_empty() {
            return Ok(RagResponse {
                answer: NO_RELEVANT_DATA.to_string(),
                sources,
                outcome: Outcome::NoRelevantData,
            });
        }

        let context = format_context_for_prompt(&sources);
        let answer = self.agent.answer(question, &context).await?;

        let outcome = if is_no_relevant_data(&answer) {
            Outcome::NoRelevantData
        } else {
            Outcome::Answered
        };

        debug!("Generated response with {} sources", sources.len());

        Ok(RagResponse {
            answer,
            sources,
            outcome,
        })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
    pub outcome: Outcome,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if self.outcome == Outcome::Answered && !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            output.push_str(&super::context::format_context_for_display(&self.sources));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::embedding::Embedder;
    use crate::error::{ErrorKind, TubeqError};
    use crate::vector_store::{MemoryVectorStore, StoredRecord, VectorStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embeds "rust" near [1, 0] and everything else at [0, 1].
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("rust") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Records the context it was given and replies with a canned answer.
    struct ScriptedAgent {
        reply: std::result::Result<String, String>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedAgent {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("503 from upstream".to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AnsweringAgent for ScriptedAgent {
        async fn answer(&self, _query: &str, context: &str) -> Result<String> {
            self.seen.lock().unwrap().push(context.to_string());
            self.reply.clone().map_err(TubeqError::AnswerUnavailable)
        }
    }

    async fn engine(agent: Arc<ScriptedAgent>) -> RagEngine {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .insert(&[
                StoredRecord::new(Some("rust".to_string()), "rust owns memory".to_string(), vec![1.0, 0.0]),
                StoredRecord::new(Some("rust".to_string()), "rust borrows too".to_string(), vec![0.9, 0.1]),
                StoredRecord::new(None, "cooking pasta".to_string(), vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let pipeline = RetrievalPipeline::new(ChunkingConfig::default(), Arc::new(KeywordEmbedder), store)
            .unwrap();
        RagEngine::new(Arc::new(pipeline), agent)
    }

    #[tokio::test]
    async fn test_answer_uses_ordered_context() {
        let agent = Arc::new(ScriptedAgent::replying("Rust uses ownership."));
        let engine = engine(agent.clone()).await;

        let response = engine.ask("how does rust manage memory?").await.unwrap();
        assert_eq!(response.outcome, Outcome::Answered);
        assert_eq!(response.answer, "Rust uses ownership.");
        assert_eq!(response.sources.len(), 2);

        let seen = agent.seen.lock().unwrap();
        assert_eq!(seen[0], "rust owns memory\n\nrust borrows too");
        assert!(response.format_for_display().contains("--- Sources ---"));
    }

    #[tokio::test]
    async fn test_per_call_top_k() {
        let agent = Arc::new(ScriptedAgent::replying("Rust uses ownership."));
        let engine = engine(agent.clone()).await;

        let response = engine.ask_with("rust", 1, 0.5).await.unwrap();
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].content, "rust owns memory");
        assert_eq!(agent.seen.lock().unwrap()[0], "rust owns memory");
    }

    #[tokio::test]
    async fn test_sentinel_answer_is_no_relevant_data() {
        let agent = Arc::new(ScriptedAgent::replying("No relevant data found."));
        let engine = engine(agent).await;

        let response = engine.ask("rust lifetimes").await.unwrap();
        assert_eq!(response.outcome, Outcome::NoRelevantData);
        assert_eq!(response.format_for_display(), "No relevant data found.");
    }

    #[tokio::test]
    async fn test_empty_store_answers_with_sentinel() {
        let agent = Arc::new(ScriptedAgent::replying("unused"));
        let pipeline = RetrievalPipeline::new(
            ChunkingConfig::default(),
            Arc::new(KeywordEmbedder),
            Arc::new(MemoryVectorStore::new()),
        )
        .unwrap();
        let engine = RagEngine::new(Arc::new(pipeline), agent.clone());

        let response = engine.ask("rust").await.unwrap();
        assert_eq!(response.outcome, Outcome::NoRelevantData);
        assert_eq!(response.answer, NO_RELEVANT_DATA);
        assert!(response.sources.is_empty());
        assert!(agent.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_agent_failure_propagates() {
        let engine = engine(Arc::new(ScriptedAgent::failing())).await;
        let err = engine.ask("rust").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AnswerUnavailable);
    }
}
