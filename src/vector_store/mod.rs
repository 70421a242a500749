//! Vector store abstraction for tubeq.
//!
//! Storage is pluggable; the similarity query protocol is not. Every backend
//! feeds its records, in insertion order, through [`rank`] so that threshold,
//! top-k and tie ordering behave identically everywhere.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::{Result, TubeqError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk and its embedding as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Topic or label the source text was ingested under.
    pub topic: Option<String>,
    /// Chunk text.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this record was stored.
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Create a new record with a fresh ID.
    pub fn new(topic: Option<String>, content: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            content,
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// A record matched by a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched record.
    pub record: StoredRecord,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Record count for one ingestion topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    /// Topic label (`None` for unlabelled text).
    pub topic: Option<String>,
    /// Number of stored records.
    pub record_count: usize,
}

/// Trait for vector store implementations.
///
/// Stores are append-only: `insert` never deduplicates or replaces content.
/// Record IDs are unique; re-inserting a stored ID is an `InvalidInput`
/// error and the batch is not stored.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append records. Returns the number stored.
    async fn insert(&self, records: &[StoredRecord]) -> Result<usize>;

    /// Nearest-neighbour search by cosine similarity.
    ///
    /// Results have `score >= threshold`, are sorted by descending score with
    /// ties in insertion order, and number at most `top_k`.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredChunk>>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize>;

    /// Dimensionality of the stored corpus, if any records exist.
    async fn dimensions(&self) -> Result<Option<usize>>;

    /// Record counts grouped by topic.
    async fn topics(&self) -> Result<Vec<TopicStats>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Ensure all `records` share one dimensionality, matching `expected` if the
/// corpus already has one. Returns the batch dimensionality.
pub fn check_dimensions(records: &[StoredRecord], expected: Option<usize>) -> Result<Option<usize>> {
    let mut dims = expected;
    for record in records {
        let len = record.embedding.len();
        if len == 0 {
            return Err(TubeqError::Config(format!(
                "record {} has an empty embedding",
                record.id
            )));
        }
        match dims {
            Some(d) if d != len => {
                return Err(TubeqError::Config(format!(
                    "embedding dimension mismatch: store holds {}-dimensional vectors, got {}",
                    d, len
                )));
            }
            Some(_) => {}
            None => dims = Some(len),
        }
    }
    Ok(dims)
}

/// Apply the query protocol to `records` given in insertion order.
pub fn rank<I>(records: I, query_embedding: &[f32], top_k: usize, threshold: f32) -> Vec<ScoredChunk>
where
    I: IntoIterator<Item = StoredRecord>,
{
    let mut results: Vec<ScoredChunk> = records
        .into_iter()
        .map(|record| {
            let score = cosine_similarity(query_embedding, &record.embedding);
            ScoredChunk { record, score }
        })
        .filter(|r| r.score >= threshold)
        .collect();

    // `sort_by` is stable, so equal scores keep insertion order.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);
    results
}

/// Error for a record whose ID is already stored.
pub(crate) fn duplicate_id(id: &Uuid) -> TubeqError {
    TubeqError::InvalidInput(format!("record {} is already stored", id))
}

/// Reject a query vector whose length differs from the corpus.
pub(crate) fn check_query_dimensions(query_embedding: &[f32], corpus: Option<usize>) -> Result<()> {
    match corpus {
        Some(d) if d != query_embedding.len() => Err(TubeqError::Config(format!(
            "query embedding has {} dimensions but the store holds {}-dimensional vectors",
            query_embedding.len(),
            d
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn record(content: &str, embedding: Vec<f32>) -> StoredRecord {
        StoredRecord::new(None, content.to_string(), embedding)
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_threshold_and_top_k() {
        let records = vec![
            record("low", vec![0.0, 1.0]),
            record("high", vec![1.0, 0.0]),
            record("mid", vec![1.0, 1.0]),
        ];

        let ranked = rank(records.clone(), &[1.0, 0.0], 10, 0.5);
        let texts: Vec<&str> = ranked.iter().map(|r| r.record.content.as_str()).collect();
        assert_eq!(texts, vec!["high", "mid"]);

        let ranked = rank(records, &[1.0, 0.0], 1, 0.0);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.content, "high");
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let records: Vec<StoredRecord> = (0..5)
            .map(|i| record(&format!("r{}", i), vec![2.0, 2.0]))
            .collect();

        let ranked = rank(records, &[1.0, 1.0], 3, 0.0);
        let texts: Vec<&str> = ranked.iter().map(|r| r.record.content.as_str()).collect();
        assert_eq!(texts, vec!["r0", "r1", "r2"]);
    }

    #[test]
    fn test_check_dimensions() {
        let batch = vec![record("a", vec![1.0, 0.0]), record("b", vec![0.0, 1.0])];
        assert_eq!(check_dimensions(&batch, None).unwrap(), Some(2));
        assert_eq!(check_dimensions(&[], Some(4)).unwrap(), Some(4));

        let err = check_dimensions(&batch, Some(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let mixed = vec![record("a", vec![1.0, 0.0]), record("b", vec![1.0])];
        assert!(check_dimensions(&mixed, None).is_err());
    }
}
