//! In-memory vector store implementation.
//!
//! Useful for testing and one-shot sessions.

use super::{
    check_dimensions, check_query_dimensions, duplicate_id, rank, ScoredChunk, StoredRecord,
    TopicStats, VectorStore,
};
use crate::error::{Result, TubeqError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store. Records are kept in insertion order.
pub struct MemoryVectorStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredRecord>>> {
        self.records
            .read()
            .map_err(|e| TubeqError::StoreUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredRecord>>> {
        self.records
            .write()
            .map_err(|e| TubeqError::StoreUnavailable(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert(&self, records: &[StoredRecord]) -> Result<usize> {
        let mut store = self.write()?;
        let existing = store.first().map(|r| r.embedding.len());
        check_dimensions(records, existing)?;

        let mut ids: HashSet<_> = store.iter().map(|r| r.id).collect();
        if let Some(dup) = records.iter().find(|r| !ids.insert(r.id)) {
            return Err(duplicate_id(&dup.id));
        }

        store.extend_from_slice(records);
        Ok(records.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let store = self.read()?;
        check_query_dimensions(query_embedding, store.first().map(|r| r.embedding.len()))?;
        Ok(rank(store.iter().cloned(), query_embedding, top_k, threshold))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(self.read()?.first().map(|r| r.embedding.len()))
    }

    async fn topics(&self) -> Result<Vec<TopicStats>> {
        let store = self.read()?;
        let mut counts: BTreeMap<Option<String>, usize> = BTreeMap::new();
        for record in store.iter() {
            *counts.entry(record.topic.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(topic, record_count)| TopicStats {
                topic,
                record_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let rec1 = StoredRecord::new(
            Some("rust".to_string()),
            "Hello world".to_string(),
            vec![1.0, 0.0, 0.0],
        );
        let rec2 = StoredRecord::new(
            Some("rust".to_string()),
            "Goodbye world".to_string(),
            vec![0.0, 1.0, 0.0],
        );

        store.insert(&[rec1, rec2]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.dimensions().await.unwrap(), Some(3));

        let results = store.search(&[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].record.content, "Hello world");

        let topics = store.topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].record_count, 2);
    }

    #[tokio::test]
    async fn test_insert_is_append_only() {
        let store = MemoryVectorStore::new();
        for _ in 0..2 {
            let rec = StoredRecord::new(None, "same".to_string(), vec![1.0, 0.0]);
            store.insert(&[rec]).await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryVectorStore::new();
        let rec = StoredRecord::new(None, "same".to_string(), vec![1.0, 0.0]);
        store.insert(std::slice::from_ref(&rec)).await.unwrap();

        let err = store.insert(std::slice::from_ref(&rec)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let fresh = StoredRecord::new(None, "fresh".to_string(), vec![0.0, 1.0]);
        let err = store.insert(&[fresh.clone(), fresh]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_config_error() {
        let store = MemoryVectorStore::new();
        store
            .insert(&[StoredRecord::new(None, "a".to_string(), vec![1.0, 0.0])])
            .await
            .unwrap();

        let err = store
            .insert(&[StoredRecord::new(None, "b".to_string(), vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(store.count().await.unwrap(), 1);

        let err = store.search(&[1.0, 0.0, 0.0], 5, 0.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let store = MemoryVectorStore::new();
        let results = store.search(&[1.0, 0.0], 5, 0.0).await.unwrap();
        assert!(results.is_empty());
    }
}
