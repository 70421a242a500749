//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian `f32` blobs and similarity is
//! computed in Rust over a full scan. The `records.seq` column is the
//! insertion order used to break score ties.

use super::{
    check_dimensions, check_query_dimensions, duplicate_id, rank, ScoredChunk, StoredRecord,
    TopicStats, VectorStore,
};
use crate::error::{Result, TubeqError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        topic TEXT,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        dimensions INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_topic ON records(topic);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            TubeqError::StoreUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TubeqError::StoreUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn corpus_dimensions(conn: &Connection) -> Result<Option<usize>> {
        let dims: Option<i64> = conn
            .query_row("SELECT dimensions FROM records ORDER BY seq LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(dims.map(|d| d as usize))
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRecord> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(3)?;
        let created_at_str: String = row.get(4)?;

        Ok(StoredRecord {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            topic: row.get(1)?,
            content: row.get(2)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert(&self, records: &[StoredRecord]) -> Result<usize> {
        let conn = self.lock()?;
        check_dimensions(records, Self::corpus_dimensions(&conn)?)?;

        let tx = conn.unchecked_transaction()?;

        for record in records {
            tx.execute(
                r#"
                INSERT INTO records (id, topic, content, embedding, dimensions, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.id.to_string(),
                    record.topic,
                    record.content,
                    Self::embedding_to_bytes(&record.embedding),
                    record.embedding.len() as i64,
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(rusqlite::ErrorCode::ConstraintViolation) => duplicate_id(&record.id),
                _ => TubeqError::from(e),
            })?;
        }

        tx.commit()?;
        debug!("Inserted {} records", records.len());
        Ok(records.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let conn = self.lock()?;
        check_query_dimensions(query_embedding, Self::corpus_dimensions(&conn)?)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, topic, content, embedding, created_at
            FROM records
            ORDER BY seq
            "#,
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let results = rank(records, query_embedding, top_k, threshold);
        debug!("Found {} matching records", results.len());
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        let conn = self.lock()?;
        Self::corpus_dimensions(&conn)
    }

    #[instrument(skip(self))]
    async fn topics(&self) -> Result<Vec<TopicStats>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT topic, COUNT(*) AS record_count
            FROM records
            GROUP BY topic
            ORDER BY topic
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok(TopicStats {
                topic: row.get(0)?,
                record_count: count as usize,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
