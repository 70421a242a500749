//! tubeq - question answering over YouTube transcripts
//!
//! Builds a retrieval-augmented knowledge base from YouTube video transcripts.
//!
//! # Overview
//!
//! tubeq allows you to:
//! - Search YouTube for a topic and pull the English transcripts of the results
//! - Split transcripts into overlapping chunks and store their embeddings
//! - Retrieve the chunks most similar to a query
//! - Ask questions answered only from the retrieved chunks
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `transcript_source` - Video search and transcript fetching
//! - `chunking` - Fixed-size overlapping text windows
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector store abstraction and the shared ranking protocol
//! - `pipeline` - Ingestion and retrieval paths, context assembly
//! - `answer` - Answering agents
//! - `rag` - Retrieval, context and answer in one call
//! - `orchestrator` - Wiring settings into collaborators
//!
//! # Example
//!
//! ```rust,no_run
//! use tubeq::config::Settings;
//! use tubeq::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.ingest_topic("rust ownership").await?;
//!     println!("Stored {} chunks", report.ingest.stored);
//!
//!     let response = orchestrator.ask("What is a borrow?", None, None, None).await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod rag;
pub mod transcript_source;
pub mod vector_store;

pub use error::{ErrorKind, Result, TubeqError};
