//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieval, context assembly and answering composed into one call.

pub mod context;
mod response;

pub use context::ContextChunk;
pub use response::{Outcome, RagEngine, RagResponse};
