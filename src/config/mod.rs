//! Configuration module for tubeq.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, NO_RELEVANT_DATA};
pub use settings::{
    AnswerSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, PromptSettings,
    RetrievalSettings, Settings, VectorStoreSettings, YoutubeSettings,
};
