//! Transcript sources.
//!
//! A source turns a search topic into transcript text. Sources never fail
//! outright: videos that cannot be read are recorded as skipped, and a failed
//! search yields an empty batch carrying the failure message.

mod vtt;
mod youtube;

pub use vtt::vtt_to_text;
pub use youtube::{YoutubeSource, YoutubeSourceConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Whether a caption track was uploaded or generated by speech recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    Manual,
    Generated,
}

/// The transcript of one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTranscript {
    /// Video ID.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Caption track used.
    pub kind: CaptionKind,
    /// Flattened transcript text.
    pub text: String,
}

impl VideoTranscript {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

/// Why a video contributed no transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Captions exist, but none in the requested language.
    NoEnglishTranscript,
    /// The video has no caption tracks at all.
    TranscriptsDisabled,
    /// Metadata or caption download failed.
    FetchFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoEnglishTranscript => write!(f, "no English transcript"),
            SkipReason::TranscriptsDisabled => write!(f, "transcripts disabled"),
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {}", e),
        }
    }
}

/// A video that was found but skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedVideo {
    pub video_id: String,
    pub reason: SkipReason,
}

/// Everything a source produced for one topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptBatch {
    /// The searched topic.
    pub topic: String,
    /// Number of videos the search returned.
    pub videos_found: usize,
    /// Transcripts successfully fetched, in search order.
    pub transcripts: Vec<VideoTranscript>,
    /// Videos skipped, with reasons.
    pub skipped: Vec<SkippedVideo>,
    /// Set when the search itself failed.
    pub search_failure: Option<String>,
}

impl TranscriptBatch {
    /// An empty batch for a failed search.
    pub fn failed(topic: &str, reason: String) -> Self {
        Self {
            topic: topic.to_string(),
            search_failure: Some(reason),
            ..Default::default()
        }
    }

    /// All transcripts joined with a single space.
    pub fn combined_text(&self) -> String {
        self.transcripts
            .iter()
            .map(|t| t.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.iter().all(|t| t.text.is_empty())
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Search for videos on `topic` and fetch their English transcripts.
    async fn fetch_transcripts(&self, topic: &str) -> TranscriptBatch;
}
