//! Context chunks as shown to the answering agent and to the user.

use crate::pipeline::assemble_context;
use crate::vector_store::ScoredChunk;

/// A retrieved chunk kept alongside an answer.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Text content.
    pub content: String,
    /// Topic the chunk was ingested under, if any.
    pub topic: Option<String>,
    /// Similarity score.
    pub score: f32,
}

impl From<ScoredChunk> for ContextChunk {
    fn from(result: ScoredChunk) -> Self {
        Self {
            content: result.record.content,
            topic: result.record.topic,
            score: result.score,
        }
    }
}

/// Context string handed to the answering agent.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    assemble_context(&texts)
}

/// Truncate a chunk for a one-line preview, on a char boundary.
pub fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let topic = chunk
                .topic
                .as_ref()
                .map(|t| format!(" [{}]", t))
                .unwrap_or_default();

            format!(
                "[{}]{} (score: {:.2})\n  {}",
                i + 1,
                topic,
                chunk.score,
                preview(&chunk.content, 160)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, score: f32) -> ContextChunk {
        ContextChunk {
            content: content.to_string(),
            topic: Some("rust".to_string()),
            score,
        }
    }

    #[test]
    fn test_prompt_context_keeps_order() {
        let chunks = vec![chunk("best match", 0.9), chunk("runner up", 0.85)];
        assert_eq!(format_context_for_prompt(&chunks), "best match\n\nrunner up");
        assert_eq!(format_context_for_prompt(&[]), "");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short\n text", 20), "short text");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_display_includes_topic_and_score() {
        let display = format_context_for_display(&[chunk("borrowing rules", 0.912)]);
        assert!(display.contains("[1] [rust] (score: 0.91)"));
        assert!(display.contains("borrowing rules"));
    }
}
