//! Answer generation grounded in retrieved context.

mod openai;

pub use openai::OpenAIAnswerer;

use crate::config::NO_RELEVANT_DATA;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for answering agents.
///
/// Implementations answer only from `context` and return
/// [`NO_RELEVANT_DATA`] when it contains nothing pertinent.
#[async_trait]
pub trait AnsweringAgent: Send + Sync {
    /// Answer `query` using `context`.
    async fn answer(&self, query: &str, context: &str) -> Result<String>;
}

/// Whether an answer is the "no relevant data" sentinel.
///
/// Models sometimes quote or re-punctuate the sentinel, so quotes and
/// trailing punctuation are ignored.
pub fn is_no_relevant_data(answer: &str) -> bool {
    let normalize = |s: &str| {
        s.trim()
            .trim_matches(|c: char| c == '\'' || c == '"' || c == '.' || c.is_whitespace())
            .to_lowercase()
    };
    normalize(answer) == normalize(NO_RELEVANT_DATA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(is_no_relevant_data("No relevant data found."));
        assert!(is_no_relevant_data("  'No relevant data found.'\n"));
        assert!(is_no_relevant_data("no relevant data found"));
        assert!(!is_no_relevant_data("Ownership moves values between bindings."));
        assert!(!is_no_relevant_data("No relevant data found. But here is a guess."));
    }
}
