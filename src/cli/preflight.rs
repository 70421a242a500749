//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TubeqError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Topic ingestion needs yt-dlp and the embedding key.
    Ingest,
    /// Text ingestion and search need the embedding key.
    Embed,
    /// Asking needs both the embedding and the chat key.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest => {
            settings.embedding_endpoint()?;
            check_tool(&settings.youtube.ytdlp_path)?;
        }
        Operation::Embed => {
            settings.embedding_endpoint()?;
        }
        Operation::Ask => {
            settings.embedding_endpoint()?;
            settings.answer_endpoint()?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<String> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("installed")
            .trim()
            .to_string()),
        Ok(_) => Err(TubeqError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TubeqError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TubeqError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("tubeq-no-such-tool").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TranscriptSource);
    }

    #[test]
    fn test_embed_requires_key() {
        let mut settings = Settings::default();
        settings.embedding.api_key = None;
        settings.embedding.api_key_env = "TUBEQ_TEST_UNSET_EMBEDDING_KEY".to_string();
        let err = check(Operation::Embed, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        settings.embedding.api_key = Some("key".to_string());
        assert!(check(Operation::Embed, &settings).is_ok());
    }
}
