//! Ingest-text command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use std::io::Read;

/// Run the ingest-text command.
pub async fn run_ingest_text(file: &str, topic: Option<&str>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Embed, &settings)?;

    let text = read_input(file)?;
    if text.trim().is_empty() {
        Output::warning("Input is empty, nothing to ingest.");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Chunking and embedding...");
    let result = orchestrator.ingest_text(&text, topic).await;
    spinner.finish_and_clear();

    let report = result?;
    Output::kv("Chunks", &report.chunks_produced.to_string());
    Output::kv("Stored", &report.stored.to_string());
    if report.embedding_failures > 0 {
        Output::warning(&format!(
            "{} chunk(s) could not be embedded",
            report.embedding_failures
        ));
    }
    Output::success(&format!("Ingested {} chunks", report.stored));

    Ok(())
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        let path = Settings::expand_path(file);
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "some transcript").unwrap();

        assert_eq!(read_input(path.to_str().unwrap()).unwrap(), "some transcript");
        assert!(read_input(dir.path().join("missing.txt").to_str().unwrap()).is_err());
    }
}
