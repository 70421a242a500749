//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(topic: &str, max_results: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Some(n) = max_results {
        settings.youtube.max_results = n;
    }

    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubeq doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Fetching transcripts for '{}'...", topic));
    let result = orchestrator.ingest_topic(topic).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    if let Some(failure) = &report.batch.search_failure {
        Output::warning(&format!("Search failed: {}", failure));
    }

    Output::header(&format!("Topic: {}", report.batch.topic));
    Output::kv("Videos found", &report.batch.videos_found.to_string());
    for transcript in &report.batch.transcripts {
        Output::list_item(&format!("{} ({})", transcript.title, transcript.url()));
    }
    for skipped in &report.batch.skipped {
        Output::warning(&format!("Skipped {}: {}", skipped.video_id, skipped.reason));
    }

    println!();
    Output::kv("Chunks", &report.ingest.chunks_produced.to_string());
    Output::kv("Stored", &report.ingest.stored.to_string());
    if report.ingest.embedding_failures > 0 {
        Output::warning(&format!(
            "{} chunk(s) could not be embedded",
            report.ingest.embedding_failures
        ));
    }

    if report.ingest.stored > 0 {
        Output::success(&format!(
            "Ingested {} chunks from {} transcript(s)",
            report.ingest.stored,
            report.batch.transcripts.len()
        ));
    } else {
        Output::warning("Nothing was stored for this topic.");
    }

    Ok(())
}
