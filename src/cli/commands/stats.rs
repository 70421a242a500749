//! Stats command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::create_store;
use anyhow::Result;

/// Run the stats command.
///
/// Only opens the store, so no API key is needed.
pub async fn run_stats(settings: Settings) -> Result<()> {
    let store = create_store(&settings)?;

    let records = store.count().await?;
    let dimensions = store.dimensions().await?;
    let topics = store.topics().await?;

    Output::header("Vector store");
    Output::kv("Provider", &settings.vector_store.provider);
    if settings.vector_store.provider == "sqlite" {
        Output::kv("Path", &settings.sqlite_path().display().to_string());
    }
    Output::kv("Records", &records.to_string());
    Output::kv(
        "Dimensions",
        &dimensions.map_or_else(|| "-".to_string(), |d| d.to_string()),
    );

    if topics.is_empty() {
        Output::info("No records stored yet. Run 'tubeq ingest <topic>' to add some.");
        return Ok(());
    }

    Output::header("Topics");
    for stats in &topics {
        Output::list_item(&format!(
            "{} ({} chunks)",
            stats.topic.as_deref().unwrap_or("(untagged)"),
            stats.record_count
        ));
    }

    Ok(())
}
