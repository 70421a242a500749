//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::context::format_context_for_prompt;
use crate::rag::Outcome;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
    model: Option<&str>,
    show_context: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubeq doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching knowledge base...");
    let result = orchestrator.ask(question, top_k, threshold, model).await;
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    if show_context {
        Output::header("Context");
        if response.sources.is_empty() {
            Output::info("(empty)");
        } else {
            println!("{}", format_context_for_prompt(&response.sources));
        }
    }

    println!("\n{}\n", response.format_for_display());

    if response.outcome == Outcome::NoRelevantData {
        Output::info("Try 'tubeq ingest <topic>' or a lower --threshold.");
    }

    Ok(())
}
