//! tubeq CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubeq::cli::{commands, Cli, Commands, Output};
use tubeq::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubeq={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };

    // `config` must work even when the existing file is broken
    let settings = match &cli.command {
        Commands::Config { .. } => {
            let (settings, error) = commands::load_or_default(&config_path);
            if let Some(e) = error {
                Output::warning(&format!(
                    "Could not load {}: {}. Falling back to defaults.",
                    config_path.display(),
                    e
                ));
            }
            settings
        }
        _ => {
            let settings = Settings::load_from(Some(&config_path))?;
            std::fs::create_dir_all(settings.data_dir())?;
            settings
        }
    };

    match &cli.command {
        Commands::Ingest { topic, max_results } => {
            commands::run_ingest(topic, *max_results, settings).await?;
        }

        Commands::IngestText { file, topic } => {
            commands::run_ingest_text(file, topic.as_deref(), settings).await?;
        }

        Commands::Search {
            query,
            top_k,
            threshold,
        } => {
            commands::run_search(query, *top_k, *threshold, settings).await?;
        }

        Commands::Ask {
            question,
            top_k,
            threshold,
            model,
            show_context,
        } => {
            commands::run_ask(
                question,
                *top_k,
                *threshold,
                model.as_deref(),
                *show_context,
                settings,
            )
            .await?;
        }

        Commands::Stats => {
            commands::run_stats(settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
