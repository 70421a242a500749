//! CLI module for tubeq.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// tubeq - question answering over YouTube transcripts
///
/// Searches YouTube for a topic, stores chunked and embedded transcripts in a
/// local vector store, and answers questions from what was stored.
#[derive(Parser, Debug)]
#[command(name = "tubeq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search YouTube for a topic and ingest the videos' transcripts
    Ingest {
        /// Search topic
        topic: String,

        /// Number of videos to fetch (overrides youtube.max_results)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },

    /// Ingest plain text from a file, or stdin with "-"
    IngestText {
        /// File to read, or "-" for stdin
        file: String,

        /// Label stored with the chunks
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Search for stored chunks similar to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity score, 0.0-1.0 (defaults to retrieval.similarity_threshold)
        #[arg(short = 't', long)]
        threshold: Option<f32>,
    },

    /// Ask a question and get an answer grounded in stored transcripts
    Ask {
        /// The question to ask
        question: String,

        /// Maximum number of context chunks (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity score, 0.0-1.0 (defaults to retrieval.similarity_threshold)
        #[arg(short = 't', long)]
        threshold: Option<f32>,

        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Print the retrieved context before the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Show what the vector store holds
    Stats,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "tubeq", "-vv", "ask", "what is a lifetime?", "-k", "3", "--show-context",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask {
                question,
                top_k,
                threshold,
                show_context,
                ..
            } => {
                assert_eq!(question, "what is a lifetime?");
                assert_eq!(top_k, Some(3));
                assert_eq!(threshold, None);
                assert!(show_context);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ingest_text_from_stdin() {
        let cli = Cli::try_parse_from(["tubeq", "ingest-text", "-", "--topic", "notes"]).unwrap();
        match cli.command {
            Commands::IngestText { file, topic } => {
                assert_eq!(file, "-");
                assert_eq!(topic.as_deref(), Some("notes"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["tubeq", "stats", "--config", "/tmp/t.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/t.toml"));
    }
}
