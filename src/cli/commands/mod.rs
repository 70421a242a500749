//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod ingest;
mod ingest_text;
mod search;
mod stats;

pub use ask::run_ask;
pub use config::{load_or_default, run_config};
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use ingest_text::run_ingest_text;
pub use search::run_search;
pub use stats::run_stats;
