//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::error::TubeqError;
use anyhow::Result;
use std::path::PathBuf;

/// Load settings for the config command, which must keep working when the
/// file is broken. On failure the defaults are returned with the load error.
pub fn load_or_default(config_path: &PathBuf) -> (Settings, Option<TubeqError>) {
    match Settings::load_from(Some(config_path)) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &PathBuf) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {} (use --force to overwrite)",
                    config_path.display()
                ));
                return Ok(());
            }

            Settings::default().save_to(config_path)?;
            Output::success(&format!("Wrote default config to {}", config_path.display()));
            Output::info("API keys are read from TOGETHER_API_KEY and GROQ_API_KEY by default.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval\ntop_k = ").unwrap();

        let (settings, error) = load_or_default(&path);
        assert_eq!(
            error.map(|e| e.kind()),
            Some(crate::error::ErrorKind::Configuration)
        );
        assert_eq!(settings.retrieval.top_k, 5);

        std::fs::write(&path, "[retrieval]\ntop_k = 7\n").unwrap();
        let (settings, error) = load_or_default(&path);
        assert!(error.is_none());
        assert_eq!(settings.retrieval.top_k, 7);
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubeq").join("config.toml");

        run_config(&ConfigAction::Init { force: false }, Settings::default(), &path).unwrap();
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.retrieval.top_k, 5);
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 9\n").unwrap();

        run_config(&ConfigAction::Init { force: false }, Settings::default(), &path).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().retrieval.top_k, 9);

        run_config(&ConfigAction::Init { force: true }, Settings::default(), &path).unwrap();
        assert_eq!(Settings::load_from(Some(&path)).unwrap().retrieval.top_k, 5);
    }
}
