//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::check_tool;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("tubeq doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let sections = [
        ("External Tools", vec![check_ytdlp(settings)]),
        ("API Configuration", check_api_keys(settings)),
        ("Storage", check_storage(settings)),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    let mut checks = Vec::new();
    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using tubeq.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! tubeq is ready to use.");
    }

    Ok(())
}

fn check_ytdlp(settings: &Settings) -> CheckResult {
    match check_tool(&settings.youtube.ytdlp_path) {
        Ok(version) => CheckResult::ok("yt-dlp", &truncate(&version, 50)),
        Err(e) => CheckResult::error("yt-dlp", &e.to_string(), install_hint_ytdlp()),
    }
}

/// Check that each service key resolves, without printing it.
fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    results.push(match settings.embedding_endpoint() {
        Ok(endpoint) => CheckResult::ok(
            "Embedding key",
            &format!("configured ({}) for {}", mask(&endpoint.api_key), endpoint.base_url),
        ),
        Err(_) => CheckResult::error(
            "Embedding key",
            "not set",
            &format!("Set embedding.api_key or export {}", settings.embedding.api_key_env),
        ),
    });

    results.push(match settings.answer_endpoint() {
        Ok(endpoint) => CheckResult::ok(
            "Answer key",
            &format!("configured ({}) for {}", mask(&endpoint.api_key), endpoint.base_url),
        ),
        Err(_) => CheckResult::warning(
            "Answer key",
            "not set ('ask' will not work)",
            &format!("Set answer.api_key or export {}", settings.answer.api_key_env),
        ),
    });

    results.push(match settings.youtube_api_key() {
        Some(key) => CheckResult::ok("YouTube key", &format!("configured ({})", mask(&key))),
        None => CheckResult::warning(
            "YouTube key",
            "not set (searching through yt-dlp)",
            &format!(
                "Set youtube.api_key or export {} to use the Data API",
                settings.youtube.api_key_env
            ),
        ),
    });

    results
}

fn check_storage(settings: &Settings) -> Vec<CheckResult> {
    if settings.vector_store.provider == "memory" {
        return vec![CheckResult::warning(
            "Vector store",
            "in-memory (records are lost on exit)",
            "Set vector_store.provider = \"sqlite\" to persist",
        )];
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        vec![CheckResult::ok(
            "Database",
            &format!("{} ({})", db_path.display(), size),
        )]
    } else {
        vec![CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first ingest",
        )]
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubeq config init",
        )
    }
}

/// Show only the ends of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_hides_secret() {
        assert_eq!(mask("gsk_abcdefghijkl"), "gsk_...ijkl");
        assert_eq!(mask("short"), "****");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_memory_store_warns() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();
        let checks = check_storage(&settings);
        assert_eq!(checks[0].status, CheckStatus::Warning);
    }
}
