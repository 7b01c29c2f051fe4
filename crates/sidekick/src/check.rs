// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `sidekick check` command: configuration diagnostics.

use std::time::{Duration, Instant};

use sidekick_config::{RemoteConfigSource, SidekickConfig};
use sidekick_plugin::catalog_entry;

use crate::runtime::remote_source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check against an already validated config.
pub async fn run_checks(config: &SidekickConfig) -> Vec<CheckResult> {
    let mut results = vec![CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        "valid",
        Instant::now(),
    )];
    results.push(check_remote_config(config).await);
    results.push(check_plugin_overrides(config));
    results
}

/// Print `results`; returns the number of failed checks.
pub fn print_results(results: &[CheckResult]) -> usize {
    println!();
    println!("  sidekick check");
    println!("  {}", "-".repeat(50));

    let mut failures = 0;
    let mut warnings = 0;
    for result in results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => {
                warnings += 1;
                "[WARN]"
            }
            CheckStatus::Fail => {
                failures += 1;
                "[FAIL]"
            }
        };
        println!(
            "    {tag} {:<20} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }
    println!();

    let issues = failures + warnings;
    if issues > 0 {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
    failures
}

/// The override file, when enabled, must be a readable JSON object.
async fn check_remote_config(config: &SidekickConfig) -> CheckResult {
    let start = Instant::now();
    let settings = &config.remote_config;
    let Some(path) = settings.override_file.as_ref().filter(|_| settings.enabled) else {
        return CheckResult::new(
            "Remote config",
            CheckStatus::Pass,
            "disabled, built-in defaults only",
            start,
        );
    };

    // Any adapter name exercises the read-and-parse path.
    match remote_source(config).fetch("chatgpt", None).await {
        Ok(_) => CheckResult::new(
            "Remote config",
            CheckStatus::Pass,
            format!("{} readable", path.display()),
            start,
        ),
        Err(err) => CheckResult::new("Remote config", CheckStatus::Fail, err.to_string(), start),
    }
}

/// `[[plugins]]` entries that match no built-in site have no effect.
fn check_plugin_overrides(config: &SidekickConfig) -> CheckResult {
    let start = Instant::now();
    let unknown: Vec<&str> = config
        .plugins
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| catalog_entry(name).is_none())
        .collect();

    if unknown.is_empty() {
        CheckResult::new(
            "Plugin overrides",
            CheckStatus::Pass,
            format!("{} entries", config.plugins.len()),
            start,
        )
    } else {
        CheckResult::new(
            "Plugin overrides",
            CheckStatus::Warn,
            format!("no built-in site named {}", unknown.join(", ")),
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_config::load_config_from_str;

    #[tokio::test]
    async fn default_config_passes_every_check() {
        let results = run_checks(&SidekickConfig::default()).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == CheckStatus::Pass));
    }

    #[tokio::test]
    async fn unknown_plugin_name_warns() {
        let config = load_config_from_str("[[plugins]]\nname = \"chatgtp\"\n").unwrap();
        let results = run_checks(&config).await;
        let overrides = results.iter().find(|r| r.name == "Plugin overrides").unwrap();
        assert_eq!(overrides.status, CheckStatus::Warn);
        assert!(overrides.message.contains("chatgtp"));
    }

    #[tokio::test]
    async fn unreadable_override_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let mut config = SidekickConfig::default();
        config.remote_config.enabled = true;
        config.remote_config.override_file = Some(path);

        let result = check_remote_config(&config).await;

        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("JSON object"), "{}", result.message);
    }

    #[test]
    fn failures_are_counted() {
        let start = Instant::now();
        let results = vec![
            CheckResult::new("a", CheckStatus::Pass, "ok", start),
            CheckResult::new("b", CheckStatus::Warn, "hm", start),
            CheckResult::new("c", CheckStatus::Fail, "no", start),
        ];
        assert_eq!(print_results(&results), 1);
    }
}
