// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express. All errors are collected; nothing
//! fails fast.

use std::collections::HashSet;

use sidekick_core::Capability;
use strum::IntoEnumIterator;

use crate::diagnostic::{suggest_key, ConfigError};
use crate::model::SidekickConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for the settle delay.
const MAX_SETTLE_DELAY_MS: u64 = 60_000;

pub fn validate_config(config: &SidekickConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.runtime.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "runtime.log_level `{}` is not one of {}",
                config.runtime.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.automation.settle_delay_ms > MAX_SETTLE_DELAY_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "automation.settle_delay_ms must be at most {MAX_SETTLE_DELAY_MS}, got {}",
                config.automation.settle_delay_ms
            ),
        });
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }
    if !retry.backoff_factor.is_finite() || retry.backoff_factor < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.backoff_factor must be a finite number >= 1.0, got {}",
                retry.backoff_factor
            ),
        });
    }
    if retry.max_delay_ms < retry.initial_delay_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.max_delay_ms ({}) must not be below retry.initial_delay_ms ({})",
                retry.max_delay_ms, retry.initial_delay_ms
            ),
        });
    }

    if config.remote_config.enabled
        && let Some(path) = &config.remote_config.override_file
        && path.as_os_str().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "remote_config.override_file must not be empty".to_string(),
        });
    }

    let capability_names: Vec<String> = Capability::iter().map(|c| c.to_string()).collect();
    let capability_refs: Vec<&str> = capability_names.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    for (i, plugin) in config.plugins.iter().enumerate() {
        if plugin.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("plugins[{i}].name must not be empty"),
            });
        } else if !seen.insert(plugin.name.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate plugin name `{}` in [[plugins]] array", plugin.name),
            });
        }

        for raw in &plugin.disabled_capabilities {
            if raw.parse::<Capability>().is_err() {
                errors.push(ConfigError::UnknownCapability {
                    name: raw.clone(),
                    location: format!("plugins[{i}].disabled_capabilities"),
                    suggestion: suggest_key(raw, &capability_refs),
                    valid: capability_refs.join(", "),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
