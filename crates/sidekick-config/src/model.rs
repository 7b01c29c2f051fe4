// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Sidekick runtime.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sidekick_core::{AutomationState, RetryPolicy};

/// Top-level Sidekick configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SidekickConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Initial automation preferences and orchestration timing.
    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    /// Remote adapter-config override source.
    #[serde(default)]
    pub remote_config: RemoteConfigSettings,

    /// Page-readiness polling schedule handed to adapters.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-plugin registration overrides.
    #[serde(default)]
    pub plugins: Vec<PluginSettings>,
}

impl SidekickConfig {
    /// Settings for `name`, if the config has a `[[plugins]]` entry for it.
    pub fn plugin(&self, name: &str) -> Option<&PluginSettings> {
        self.plugins.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    /// Wait between a successful insertion and the automatic submit.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub auto_insert: bool,

    #[serde(default)]
    pub auto_submit: bool,

    #[serde(default)]
    pub auto_execute: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            auto_insert: false,
            auto_submit: false,
            auto_execute: false,
        }
    }
}

impl AutomationConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Preference values to seed the preference store with.
    pub fn initial_state(&self) -> AutomationState {
        AutomationState {
            auto_insert: self.auto_insert,
            auto_submit: self.auto_submit,
            auto_execute: self.auto_execute,
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    800
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Activate the best matching adapter when the host changes.
    #[serde(default = "default_true")]
    pub auto_activate: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_activate: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfigSettings {
    /// When false the resolver uses built-in defaults only.
    #[serde(default)]
    pub enabled: bool,

    /// JSON file standing in for the remote payload endpoint.
    #[serde(default)]
    pub override_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            backoff_factor: self.backoff_factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_max_delay_ms() -> u64 {
    2000
}

/// `[[plugins]]` entry overriding a built-in adapter's registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginSettings {
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replaces the built-in priority when set.
    #[serde(default)]
    pub priority: Option<i32>,

    /// Capability wire names (`file-attachment`, ...) to switch off.
    #[serde(default)]
    pub disabled_capabilities: Vec<String>,
}
