// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static plugin metadata and `plugin.toml` parsing.
//!
//! A [`PluginConfig`] travels with every registration: identity, enablement,
//! priority for host matching, and capability overrides that narrow what the
//! adapter declares.

use serde::{Deserialize, Serialize};
use sidekick_core::{Capability, CapabilitySet, SidekickError};

/// Registration metadata for one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Stable identifier; defaults to `name`.
    pub id: String,
    /// Registration key. Must equal the adapter's `name()`.
    pub name: String,
    pub description: String,
    /// Semantic version string.
    pub version: String,
    pub enabled: bool,
    /// Higher wins when several adapters match the same host.
    pub priority: i32,
    /// Declared capabilities the runtime must not use for this plugin.
    pub disabled_capabilities: CapabilitySet,
    /// Hostnames this adapter handles (`chatgpt.com`, `*.example.com`).
    pub host_patterns: Vec<String>,
}

impl PluginConfig {
    /// Minimal enabled config with `id == name`.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            description: String::new(),
            version: version.into(),
            enabled: true,
            priority: 0,
            disabled_capabilities: CapabilitySet::empty(),
            host_patterns: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_patterns = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn without_capability(mut self, capability: Capability) -> Self {
        self.disabled_capabilities.insert(capability);
        self
    }

    /// Check the config is well-formed.
    pub fn validate(&self) -> Result<(), SidekickError> {
        if self.name.trim().is_empty() {
            return Err(SidekickError::Validation(
                "plugin config: name must not be empty".to_string(),
            ));
        }
        if self.id.trim().is_empty() {
            return Err(SidekickError::Validation(format!(
                "plugin config {}: id must not be empty",
                self.name
            )));
        }
        if semver::Version::parse(&self.version).is_err() {
            return Err(SidekickError::Validation(format!(
                "plugin config {}: version '{}' is not a semantic version",
                self.name, self.version
            )));
        }
        if let Some(bad) = self.host_patterns.iter().find(|p| p.trim().is_empty()) {
            return Err(SidekickError::Validation(format!(
                "plugin config {}: empty host pattern {bad:?}",
                self.name
            )));
        }
        Ok(())
    }

    /// Whether any host pattern matches `host` (case-insensitive).
    ///
    /// `*.example.com` matches subdomains of `example.com` but not the bare
    /// domain; every other pattern must match exactly.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        self.host_patterns.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_lowercase();
            match pattern.strip_prefix("*.") {
                Some(suffix) => host
                    .strip_suffix(suffix)
                    .is_some_and(|prefix| prefix.ends_with('.') && prefix.len() > 1),
                None => host == pattern,
            }
        })
    }
}

/// Intermediate TOML deserialization struct for `plugin.toml`.
#[derive(Debug, Deserialize)]
struct PluginConfigFile {
    plugin: PluginSection,
}

/// The `[plugin]` section of a `plugin.toml` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginSection {
    id: Option<String>,
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    disabled_capabilities: Vec<String>,
    #[serde(default)]
    hosts: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Parse plugin metadata from TOML content.
///
/// Capability names use the wire spelling (`text-insertion`, ...).
pub fn parse_plugin_config(toml_content: &str) -> Result<PluginConfig, SidekickError> {
    let file: PluginConfigFile = toml::from_str(toml_content)
        .map_err(|e| SidekickError::Validation(format!("invalid plugin config: {e}")))?;
    let section = file.plugin;

    let mut disabled_capabilities = CapabilitySet::empty();
    for raw in &section.disabled_capabilities {
        let capability = raw.parse::<Capability>().map_err(|_| {
            SidekickError::Validation(format!(
                "plugin config: unknown capability '{raw}'. Expected one of: text-insertion, form-submission, file-attachment, url-navigation, element-selection, screenshot-capture, dom-manipulation"
            ))
        })?;
        disabled_capabilities.insert(capability);
    }

    let config = PluginConfig {
        id: section.id.unwrap_or_else(|| section.name.clone()),
        name: section.name,
        description: section.description,
        version: section.version,
        enabled: section.enabled,
        priority: section.priority,
        disabled_capabilities,
        host_patterns: section.hosts,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[plugin]
id = "chatgpt-adapter"
name = "chatgpt"
version = "1.2.0"
description = "ChatGPT web adapter"
priority = 10
disabled_capabilities = ["file-attachment"]
hosts = ["chatgpt.com", "chat.openai.com"]
"#;
        let config = parse_plugin_config(toml).unwrap();
        assert_eq!(config.id, "chatgpt-adapter");
        assert_eq!(config.name, "chatgpt");
        assert_eq!(config.priority, 10);
        assert!(config.enabled);
        assert!(config.disabled_capabilities.contains(Capability::FileAttachment));
        assert_eq!(config.host_patterns, vec!["chatgpt.com", "chat.openai.com"]);
    }

    #[test]
    fn parse_minimal_config_defaults_id_to_name() {
        let toml = r#"
[plugin]
name = "gemini"
version = "0.1.0"
"#;
        let config = parse_plugin_config(toml).unwrap();
        assert_eq!(config.id, "gemini");
        assert!(config.enabled);
        assert_eq!(config.priority, 0);
        assert!(config.disabled_capabilities.is_empty());
    }

    #[test]
    fn parse_rejects_unknown_capability() {
        let toml = r#"
[plugin]
name = "bad"
version = "0.1.0"
disabled_capabilities = ["mind-reading"]
"#;
        let err = parse_plugin_config(toml).unwrap_err().to_string();
        assert!(err.contains("unknown capability 'mind-reading'"));
    }

    #[test]
    fn parse_rejects_bad_version() {
        let toml = r#"
[plugin]
name = "bad"
version = "latest"
"#;
        let err = parse_plugin_config(toml).unwrap_err().to_string();
        assert!(err.contains("not a semantic version"));
    }

    #[test]
    fn parse_rejects_unknown_field() {
        let toml = r#"
[plugin]
name = "bad"
version = "0.1.0"
colour = "blue"
"#;
        assert!(parse_plugin_config(toml).is_err());
    }

    #[test]
    fn empty_name_is_invalid() {
        let config = PluginConfig::new("", "0.1.0");
        assert!(config.validate().is_err());
    }

    #[test]
    fn host_matching() {
        let config = PluginConfig::new("x", "0.1.0").with_hosts(["chatgpt.com", "*.example.org"]);
        assert!(config.matches_host("chatgpt.com"));
        assert!(config.matches_host("ChatGPT.com."));
        assert!(config.matches_host("app.example.org"));
        assert!(!config.matches_host("example.org"));
        assert!(!config.matches_host("notchatgpt.com"));
        assert!(!config.matches_host("badexample.org"));
    }
}
