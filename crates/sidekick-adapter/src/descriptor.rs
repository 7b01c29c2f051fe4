// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative description of one chat site.

use std::collections::BTreeMap;

use sidekick_core::CapabilitySet;
use sidekick_plugin::{CatalogEntry, PluginConfig};

/// Selector key for the chat input.
pub const CHAT_INPUT: &str = "chatInput";
/// Selector key for the send button.
pub const SUBMIT_BUTTON: &str = "submitButton";
/// Selector key for the hidden file input.
pub const FILE_INPUT: &str = "fileInput";
/// Selector key for the visible attach/upload button.
pub const FILE_UPLOAD_BUTTON: &str = "fileUploadButton";

/// Everything [`GenericAdapter`](crate::GenericAdapter) needs to drive a site.
///
/// `fallbacks` are tried after the resolved config's selectors for the same
/// key, so a stale remote selector does not break the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDescriptor {
    pub config: PluginConfig,
    pub capabilities: CapabilitySet,
    /// Config variant requested from the config provider.
    pub variant: Option<String>,
    pub fallbacks: BTreeMap<String, Vec<String>>,
}

impl SiteDescriptor {
    pub fn new(config: PluginConfig, capabilities: CapabilitySet) -> Self {
        Self {
            config,
            capabilities,
            variant: None,
            fallbacks: BTreeMap::new(),
        }
    }

    pub fn from_catalog(entry: CatalogEntry) -> Self {
        Self::new(entry.config, entry.capabilities)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Append fallback selectors for `key`.
    pub fn with_fallbacks(mut self, key: &str, selectors: &[&str]) -> Self {
        self.fallbacks
            .entry(key.to_string())
            .or_default()
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn fallbacks_for(&self, key: &str) -> &[String] {
        self.fallbacks.get(key).map_or(&[], Vec::as_slice)
    }

    /// Parsed plugin version, `0.0.0` when the config carries an invalid one.
    pub fn version(&self) -> semver::Version {
        semver::Version::parse(&self.config.version).unwrap_or_else(|_| semver::Version::new(0, 0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::Capability;

    #[test]
    fn fallbacks_accumulate_per_key() {
        let descriptor = SiteDescriptor::new(
            PluginConfig::new("demo", "2.1.0"),
            CapabilitySet::from([Capability::TextInsertion]),
        )
        .with_fallbacks(CHAT_INPUT, &["textarea"])
        .with_fallbacks(CHAT_INPUT, &["div[contenteditable]"]);

        assert_eq!(
            descriptor.fallbacks_for(CHAT_INPUT),
            &["textarea".to_string(), "div[contenteditable]".to_string()]
        );
        assert!(descriptor.fallbacks_for(SUBMIT_BUTTON).is_empty());
        assert_eq!(descriptor.version(), semver::Version::new(2, 1, 0));
    }
}
