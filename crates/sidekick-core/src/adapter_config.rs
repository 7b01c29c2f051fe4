// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Effective adapter configuration as handed to adapters.
//!
//! The resolution algorithm (defaults + remote overrides) lives in
//! `sidekick-config`; adapters only see the result through the
//! [`AdapterConfigProvider`](crate::traits::AdapterConfigProvider) trait.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Selector name → CSS selector list (comma separated, tried in order).
pub type SelectorMap = BTreeMap<String, String>;

/// UI sub-section name (`typing`, `animations`, ...) → key/value settings.
pub type UiSections = BTreeMap<String, serde_json::Map<String, serde_json::Value>>;

/// Which sections a remote payload fully replaces instead of merging into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideFlags {
    pub selectors: bool,
    pub ui: bool,
    pub features: bool,
    /// Individual keys (`section.key` or bare `key`) applied last.
    pub keys: Vec<String>,
}

impl OverrideFlags {
    pub fn is_empty(&self) -> bool {
        !self.selectors && !self.ui && !self.features && self.keys.is_empty()
    }
}

/// Resolved configuration for one adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub selectors: SelectorMap,
    pub ui: UiSections,
    pub features: BTreeMap<String, bool>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OverrideFlags>,
}

impl AdapterConfig {
    /// The selector list for `key`, split on commas, blanks dropped.
    pub fn selector_list(&self, key: &str) -> Vec<&str> {
        self.selectors
            .get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Feature flag lookup; unknown features are off.
    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    pub fn ui_value(&self, section: &str, key: &str) -> Option<&serde_json::Value> {
        self.ui.get(section).and_then(|s| s.get(key))
    }
}
