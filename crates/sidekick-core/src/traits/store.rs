// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow accessor traits for the external stores and services adapters use.

use async_trait::async_trait;

use crate::adapter_config::AdapterConfig;
use crate::types::AutomationState;

/// Read/update access to the user's preference store.
pub trait PreferenceStore: Send + Sync {
    /// Current automation flags. Always read fresh; callers must not cache.
    fn automation_state(&self) -> AutomationState;

    fn set_automation_state(&self, state: AutomationState);
}

/// Extension storage (string keys, JSON values).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    fn set(&self, key: &str, value: serde_json::Value);

    fn remove(&self, key: &str) -> Option<serde_json::Value>;
}

/// Source of effective adapter configuration.
///
/// Implementations never fail: any problem with remote data falls back to the
/// built-in defaults.
#[async_trait]
pub trait AdapterConfigProvider: Send + Sync {
    async fn adapter_config(&self, adapter_name: &str, variant: Option<&str>) -> AdapterConfig;
}
