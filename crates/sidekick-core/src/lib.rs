// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Sidekick adapter runtime.
//!
//! This crate defines the capability contract ([`SiteAdapter`]) that every
//! site adapter implements, the [`PluginContext`] dependency bundle handed to
//! adapters, the shared error type, and the bounded retry utility used for
//! page-readiness polling.

pub mod adapter_config;
pub mod context;
pub mod error;
pub mod retry;
pub mod store;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use adapter_config::{AdapterConfig, OverrideFlags};
pub use context::PluginContext;
pub use error::SidekickError;
pub use retry::{retry_until, wait_for, RetryPolicy};
pub use store::{MemoryKeyValueStore, MemoryPreferenceStore};
pub use traits::{AdapterConfigProvider, KeyValueStore, PreferenceStore, SiteAdapter};
pub use types::{
    AdapterStatus, AutomationState, Capability, CapabilitySet, ElementHandle, FileAttachment,
    PluginStatus, Screenshot, ToolExecution,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidekick_error_messages() {
        let err = SidekickError::CapabilityUnsupported {
            adapter: "gemini".into(),
            capability: Capability::FileAttachment,
        };
        assert_eq!(err.to_string(), "adapter gemini does not support file-attachment");

        let err = SidekickError::Transient {
            message: "timed out waiting for chat input".into(),
            attempts: 10,
        };
        assert!(err.to_string().contains("10 attempts"));

        let err = SidekickError::lifecycle("chatgpt", "plugin is disabled");
        assert_eq!(err.to_string(), "lifecycle error for chatgpt: plugin is disabled");
    }

    #[test]
    fn all_service_traits_are_object_safe() {
        // Compiles only if every trait can be used behind `dyn`.
        fn _site_adapter(_: &dyn SiteAdapter) {}
        fn _preferences(_: &dyn PreferenceStore) {}
        fn _storage(_: &dyn KeyValueStore) {}
        fn _config(_: &dyn AdapterConfigProvider) {}
    }
}
