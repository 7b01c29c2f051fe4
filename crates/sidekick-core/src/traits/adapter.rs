// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability contract every site adapter implements.

use async_trait::async_trait;

use crate::context::PluginContext;
use crate::error::SidekickError;
use crate::types::{AdapterStatus, CapabilitySet, ElementHandle, FileAttachment, Screenshot};

/// A unit that drives one target chat site.
///
/// Lifecycle methods are called by the plugin registry only. Capability
/// methods are optional: the defaults report "not done" (`false` / `None`),
/// which is also what an adapter must return when invoked for a capability it
/// did not declare in [`capabilities`](SiteAdapter::capabilities).
///
/// Callers never invoke capability methods directly; they go through the
/// registry's `AdapterHandle`, which checks the declared set first and turns
/// `Err` results into `false` / `None`.
#[async_trait]
pub trait SiteAdapter: Send + Sync + 'static {
    /// Registration key of this adapter (`"chatgpt"`, `"gemini"`, ...).
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Declared capabilities. Must return the same set for the adapter's
    /// whole lifetime.
    fn capabilities(&self) -> CapabilitySet;

    /// Receives the shared services bundle. Called before every activation.
    async fn initialize(&self, context: PluginContext) -> Result<(), SidekickError>;

    async fn activate(&self) -> Result<(), SidekickError>;

    async fn deactivate(&self) -> Result<(), SidekickError>;

    /// Release everything acquired in `initialize`. Called once on unregister.
    async fn cleanup(&self) -> Result<(), SidekickError>;

    /// Whether the adapter can operate on the current page.
    async fn is_supported(&self) -> bool;

    fn status(&self) -> AdapterStatus;

    async fn insert_text(&self, _text: &str) -> Result<bool, SidekickError> {
        Ok(false)
    }

    async fn submit_form(&self) -> Result<bool, SidekickError> {
        Ok(false)
    }

    async fn attach_file(&self, _file: &FileAttachment) -> Result<bool, SidekickError> {
        Ok(false)
    }

    async fn capture_screenshot(&self) -> Result<Option<Screenshot>, SidekickError> {
        Ok(None)
    }

    async fn select_element(&self, _selector: &str) -> Result<Option<ElementHandle>, SidekickError> {
        Ok(None)
    }

    async fn navigate_to_url(&self, _url: &str) -> Result<bool, SidekickError> {
        Ok(false)
    }

    async fn execute_script(&self, _script: &str) -> Result<bool, SidekickError> {
        Ok(false)
    }
}
