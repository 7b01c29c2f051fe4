// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary between adapters and the live page.
//!
//! Everything an adapter does to a page goes through a [`PageDriver`]. The
//! runtime never touches the DOM itself, so the same adapter code runs over a
//! browser bridge in production and over
//! [`RecordingDriver`](crate::recording::RecordingDriver) in tests and the
//! CLI simulator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sidekick_core::{FileAttachment, SidekickError};

/// What a driver reports about an element matched by a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    /// Lower-case tag name (`textarea`, `button`, ...).
    pub tag: String,
    /// Accessible label or placeholder, when the element has one.
    pub label: Option<String>,
    pub visible: bool,
    pub enabled: bool,
}

impl PageElement {
    /// A visible, enabled element with no label.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            label: None,
            visible: true,
            enabled: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Visible and enabled.
    pub fn is_interactable(&self) -> bool {
        self.visible && self.enabled
    }

    /// Short human-readable description (`textarea "Message"`).
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("{} {label:?}", self.tag),
            None => self.tag.clone(),
        }
    }
}

/// Operations an adapter may perform on the current page.
///
/// Selectors are single CSS selectors; adapters split selector lists and try
/// each entry themselves.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// First element matching `selector`, if any.
    async fn query(&self, selector: &str) -> Option<PageElement>;

    /// Replace the value of an input or editable element and fire input events.
    async fn set_value(&self, selector: &str, text: &str) -> Result<(), SidekickError>;

    async fn click(&self, selector: &str) -> Result<(), SidekickError>;

    /// Deliver `file` to a file input (or drop target) as if the user picked it.
    async fn dispatch_file(
        &self,
        selector: &str,
        file: &FileAttachment,
    ) -> Result<(), SidekickError>;

    async fn navigate(&self, url: &str) -> Result<(), SidekickError>;

    /// Run `script` in the page and return its JSON-serializable result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SidekickError>;

    /// PNG bytes of the visible viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, SidekickError>;

    async fn current_url(&self) -> String;
}

/// Host component of `url`, lower-cased, without userinfo or port.
///
/// Returns `None` for URLs without a `scheme://` prefix or with an empty host.
pub fn host_of(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host_port,
    };
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}
