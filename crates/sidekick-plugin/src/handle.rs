// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capability gate between callers and an adapter.
//!
//! An [`AdapterHandle`] is built once per registration from the adapter's
//! declared capabilities minus the config's disabled ones. Every capability
//! call goes through it:
//!
//! - an undeclared capability returns `false` / `None` without reaching the
//!   adapter;
//! - an adapter `Err` or panic is logged, published as
//!   `tool:execution-failed`, and converted to `false` / `None`.
//!
//! Nothing a capability method does can propagate past this boundary.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use sidekick_bus::{EventBus, ToolExecutionFailed};
use sidekick_core::{
    AdapterStatus, Capability, CapabilitySet, ElementHandle, FileAttachment, Screenshot,
    SidekickError, SiteAdapter,
};
use tracing::{debug, warn};

/// Shared, capability-checked reference to a registered adapter.
#[derive(Clone)]
pub struct AdapterHandle {
    name: Arc<str>,
    adapter: Arc<dyn SiteAdapter>,
    capabilities: CapabilitySet,
    bus: EventBus,
    call_id: Option<String>,
}

impl AdapterHandle {
    pub(crate) fn new(
        adapter: Arc<dyn SiteAdapter>,
        capabilities: CapabilitySet,
        bus: EventBus,
    ) -> Self {
        Self {
            name: Arc::from(adapter.name()),
            adapter,
            capabilities,
            bus,
            call_id: None,
        }
    }

    /// A copy of this handle that tags failure events with `call_id`.
    pub fn for_call(&self, call_id: Option<&str>) -> AdapterHandle {
        AdapterHandle {
            call_id: call_id.map(str::to_string),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective capabilities (declared minus disabled by config).
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn status(&self) -> AdapterStatus {
        self.adapter.status()
    }

    pub(crate) fn adapter(&self) -> &Arc<dyn SiteAdapter> {
        &self.adapter
    }

    /// Page support check. A panicking adapter counts as unsupported.
    pub async fn is_supported(&self) -> bool {
        match AssertUnwindSafe(self.adapter.is_supported()).catch_unwind().await {
            Ok(supported) => supported,
            Err(_) => {
                warn!(adapter = %self.name, "is_supported panicked");
                false
            }
        }
    }

    pub async fn insert_text(&self, text: &str) -> bool {
        self.guarded(Capability::TextInsertion, "insert_text", false, || {
            self.adapter.insert_text(text)
        })
        .await
    }

    pub async fn submit_form(&self) -> bool {
        self.guarded(Capability::FormSubmission, "submit_form", false, || {
            self.adapter.submit_form()
        })
        .await
    }

    pub async fn attach_file(&self, file: &FileAttachment) -> bool {
        self.guarded(Capability::FileAttachment, "attach_file", false, || {
            self.adapter.attach_file(file)
        })
        .await
    }

    pub async fn capture_screenshot(&self) -> Option<Screenshot> {
        self.guarded(Capability::ScreenshotCapture, "capture_screenshot", None, || {
            self.adapter.capture_screenshot()
        })
        .await
    }

    pub async fn select_element(&self, selector: &str) -> Option<ElementHandle> {
        self.guarded(Capability::ElementSelection, "select_element", None, || {
            self.adapter.select_element(selector)
        })
        .await
    }

    pub async fn navigate_to_url(&self, url: &str) -> bool {
        self.guarded(Capability::UrlNavigation, "navigate_to_url", false, || {
            self.adapter.navigate_to_url(url)
        })
        .await
    }

    pub async fn execute_script(&self, script: &str) -> bool {
        self.guarded(Capability::DomManipulation, "execute_script", false, || {
            self.adapter.execute_script(script)
        })
        .await
    }

    async fn guarded<T, F, Fut>(
        &self,
        capability: Capability,
        operation: &'static str,
        fallback: T,
        call: F,
    ) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SidekickError>>,
    {
        if !self.capabilities.contains(capability) {
            let err = SidekickError::CapabilityUnsupported {
                adapter: self.name.to_string(),
                capability,
            };
            warn!(operation, "{err}");
            return fallback;
        }

        match AssertUnwindSafe(call()).catch_unwind().await {
            Ok(Ok(value)) => {
                debug!(adapter = %self.name, operation, "capability call completed");
                value
            }
            Ok(Err(err)) => {
                self.report_failure(operation, err.to_string());
                fallback
            }
            Err(_) => {
                self.report_failure(operation, format!("adapter panicked during {operation}"));
                fallback
            }
        }
    }

    fn report_failure(&self, operation: &str, error: String) {
        warn!(adapter = %self.name, operation, error = %error, "capability call failed");
        self.bus.emit(ToolExecutionFailed {
            tool_name: format!("{}.{operation}", self.name),
            error,
            call_id: self.call_id.clone(),
        });
    }
}

impl std::fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterHandle")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("call_id", &self.call_id)
            .finish()
    }
}
