// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One adapter implementation for every site, parameterized by a
//! [`SiteDescriptor`] and a [`PageDriver`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sidekick_core::{
    retry_until, AdapterConfig, AdapterStatus, Capability, CapabilitySet, ElementHandle,
    FileAttachment,
    PluginContext, Screenshot, SidekickError, SiteAdapter,
};
use tracing::{debug, info, warn, Instrument};

use crate::descriptor::{SiteDescriptor, CHAT_INPUT, FILE_INPUT, FILE_UPLOAD_BUTTON, SUBMIT_BUTTON};
use crate::driver::{host_of, PageDriver};

/// Storage key recording the most recently activated adapter.
pub const LAST_ACTIVE_KEY: &str = "adapter.lastActive";

struct State {
    status: AdapterStatus,
    context: Option<PluginContext>,
    config: Option<AdapterConfig>,
}

/// A [`SiteAdapter`] driven entirely by data.
pub struct GenericAdapter {
    descriptor: SiteDescriptor,
    driver: Arc<dyn PageDriver>,
    state: Mutex<State>,
}

impl GenericAdapter {
    pub fn new(descriptor: SiteDescriptor, driver: Arc<dyn PageDriver>) -> Self {
        Self {
            descriptor,
            driver,
            state: Mutex::new(State {
                status: AdapterStatus::Uninitialized,
                context: None,
                config: None,
            }),
        }
    }

    pub fn descriptor(&self) -> &SiteDescriptor {
        &self.descriptor
    }

    /// Configuration resolved during the last `initialize`.
    pub fn config(&self) -> Option<AdapterConfig> {
        self.lock().config.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: AdapterStatus) {
        self.lock().status = status;
    }

    /// Whether the descriptor declares `capability`. Undeclared calls are no-ops.
    fn declares(&self, capability: Capability) -> bool {
        let declared = self.descriptor.capabilities.contains(capability);
        if !declared {
            debug!(adapter = self.name(), %capability, "capability not declared");
        }
        declared
    }

    /// Feature flags default to on until a config says otherwise.
    fn feature_enabled(&self, name: &str) -> bool {
        self.lock()
            .config
            .as_ref()
            .and_then(|c| c.features.get(name).copied())
            .unwrap_or(true)
    }

    /// Config selectors for `key` first, then descriptor fallbacks, deduplicated.
    fn candidates(&self, key: &str) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .lock()
            .config
            .as_ref()
            .map(|c| c.selector_list(key).into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        for fallback in self.descriptor.fallbacks_for(key) {
            if !candidates.contains(fallback) {
                candidates.push(fallback.clone());
            }
        }
        candidates
    }

    /// First candidate selector for `key` that matches a usable element.
    ///
    /// File inputs are usually hidden, so `require_interactable` is off for them.
    async fn locate(&self, key: &str, require_interactable: bool) -> Option<String> {
        for selector in self.candidates(key) {
            match self.driver.query(&selector).await {
                Some(element) if !require_interactable || element.is_interactable() => {
                    return Some(selector);
                }
                Some(_) => debug!(adapter = self.name(), %selector, "element not interactable"),
                None => {}
            }
        }
        None
    }
}

#[async_trait]
impl SiteAdapter for GenericAdapter {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn version(&self) -> semver::Version {
        self.descriptor.version()
    }

    fn capabilities(&self) -> CapabilitySet {
        self.descriptor.capabilities
    }

    async fn initialize(&self, context: PluginContext) -> Result<(), SidekickError> {
        let span = context.span.clone();
        async move {
            let config = context
                .config
                .adapter_config(self.name(), self.descriptor.variant.as_deref())
                .await;
            let waiting = config.feature("enableElementWaiting");
            {
                let mut state = self.lock();
                state.config = Some(config);
                state.context = Some(context.clone());
            }

            let found = if waiting {
                retry_until(&context.retry, "chat input", |_| self.locate(CHAT_INPUT, true)).await
            } else {
                self.locate(CHAT_INPUT, true).await.ok_or_else(|| {
                    SidekickError::adapter(format!("{}: chat input not found", self.name()))
                })
            };

            match found {
                Ok(selector) => {
                    debug!(%selector, "chat input located");
                    self.set_status(AdapterStatus::Ready);
                    Ok(())
                }
                Err(err) => {
                    self.set_status(AdapterStatus::Failed(err.to_string()));
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn activate(&self) -> Result<(), SidekickError> {
        let Some(context) = self.lock().context.clone() else {
            return Err(SidekickError::lifecycle(self.name(), "activated before initialize"));
        };
        let url = self.driver.current_url().await;
        context.storage.set(
            LAST_ACTIVE_KEY,
            json!({ "name": self.name(), "url": url, "at": Utc::now().to_rfc3339() }),
        );
        self.set_status(AdapterStatus::Active);
        info!(parent: &context.span, %url, "site adapter active");
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), SidekickError> {
        self.set_status(AdapterStatus::Ready);
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), SidekickError> {
        let mut state = self.lock();
        state.context = None;
        state.config = None;
        state.status = AdapterStatus::Uninitialized;
        Ok(())
    }

    async fn is_supported(&self) -> bool {
        let url = self.driver.current_url().await;
        host_of(&url).is_some_and(|host| self.descriptor.config.matches_host(&host))
    }

    fn status(&self) -> AdapterStatus {
        self.lock().status.clone()
    }

    async fn insert_text(&self, text: &str) -> Result<bool, SidekickError> {
        if !self.declares(Capability::TextInsertion) {
            return Ok(false);
        }
        let Some(selector) = self.locate(CHAT_INPUT, true).await else {
            warn!(adapter = self.name(), "no chat input on the page");
            return Ok(false);
        };
        self.driver.set_value(&selector, text).await?;
        debug!(adapter = self.name(), %selector, chars = text.chars().count(), "text inserted");
        Ok(true)
    }

    async fn submit_form(&self) -> Result<bool, SidekickError> {
        if !self.declares(Capability::FormSubmission) {
            return Ok(false);
        }
        if !self.feature_enabled("enableAutoSubmit") {
            debug!(adapter = self.name(), "submit disabled by config");
            return Ok(false);
        }
        let Some(selector) = self.locate(SUBMIT_BUTTON, true).await else {
            warn!(adapter = self.name(), "no usable submit button");
            return Ok(false);
        };
        self.driver.click(&selector).await?;
        Ok(true)
    }

    async fn attach_file(&self, file: &FileAttachment) -> Result<bool, SidekickError> {
        if !self.declares(Capability::FileAttachment) {
            return Ok(false);
        }
        if !self.feature_enabled("enableFileUpload") {
            debug!(adapter = self.name(), "file upload disabled by config");
            return Ok(false);
        }

        let mut input = self.locate(FILE_INPUT, false).await;
        if input.is_none()
            && let Some(button) = self.locate(FILE_UPLOAD_BUTTON, true).await
        {
            // Some sites only mount the file input after the attach button is pressed.
            self.driver.click(&button).await?;
            input = self.locate(FILE_INPUT, false).await;
        }
        let Some(selector) = input else {
            warn!(adapter = self.name(), file = %file.name, "no file input on the page");
            return Ok(false);
        };

        self.driver.dispatch_file(&selector, file).await?;
        info!(adapter = self.name(), file = %file.name, bytes = file.data.len(), "file attached");
        Ok(true)
    }

    async fn capture_screenshot(&self) -> Result<Option<Screenshot>, SidekickError> {
        if !self.declares(Capability::ScreenshotCapture) {
            return Ok(None);
        }
        let data = self.driver.screenshot().await?;
        Ok(Some(Screenshot {
            mime_type: "image/png".to_string(),
            data,
        }))
    }

    async fn select_element(&self, selector: &str) -> Result<Option<ElementHandle>, SidekickError> {
        if !self.declares(Capability::ElementSelection) {
            return Ok(None);
        }
        Ok(self.driver.query(selector).await.map(|element| ElementHandle {
            selector: selector.to_string(),
            description: element.describe(),
        }))
    }

    async fn navigate_to_url(&self, url: &str) -> Result<bool, SidekickError> {
        if !self.declares(Capability::UrlNavigation) {
            return Ok(false);
        }
        self.driver.navigate(url).await?;
        Ok(true)
    }

    async fn execute_script(&self, script: &str) -> Result<bool, SidekickError> {
        if !self.declares(Capability::DomManipulation) {
            return Ok(false);
        }
        self.driver.evaluate(script).await?;
        Ok(true)
    }
}

impl std::fmt::Debug for GenericAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericAdapter")
            .field("name", &self.name())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
