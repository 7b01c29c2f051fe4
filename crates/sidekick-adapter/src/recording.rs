// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory page that records every action performed on it.
//!
//! Elements are keyed by the exact selector string an adapter queries. An
//! element may be scheduled to appear only after a number of queries, which
//! stands in for a page that renders its chat input late.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use sidekick_core::{FileAttachment, SidekickError};

use crate::driver::{PageDriver, PageElement};

/// One action performed through the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PageAction {
    SetValue { selector: String, text: String },
    Click { selector: String },
    DispatchFile { selector: String, file_name: String },
    Navigate { url: String },
    Evaluate { script: String },
    Screenshot,
}

#[derive(Debug)]
struct Slot {
    element: PageElement,
    /// Queries that still miss before the element shows up.
    hidden_for: u32,
}

#[derive(Debug, Default)]
struct Page {
    url: String,
    elements: HashMap<String, Slot>,
    values: HashMap<String, String>,
    failing: HashSet<String>,
    actions: Vec<PageAction>,
}

/// A [`PageDriver`] backed by an in-memory element table.
///
/// Clones share the same page.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    page: Arc<Mutex<Page>>,
}

impl RecordingDriver {
    pub fn new(url: impl Into<String>) -> Self {
        let driver = Self::default();
        driver.lock().url = url.into();
        driver
    }

    fn lock(&self) -> MutexGuard<'_, Page> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_element(self, selector: &str, element: PageElement) -> Self {
        self.add_element(selector, element);
        self
    }

    /// The element matches only from the `(queries + 1)`-th query on.
    pub fn with_element_after(self, selector: &str, element: PageElement, queries: u32) -> Self {
        self.lock().elements.insert(
            selector.to_string(),
            Slot {
                element,
                hidden_for: queries,
            },
        );
        self
    }

    /// Interactions with `selector` fail with an adapter error.
    pub fn failing_on(self, selector: &str) -> Self {
        self.lock().failing.insert(selector.to_string());
        self
    }

    pub fn add_element(&self, selector: &str, element: PageElement) {
        self.lock().elements.insert(
            selector.to_string(),
            Slot {
                element,
                hidden_for: 0,
            },
        );
    }

    pub fn remove_element(&self, selector: &str) {
        self.lock().elements.remove(selector);
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    /// Every action so far, in order.
    pub fn actions(&self) -> Vec<PageAction> {
        self.lock().actions.clone()
    }

    /// Last value written to `selector`.
    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.lock().values.get(selector).cloned()
    }

    pub fn clear_actions(&self) {
        self.lock().actions.clear();
    }

    /// Record `action` against `selector`, failing if the element is missing
    /// or marked failing.
    fn interact(&self, selector: &str, action: PageAction) -> Result<(), SidekickError> {
        let mut page = self.lock();
        if page.failing.contains(selector) {
            return Err(SidekickError::adapter(format!(
                "page rejected interaction with {selector}"
            )));
        }
        // File inputs are typically hidden; only their presence matters.
        let needs_interactable = !matches!(action, PageAction::DispatchFile { .. });
        match page.elements.get(selector) {
            Some(slot)
                if slot.hidden_for == 0
                    && (!needs_interactable || slot.element.is_interactable()) => {}
            _ => {
                return Err(SidekickError::adapter(format!(
                    "no interactable element for {selector}"
                )));
            }
        }
        if let PageAction::SetValue { text, .. } = &action {
            page.values.insert(selector.to_string(), text.clone());
        }
        page.actions.push(action);
        Ok(())
    }
}

#[async_trait]
impl PageDriver for RecordingDriver {
    async fn query(&self, selector: &str) -> Option<PageElement> {
        let mut page = self.lock();
        let slot = page.elements.get_mut(selector)?;
        if slot.hidden_for > 0 {
            slot.hidden_for -= 1;
            return None;
        }
        Some(slot.element.clone())
    }

    async fn set_value(&self, selector: &str, text: &str) -> Result<(), SidekickError> {
        self.interact(
            selector,
            PageAction::SetValue {
                selector: selector.to_string(),
                text: text.to_string(),
            },
        )
    }

    async fn click(&self, selector: &str) -> Result<(), SidekickError> {
        self.interact(
            selector,
            PageAction::Click {
                selector: selector.to_string(),
            },
        )
    }

    async fn dispatch_file(
        &self,
        selector: &str,
        file: &FileAttachment,
    ) -> Result<(), SidekickError> {
        self.interact(
            selector,
            PageAction::DispatchFile {
                selector: selector.to_string(),
                file_name: file.name.clone(),
            },
        )
    }

    async fn navigate(&self, url: &str) -> Result<(), SidekickError> {
        let mut page = self.lock();
        page.url = url.to_string();
        page.actions.push(PageAction::Navigate {
            url: url.to_string(),
        });
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SidekickError> {
        self.lock().actions.push(PageAction::Evaluate {
            script: script.to_string(),
        });
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SidekickError> {
        self.lock().actions.push(PageAction::Screenshot);
        Ok(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
    }

    async fn current_url(&self) -> String {
        self.lock().url.clone()
    }
}
