// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store implementations used by the CLI and tests.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::traits::{KeyValueStore, PreferenceStore};
use crate::types::AutomationState;

/// Preference store holding the automation flags in memory.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    state: RwLock<AutomationState>,
}

impl MemoryPreferenceStore {
    pub fn new(state: AutomationState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn automation_state(&self) -> AutomationState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_automation_state(&self, state: AutomationState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Key/value storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: serde_json::Value) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}
