// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sources of remote adapter-config payloads.
//!
//! The transport is not this crate's concern; a source only hands back the
//! raw JSON payload for one adapter. Payload documents are objects keyed by
//! adapter name, with `"<adapter>/<variant>"` keys for variants.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use sidekick_core::SidekickError;

/// Channel delivering remote override payloads.
#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    /// Payload for `adapter_name` (and `variant`), `Ok(None)` when the remote
    /// has nothing for it.
    async fn fetch(
        &self,
        adapter_name: &str,
        variant: Option<&str>,
    ) -> Result<Option<Value>, SidekickError>;
}

fn variant_key(adapter_name: &str, variant: &str) -> String {
    format!("{adapter_name}/{variant}")
}

/// Pick the variant entry if present, else the plain adapter entry.
fn select<'a>(
    document: &'a serde_json::Map<String, Value>,
    adapter_name: &str,
    variant: Option<&str>,
) -> Option<&'a Value> {
    variant
        .and_then(|v| document.get(&variant_key(adapter_name, v)))
        .or_else(|| document.get(adapter_name))
}

/// No remote configuration at all.
#[derive(Debug, Default)]
pub struct NoRemoteConfig;

#[async_trait]
impl RemoteConfigSource for NoRemoteConfig {
    async fn fetch(&self, _: &str, _: Option<&str>) -> Result<Option<Value>, SidekickError> {
        Ok(None)
    }
}

/// In-memory payloads, replaceable at runtime.
#[derive(Debug, Default)]
pub struct StaticRemoteConfig {
    document: RwLock<serde_json::Map<String, Value>>,
}

impl StaticRemoteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the payload for `adapter_name`, or for one of its variants.
    pub fn set(&self, adapter_name: &str, variant: Option<&str>, payload: Value) {
        let key = match variant {
            Some(v) => variant_key(adapter_name, v),
            None => adapter_name.to_string(),
        };
        self.document
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, payload);
    }

    pub fn clear(&self) {
        self.document
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl RemoteConfigSource for StaticRemoteConfig {
    async fn fetch(
        &self,
        adapter_name: &str,
        variant: Option<&str>,
    ) -> Result<Option<Value>, SidekickError> {
        let document = self.document.read().unwrap_or_else(PoisonError::into_inner);
        Ok(select(&document, adapter_name, variant).cloned())
    }
}

/// Payloads read from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileRemoteConfig {
    path: PathBuf,
}

impl FileRemoteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RemoteConfigSource for FileRemoteConfig {
    async fn fetch(
        &self,
        adapter_name: &str,
        variant: Option<&str>,
    ) -> Result<Option<Value>, SidekickError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SidekickError::RemoteConfig(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|e| {
            SidekickError::RemoteConfig(format!("invalid JSON in {}: {e}", self.path.display()))
        })?;
        let Value::Object(document) = document else {
            return Err(SidekickError::RemoteConfig(format!(
                "{} must contain a JSON object keyed by adapter name",
                self.path.display()
            )));
        };
        Ok(select(&document, adapter_name, variant).cloned())
    }
}
