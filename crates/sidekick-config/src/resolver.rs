// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter config resolution: built-in defaults plus validated remote
//! overrides, cached per `(adapter, variant)`.
//!
//! For every section (`selectors`, each `ui.*` sub-section, `features`):
//!
//! - without an override flag the remote values are merged over the defaults,
//!   key by key;
//! - with the flag set the remote section replaces the defaults, but only if
//!   it passes validation, otherwise the merge is used instead.
//!
//! Individual keys listed in `overrides.keys` are applied last. Nothing in
//! here fails: a broken remote payload degrades to defaults, and a source
//! that keeps erroring is retried up to the resolver's [`RetryPolicy`] before
//! the defaults are used.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sidekick_bus::{AdapterConfigUpdated, EventBus, RemoteConfigUpdated, Subscription};
use sidekick_core::{
    retry_until, AdapterConfig, AdapterConfigProvider, OverrideFlags, RetryPolicy,
};
use tracing::{debug, warn};

use crate::defaults::{builtin_adapter_config, CORE_SELECTORS};
use crate::remote::RemoteConfigSource;

/// `remote-config:updated` scope that invalidates every adapter.
pub const ADAPTER_CONFIG_SCOPE: &str = "adapter-config";

type CacheKey = (String, Option<String>);

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, AdapterConfig>,
    /// Bumped by every invalidation; a fetch that straddles one is not cached.
    epoch: u64,
}

type Cache = Arc<Mutex<CacheState>>;

fn lock(cache: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

fn evict(cache: &Cache, adapter_name: Option<&str>) -> usize {
    let mut cache = lock(cache);
    cache.epoch += 1;
    let before = cache.entries.len();
    match adapter_name {
        Some(name) => cache.entries.retain(|(cached, _), _| cached != name),
        None => cache.entries.clear(),
    }
    before - cache.entries.len()
}

fn default_fetch_retry() -> RetryPolicy {
    RetryPolicy::fixed(3, Duration::from_millis(100))
}

pub struct AdapterConfigResolver {
    source: Arc<dyn RemoteConfigSource>,
    cache: Cache,
    retry: RetryPolicy,
    _subscriptions: Vec<Subscription>,
}

impl AdapterConfigResolver {
    /// Resolver fed by `source`, invalidated by config events on `bus`.
    pub fn new(source: Arc<dyn RemoteConfigSource>, bus: &EventBus) -> Self {
        let cache: Cache = Arc::default();

        let remote_cache = Arc::clone(&cache);
        let remote = bus.on::<RemoteConfigUpdated, _>(move |event| {
            for scope in &event.changes {
                let evicted = if scope == ADAPTER_CONFIG_SCOPE {
                    evict(&remote_cache, None)
                } else {
                    evict(&remote_cache, Some(scope))
                };
                debug!(%scope, evicted, "remote config updated; cache invalidated");
            }
        });

        let local_cache = Arc::clone(&cache);
        let local = bus.on::<AdapterConfigUpdated, _>(move |event| {
            let evicted = evict(&local_cache, event.adapter_name.as_deref());
            debug!(
                adapter = ?event.adapter_name,
                evicted,
                "adapter config updated; cache invalidated"
            );
        });

        Self {
            source,
            cache,
            retry: default_fetch_retry(),
            _subscriptions: vec![remote, local],
        }
    }

    /// Retry schedule for failing `fetch` calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Effective config for `adapter_name`. Never fails.
    pub async fn get_adapter_config(
        &self,
        adapter_name: &str,
        variant: Option<&str>,
    ) -> AdapterConfig {
        let key = (adapter_name.to_string(), variant.map(str::to_string));
        let epoch = {
            let cache = lock(&self.cache);
            if let Some(hit) = cache.entries.get(&key) {
                return hit.clone();
            }
            cache.epoch
        };

        let defaults = builtin_adapter_config(adapter_name);
        let what = format!("remote config for {adapter_name}");
        let fetched = retry_until(&self.retry, &what, |attempt| async move {
            match self.source.fetch(adapter_name, variant).await {
                Ok(payload) => Some(payload),
                Err(err) => {
                    debug!(
                        adapter = adapter_name,
                        attempt,
                        error = %err,
                        "remote config fetch failed"
                    );
                    None
                }
            }
        })
        .await;
        let resolved = match fetched {
            Ok(Some(payload)) => resolve(defaults, &payload),
            Ok(None) => defaults,
            Err(err) => {
                warn!(
                    adapter = adapter_name,
                    error = %err,
                    "remote config unavailable; using defaults"
                );
                defaults
            }
        };

        let mut cache = lock(&self.cache);
        if cache.epoch == epoch {
            cache.entries.insert(key, resolved.clone());
        } else {
            debug!(adapter = adapter_name, "config invalidated during fetch; not cached");
        }
        resolved
    }

    /// Drop cached entries for `adapter_name`, or everything.
    pub fn clear_cache(&self, adapter_name: Option<&str>) {
        let evicted = evict(&self.cache, adapter_name);
        debug!(adapter = adapter_name, evicted, "adapter config cache cleared");
    }

    pub fn cached_len(&self) -> usize {
        lock(&self.cache).entries.len()
    }
}

#[async_trait]
impl AdapterConfigProvider for AdapterConfigResolver {
    async fn adapter_config(&self, adapter_name: &str, variant: Option<&str>) -> AdapterConfig {
        self.get_adapter_config(adapter_name, variant).await
    }
}

impl std::fmt::Debug for AdapterConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfigResolver")
            .field("cached", &self.cached_len())
            .finish_non_exhaustive()
    }
}

/// Combine `defaults` with a raw remote payload.
pub fn resolve(defaults: AdapterConfig, payload: &Value) -> AdapterConfig {
    let Some(remote) = payload.as_object() else {
        warn!("remote config payload is not an object; using defaults");
        return defaults;
    };

    let flags: Option<OverrideFlags> = remote
        .get("overrides")
        .and_then(|v| serde_json::from_value(v.clone()).ok());
    let active = flags.clone().unwrap_or_default();
    let empty = Map::new();

    let remote_selectors = object(remote, "selectors").unwrap_or(&empty);
    let remote_ui = object(remote, "ui").unwrap_or(&empty);
    let remote_features = object(remote, "features").unwrap_or(&empty);

    let mut resolved = AdapterConfig {
        selectors: resolve_selectors(&defaults.selectors, remote_selectors, active.selectors),
        ui: resolve_ui(&defaults.ui, remote_ui, active.ui),
        features: resolve_features(&defaults.features, remote_features, active.features),
        version: remote
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(defaults.version),
        overrides: flags,
    };

    for key in &active.keys {
        if !apply_key(&mut resolved, remote, key) {
            debug!(%key, "override key not present in remote payload");
        }
    }
    resolved
}

fn object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

fn string_entries(section: &Map<String, Value>) -> BTreeMap<String, String> {
    section
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

fn resolve_selectors(
    defaults: &BTreeMap<String, String>,
    remote: &Map<String, Value>,
    full_override: bool,
) -> BTreeMap<String, String> {
    let remote = string_entries(remote);
    if full_override {
        let valid = CORE_SELECTORS
            .iter()
            .all(|key| remote.get(*key).is_some_and(|s| !s.trim().is_empty()));
        if valid {
            return remote;
        }
        warn!("selectors override is missing core selectors; merging instead");
    }
    let mut merged = defaults.clone();
    merged.extend(remote);
    merged
}

fn resolve_ui(
    defaults: &BTreeMap<String, Map<String, Value>>,
    remote: &Map<String, Value>,
    full_override: bool,
) -> BTreeMap<String, Map<String, Value>> {
    let mut resolved = defaults.clone();
    for (name, value) in remote {
        let Some(remote_section) = value.as_object() else {
            debug!(section = %name, "ignoring non-object ui section");
            continue;
        };
        let section = resolved.entry(name.clone()).or_default();
        if full_override && ui_section_valid(section, remote_section) {
            *section = remote_section.clone();
        } else {
            if full_override {
                warn!(section = %name, "ui override has too few keys; merging instead");
            }
            section.extend(remote_section.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }
    resolved
}

/// At least half of the default section's keys must be present.
fn ui_section_valid(defaults: &Map<String, Value>, remote: &Map<String, Value>) -> bool {
    let present = defaults.keys().filter(|k| remote.contains_key(*k)).count();
    present * 2 >= defaults.len()
}

fn resolve_features(
    defaults: &BTreeMap<String, bool>,
    remote: &Map<String, Value>,
    full_override: bool,
) -> BTreeMap<String, bool> {
    let mut resolved = if full_override {
        BTreeMap::new()
    } else {
        defaults.clone()
    };
    for (key, value) in remote {
        match value.as_bool() {
            Some(flag) => {
                resolved.insert(key.clone(), flag);
            }
            None => {
                warn!(feature = %key, "non-boolean feature value; keeping default");
                if let Some(default) = defaults.get(key) {
                    resolved.insert(key.clone(), *default);
                }
            }
        }
    }
    resolved
}

/// Apply one `overrides.keys` entry. Returns whether a value was applied.
///
/// Accepted forms: `selectors.<key>`, `features.<key>`, `ui.<section>.<key>`,
/// `<section>.<key>` for a ui section, or a bare key searched in selectors,
/// features, and then every ui section.
fn apply_key(resolved: &mut AdapterConfig, remote: &Map<String, Value>, key: &str) -> bool {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["selectors", name] => apply_selector(resolved, remote, name),
        ["features", name] => apply_feature(resolved, remote, name),
        ["ui", section, name] | [section, name] => apply_ui(resolved, remote, section, name),
        [name] => {
            if apply_selector(resolved, remote, name) || apply_feature(resolved, remote, name) {
                return true;
            }
            let sections: Vec<String> = object(remote, "ui")
                .map(|ui| ui.keys().cloned().collect())
                .unwrap_or_default();
            let mut applied = false;
            for section in &sections {
                applied |= apply_ui(resolved, remote, section, name);
            }
            applied
        }
        _ => false,
    }
}

fn apply_selector(resolved: &mut AdapterConfig, remote: &Map<String, Value>, name: &str) -> bool {
    let value = object(remote, "selectors")
        .and_then(|s| s.get(name))
        .and_then(Value::as_str);
    match value {
        Some(value) => {
            resolved.selectors.insert(name.to_string(), value.to_string());
            true
        }
        None => false,
    }
}

fn apply_feature(resolved: &mut AdapterConfig, remote: &Map<String, Value>, name: &str) -> bool {
    let value = object(remote, "features")
        .and_then(|s| s.get(name))
        .and_then(Value::as_bool);
    match value {
        Some(flag) => {
            resolved.features.insert(name.to_string(), flag);
            true
        }
        None => false,
    }
}

fn apply_ui(
    resolved: &mut AdapterConfig,
    remote: &Map<String, Value>,
    section: &str,
    name: &str,
) -> bool {
    match object(remote, "ui")
        .and_then(|ui| object(ui, section))
        .and_then(|s| s.get(name))
        .filter(|v| !v.is_null())
    {
        Some(value) => {
            resolved
                .ui
                .entry(section.to_string())
                .or_default()
                .insert(name.to_string(), value.clone());
            true
        }
        None => false,
    }
}
