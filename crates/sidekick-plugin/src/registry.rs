// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry and lifecycle state machine.
//!
//! The [`PluginRegistry`] owns every [`PluginRegistration`] and the single
//! active-adapter slot. Lifecycle requests (activate, deactivate, unregister,
//! enable/disable) are serialized through a FIFO async lock, so the slot is
//! never occupied by two adapters, even transiently.
//!
//! Adapters must not call back into lifecycle methods from inside their own
//! lifecycle hooks; the request would wait on the lock it is running under.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use sidekick_bus::{
    AdapterActivated, AdapterDeactivated, EventBus, PluginActivated, PluginActivationFailed,
    PluginDeactivated, PluginRegistered, PluginUnregistered,
};
use sidekick_core::{PluginContext, PluginStatus, SidekickError, SiteAdapter};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::handle::AdapterHandle;
use crate::manifest::PluginConfig;

/// One registered adapter with its metadata and lifecycle state.
///
/// Values returned by the registry's read methods are snapshots; mutating
/// them has no effect on the registry.
#[derive(Debug, Clone)]
pub struct PluginRegistration {
    pub config: PluginConfig,
    pub status: PluginStatus,
    /// Last failure, cleared by the next successful transition.
    pub error: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    handle: AdapterHandle,
}

impl PluginRegistration {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Capability-checked handle to the adapter.
    pub fn handle(&self) -> &AdapterHandle {
        &self.handle
    }
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, PluginRegistration>,
    active: Option<String>,
}

/// Registry of site adapters with a single active slot.
pub struct PluginRegistry {
    state: RwLock<RegistryState>,
    lifecycle: Mutex<()>,
    bus: EventBus,
    context: PluginContext,
}

impl PluginRegistry {
    /// Create an empty registry. `context` is handed (scoped per plugin) to
    /// every adapter's `initialize`.
    pub fn new(context: PluginContext) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            lifecycle: Mutex::new(()),
            bus: context.bus.clone(),
            context,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an adapter under `config.name`.
    ///
    /// Fails with [`SidekickError::Validation`] for a malformed config, a name
    /// that differs from the adapter's own, or a duplicate key.
    pub fn register(
        &self,
        plugin: Box<dyn SiteAdapter>,
        config: PluginConfig,
    ) -> Result<(), SidekickError> {
        config.validate()?;
        if plugin.name() != config.name {
            return Err(SidekickError::Validation(format!(
                "plugin config name '{}' does not match adapter name '{}'",
                config.name,
                plugin.name()
            )));
        }

        let adapter: Arc<dyn SiteAdapter> = Arc::from(plugin);
        let declared = adapter.capabilities();
        let effective = declared.without(config.disabled_capabilities);
        let name = config.name.clone();
        let status = if config.enabled {
            PluginStatus::Registered
        } else {
            PluginStatus::Disabled
        };

        {
            let mut state = self.write();
            if state.entries.contains_key(&name) {
                return Err(SidekickError::Validation(format!(
                    "plugin '{name}' is already registered"
                )));
            }
            state.entries.insert(
                name.clone(),
                PluginRegistration {
                    config,
                    status,
                    error: None,
                    registered_at: Utc::now(),
                    last_used_at: None,
                    handle: AdapterHandle::new(adapter, effective, self.bus.clone()),
                },
            );
        }

        info!(plugin = %name, %status, capabilities = %effective, "plugin registered");
        self.bus.emit(PluginRegistered { name });
        Ok(())
    }

    /// Make `name` the active adapter.
    ///
    /// A no-op when it is already active. Any other active adapter is
    /// deactivated first (best effort). On failure the registration moves to
    /// `error`, `plugin:activation-failed` is published, and the error is
    /// returned; the active slot is left empty rather than partially filled.
    pub async fn activate_plugin(&self, name: &str) -> Result<(), SidekickError> {
        let queued = {
            let mut state = self.write();
            let entry = state
                .entries
                .get_mut(name)
                .ok_or_else(|| not_found(name))?;
            let previous = entry.status;
            let pending = previous.can_transition_to(PluginStatus::PendingActivation);
            if pending {
                entry.status = PluginStatus::PendingActivation;
            }
            QueuedActivation {
                registry: self,
                name,
                previous: pending.then_some(previous),
            }
        };

        let _queue = self.lifecycle.lock().await;
        queued.admit();

        let (handle, status) = {
            let state = self.read();
            let entry = state.entries.get(name).ok_or_else(|| not_found(name))?;
            (entry.handle.clone(), entry.status)
        };

        match status {
            PluginStatus::Active => {
                warn!(plugin = %name, "activation requested for already active plugin; ignoring");
                return Ok(());
            }
            PluginStatus::Disabled => {
                let err = SidekickError::lifecycle(name, "plugin is disabled");
                warn!(plugin = %name, "{err}");
                self.bus.emit(PluginActivationFailed {
                    name: name.to_string(),
                    error: err.to_string(),
                });
                return Err(err);
            }
            _ => {}
        }

        let current = self.read().active.clone();
        if let Some(current) = current
            && current != name
        {
            debug!(from = %current, to = %name, "switching active plugin");
            self.deactivate_locked(&current).await;
        }

        self.set_status(name, PluginStatus::Initializing);
        let context = self.context.for_plugin(name);
        let outcome = guard_lifecycle(async {
            handle.adapter().initialize(context).await?;
            self.set_status(name, PluginStatus::Initialized);
            handle.adapter().activate().await
        })
        .await;

        match outcome {
            Ok(()) => {
                {
                    let mut state = self.write();
                    if let Some(entry) = state.entries.get_mut(name) {
                        entry.status = PluginStatus::Active;
                        entry.error = None;
                        entry.last_used_at = Some(Utc::now());
                    }
                    state.active = Some(name.to_string());
                }
                info!(plugin = %name, "plugin activated");
                let timestamp = Utc::now();
                self.bus.emit(AdapterActivated {
                    plugin_name: name.to_string(),
                    timestamp,
                });
                self.bus.emit(PluginActivated {
                    plugin_name: name.to_string(),
                    timestamp,
                });
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                {
                    let mut state = self.write();
                    if let Some(entry) = state.entries.get_mut(name) {
                        entry.status = PluginStatus::Error;
                        entry.error = Some(message.clone());
                    }
                    if state.active.as_deref() == Some(name) {
                        state.active = None;
                    }
                }
                error!(plugin = %name, error = %message, "plugin activation failed");
                self.bus.emit(PluginActivationFailed {
                    name: name.to_string(),
                    error: message,
                });
                Err(err)
            }
        }
    }

    /// Deactivate whichever adapter is active. No-op when the slot is empty.
    pub async fn deactivate_current_plugin(&self) {
        let _queue = self.lifecycle.lock().await;
        let current = self.read().active.clone();
        match current {
            Some(name) => self.deactivate_locked(&name).await,
            None => debug!("no active plugin to deactivate"),
        }
    }

    /// Deactivate `name`. No-op (with a warning) when it is not active.
    pub async fn deactivate(&self, name: &str) -> Result<(), SidekickError> {
        let _queue = self.lifecycle.lock().await;
        let status = self.status_of(name).ok_or_else(|| not_found(name))?;
        if status != PluginStatus::Active {
            warn!(plugin = %name, %status, "deactivation requested for inactive plugin; ignoring");
            return Ok(());
        }
        self.deactivate_locked(name).await;
        Ok(())
    }

    /// Caller must hold the lifecycle lock.
    ///
    /// Adapter failures are recorded on the registration but never stop the
    /// transition to `inactive`, so the slot invariant holds regardless.
    async fn deactivate_locked(&self, name: &str) {
        let handle = {
            let state = self.read();
            match state.entries.get(name) {
                Some(entry) if entry.status == PluginStatus::Active => entry.handle.clone(),
                _ => return,
            }
        };

        let outcome = guard_lifecycle(handle.adapter().deactivate()).await;
        let error = outcome.err().map(|e| e.to_string());

        {
            let mut state = self.write();
            if let Some(entry) = state.entries.get_mut(name) {
                entry.status = PluginStatus::Inactive;
                entry.error = error.clone();
            }
            if state.active.as_deref() == Some(name) {
                state.active = None;
            }
        }

        match error {
            Some(error) => warn!(plugin = %name, %error, "plugin deactivation failed; marked inactive"),
            None => info!(plugin = %name, "plugin deactivated"),
        }

        let timestamp = Utc::now();
        self.bus.emit(AdapterDeactivated {
            plugin_name: name.to_string(),
            timestamp,
        });
        self.bus.emit(PluginDeactivated {
            plugin_name: name.to_string(),
            timestamp,
        });
    }

    /// Remove `name`, deactivating it first if active and then running its
    /// `cleanup`. Cleanup failures are logged, not returned.
    pub async fn unregister(&self, name: &str) -> Result<(), SidekickError> {
        let _queue = self.lifecycle.lock().await;
        let handle = {
            let state = self.read();
            state
                .entries
                .get(name)
                .map(|e| e.handle.clone())
                .ok_or_else(|| not_found(name))?
        };

        self.deactivate_locked(name).await;

        if let Err(err) = guard_lifecycle(handle.adapter().cleanup()).await {
            warn!(plugin = %name, error = %err, "plugin cleanup failed");
        }

        self.write().entries.remove(name);
        info!(plugin = %name, "plugin unregistered");
        self.bus.emit(PluginUnregistered {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Administrative enable/disable.
    ///
    /// Disabling is allowed from `registered`, `inactive`, and `error`; an
    /// active plugin must be deactivated first.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), SidekickError> {
        let _queue = self.lifecycle.lock().await;
        let mut state = self.write();
        let entry = state.entries.get_mut(name).ok_or_else(|| not_found(name))?;

        let next = match (enabled, entry.status) {
            (true, PluginStatus::Disabled) => PluginStatus::Registered,
            (true, _) => {
                entry.config.enabled = true;
                return Ok(());
            }
            (false, PluginStatus::Disabled) => return Ok(()),
            (false, current) if current.can_transition_to(PluginStatus::Disabled) => {
                PluginStatus::Disabled
            }
            (false, current) => {
                return Err(SidekickError::lifecycle(
                    name,
                    format!("cannot disable a plugin in status {current}"),
                ));
            }
        };

        entry.status = next;
        entry.config.enabled = enabled;
        entry.error = None;
        info!(plugin = %name, status = %next, "plugin enablement changed");
        Ok(())
    }

    /// Name of the best adapter for `host`: enabled, matching a host pattern,
    /// highest priority first (ties broken by name).
    pub fn adapter_for_host(&self, host: &str) -> Option<String> {
        self.candidates_for_host(host).into_iter().next().map(|(name, _)| name)
    }

    fn candidates_for_host(&self, host: &str) -> Vec<(String, AdapterHandle)> {
        let state = self.read();
        let mut matches: Vec<&PluginRegistration> = state
            .entries
            .values()
            .filter(|e| {
                e.config.enabled
                    && e.status != PluginStatus::Disabled
                    && e.config.matches_host(host)
            })
            .collect();
        matches.sort_by(|a, b| {
            b.config
                .priority
                .cmp(&a.config.priority)
                .then_with(|| a.config.name.cmp(&b.config.name))
        });
        matches
            .into_iter()
            .map(|e| (e.config.name.clone(), e.handle.clone()))
            .collect()
    }

    /// Activate the best adapter for `host` that reports the page as
    /// supported. Returns the activated name, or `None` when nothing matched.
    pub async fn activate_for_host(&self, host: &str) -> Result<Option<String>, SidekickError> {
        for (name, handle) in self.candidates_for_host(host) {
            if !handle.is_supported().await {
                debug!(plugin = %name, host, "adapter reports page unsupported; trying next");
                continue;
            }
            self.activate_plugin(&name).await?;
            return Ok(Some(name));
        }
        debug!(host, "no adapter matches host");
        Ok(None)
    }

    /// Handle to the active adapter, if any.
    pub fn active_adapter(&self) -> Option<AdapterHandle> {
        self.active_registration().map(|r| r.handle)
    }

    /// Snapshot of the active registration, if any.
    pub fn active_registration(&self) -> Option<PluginRegistration> {
        let state = self.read();
        state
            .active
            .as_ref()
            .and_then(|name| state.entries.get(name))
            .cloned()
    }

    pub fn plugin_by_name(&self, name: &str) -> Option<PluginRegistration> {
        self.read().entries.get(name).cloned()
    }

    pub fn is_plugin_registered(&self, name: &str) -> bool {
        self.read().entries.contains_key(name)
    }

    pub fn status_of(&self, name: &str) -> Option<PluginStatus> {
        self.read().entries.get(name).map(|e| e.status)
    }

    /// All registrations, sorted by name.
    pub fn list_plugins(&self) -> Vec<PluginRegistration> {
        let mut entries: Vec<PluginRegistration> = self.read().entries.values().cloned().collect();
        entries.sort_by(|a, b| a.config.name.cmp(&b.config.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn restore_pending(&self, name: &str, previous: PluginStatus) {
        let mut state = self.write();
        if let Some(entry) = state.entries.get_mut(name)
            && entry.status == PluginStatus::PendingActivation
        {
            entry.status = previous;
            debug!(plugin = %name, status = %previous, "queued activation dropped");
        }
    }

    fn set_status(&self, name: &str, next: PluginStatus) {
        let mut state = self.write();
        if let Some(entry) = state.entries.get_mut(name) {
            if !entry.status.can_transition_to(next) {
                warn!(plugin = %name, from = %entry.status, to = %next, "unexpected status transition");
            }
            entry.status = next;
        }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("PluginRegistry")
            .field("plugins", &state.entries.len())
            .field("active", &state.active)
            .finish()
    }
}

/// An activation request waiting for the lifecycle lock.
///
/// Dropping it before [`admit`](Self::admit) puts the registration back in
/// the status it had before the request marked it pending.
struct QueuedActivation<'a> {
    registry: &'a PluginRegistry,
    name: &'a str,
    previous: Option<PluginStatus>,
}

impl QueuedActivation<'_> {
    fn admit(mut self) {
        self.previous = None;
    }
}

impl Drop for QueuedActivation<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.registry.restore_pending(self.name, previous);
        }
    }
}

fn not_found(name: &str) -> SidekickError {
    SidekickError::PluginNotFound {
        name: name.to_string(),
    }
}

/// Run a lifecycle future, turning a panic into an adapter error.
async fn guard_lifecycle<F>(future: F) -> Result<(), SidekickError>
where
    F: Future<Output = Result<(), SidekickError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(SidekickError::adapter("adapter panicked during lifecycle call")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::{Capability, CapabilitySet};
    use sidekick_test_utils::{test_context, MockAdapter};
    use tracing_test::traced_test;

    fn registry() -> PluginRegistry {
        PluginRegistry::new(test_context())
    }

    fn text_adapter(name: &str) -> MockAdapter {
        MockAdapter::new(name, [Capability::TextInsertion, Capability::FormSubmission])
    }

    #[test]
    fn register_and_lookup() {
        let registry = registry();
        registry
            .register(Box::new(text_adapter("chatgpt")), PluginConfig::new("chatgpt", "1.0.0"))
            .unwrap();

        let entry = registry.plugin_by_name("chatgpt").unwrap();
        assert_eq!(entry.status, PluginStatus::Registered);
        assert!(entry.error.is_none());
        assert!(entry.last_used_at.is_none());
        assert!(registry.is_plugin_registered("chatgpt"));
        assert!(!registry.is_plugin_registered("gemini"));
        assert!(registry.active_adapter().is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = registry();
        registry
            .register(Box::new(text_adapter("chatgpt")), PluginConfig::new("chatgpt", "1.0.0"))
            .unwrap();
        let err = registry
            .register(Box::new(text_adapter("chatgpt")), PluginConfig::new("chatgpt", "1.0.0"))
            .unwrap_err();
        assert!(matches!(err, SidekickError::Validation(msg) if msg.contains("already registered")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn mismatched_name_is_rejected() {
        let registry = registry();
        let err = registry
            .register(Box::new(text_adapter("chatgpt")), PluginConfig::new("gemini", "1.0.0"))
            .unwrap_err();
        assert!(matches!(err, SidekickError::Validation(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn disabled_config_registers_as_disabled() {
        let registry = registry();
        registry
            .register(
                Box::new(text_adapter("chatgpt")),
                PluginConfig::new("chatgpt", "1.0.0").disabled(),
            )
            .unwrap();
        assert_eq!(registry.status_of("chatgpt"), Some(PluginStatus::Disabled));
    }

    #[test]
    fn capability_overrides_narrow_the_handle() {
        let registry = registry();
        registry
            .register(
                Box::new(text_adapter("chatgpt")),
                PluginConfig::new("chatgpt", "1.0.0").without_capability(Capability::FormSubmission),
            )
            .unwrap();
        let entry = registry.plugin_by_name("chatgpt").unwrap();
        assert_eq!(
            entry.handle().capabilities(),
            CapabilitySet::from([Capability::TextInsertion])
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn gated_call_logs_unsupported_capability() {
        let registry = registry();
        registry
            .register(
                Box::new(text_adapter("chatgpt")),
                PluginConfig::new("chatgpt", "1.0.0").without_capability(Capability::FormSubmission),
            )
            .unwrap();
        let handle = registry.plugin_by_name("chatgpt").unwrap().handle().clone();

        assert!(!handle.submit_form().await);
        assert!(logs_contain("adapter chatgpt does not support form-submission"));
    }

    #[test]
    fn list_plugins_is_sorted() {
        let registry = registry();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(Box::new(text_adapter(name)), PluginConfig::new(name, "0.1.0"))
                .unwrap();
        }
        let names: Vec<String> = registry
            .list_plugins()
            .into_iter()
            .map(|r| r.config.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn host_lookup_prefers_priority() {
        let registry = registry();
        registry
            .register(
                Box::new(text_adapter("generic")),
                PluginConfig::new("generic", "0.1.0").with_hosts(["*.example.com"]),
            )
            .unwrap();
        registry
            .register(
                Box::new(text_adapter("special")),
                PluginConfig::new("special", "0.1.0")
                    .with_hosts(["chat.example.com"])
                    .with_priority(5),
            )
            .unwrap();

        assert_eq!(registry.adapter_for_host("chat.example.com").as_deref(), Some("special"));
        assert_eq!(registry.adapter_for_host("docs.example.com").as_deref(), Some("generic"));
        assert!(registry.adapter_for_host("example.net").is_none());
    }

    #[tokio::test]
    async fn dropped_queued_activation_restores_status() {
        let registry = registry();
        registry
            .register(Box::new(text_adapter("chatgpt")), PluginConfig::new("chatgpt", "1.0.0"))
            .unwrap();

        let busy = registry.lifecycle.lock().await;
        {
            let activation = registry.activate_plugin("chatgpt");
            tokio::pin!(activation);
            assert!(futures::poll!(&mut activation).is_pending());
            assert_eq!(registry.status_of("chatgpt"), Some(PluginStatus::PendingActivation));
        }
        drop(busy);

        assert_eq!(registry.status_of("chatgpt"), Some(PluginStatus::Registered));
        registry.set_enabled("chatgpt", false).await.unwrap();
        assert_eq!(registry.status_of("chatgpt"), Some(PluginStatus::Disabled));
    }

    #[tokio::test]
    async fn disable_ahead_of_queued_activation_wins() {
        let registry = registry();
        registry
            .register(Box::new(text_adapter("chatgpt")), PluginConfig::new("chatgpt", "1.0.0"))
            .unwrap();

        let busy = registry.lifecycle.lock().await;
        let disable = registry.set_enabled("chatgpt", false);
        tokio::pin!(disable);
        assert!(futures::poll!(&mut disable).is_pending());
        let activation = registry.activate_plugin("chatgpt");
        tokio::pin!(activation);
        assert!(futures::poll!(&mut activation).is_pending());
        drop(busy);

        disable.await.unwrap();
        assert!(matches!(
            activation.await,
            Err(SidekickError::Lifecycle { .. })
        ));
        assert_eq!(registry.status_of("chatgpt"), Some(PluginStatus::Disabled));
        assert!(registry.active_adapter().is_none());
    }

    #[tokio::test]
    async fn unknown_plugin_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.activate_plugin("ghost").await,
            Err(SidekickError::PluginNotFound { .. })
        ));
        assert!(matches!(
            registry.unregister("ghost").await,
            Err(SidekickError::PluginNotFound { .. })
        ));
    }
}
