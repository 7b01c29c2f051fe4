// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime assembly from a loaded [`SidekickConfig`].

use std::sync::Arc;

use sidekick_adapter::{builtin_descriptors, GenericAdapter, PageDriver, SiteDescriptor};
use sidekick_automation::AutomationOrchestrator;
use sidekick_bus::EventBus;
use sidekick_config::model::PluginSettings;
use sidekick_config::{
    AdapterConfigResolver, FileRemoteConfig, NoRemoteConfig, RemoteConfigSource, SidekickConfig,
};
use sidekick_core::{
    Capability, MemoryKeyValueStore, MemoryPreferenceStore, PluginContext, SidekickError,
};
use sidekick_plugin::PluginRegistry;
use tracing::{debug, info};

/// Every long-lived service of one runtime instance.
pub struct Runtime {
    pub bus: EventBus,
    pub storage: Arc<MemoryKeyValueStore>,
    pub resolver: Arc<AdapterConfigResolver>,
    pub registry: Arc<PluginRegistry>,
    pub orchestrator: Arc<AutomationOrchestrator>,
}

impl Runtime {
    /// Wire the services and register a generic adapter per built-in site.
    pub fn build(config: &SidekickConfig, driver: Arc<dyn PageDriver>) -> Result<Self, SidekickError> {
        let bus = EventBus::new();
        let preferences = Arc::new(MemoryPreferenceStore::new(config.automation.initial_state()));
        let storage = Arc::new(MemoryKeyValueStore::new());
        let resolver = Arc::new(
            AdapterConfigResolver::new(remote_source(config), &bus)
                .with_retry(config.retry.policy()),
        );

        let context = PluginContext::new(
            bus.clone(),
            preferences.clone(),
            storage.clone(),
            resolver.clone(),
        )
        .with_retry(config.retry.policy());

        let registry = Arc::new(PluginRegistry::new(context));
        for descriptor in builtin_descriptors() {
            let settings = config.plugin(descriptor.name());
            let descriptor = apply_settings(descriptor, settings)?;
            let plugin_config = descriptor.config.clone();
            registry.register(
                Box::new(GenericAdapter::new(descriptor, driver.clone())),
                plugin_config,
            )?;
        }
        info!(adapters = registry.len(), "runtime assembled");

        let orchestrator = AutomationOrchestrator::new(registry.clone(), preferences)
            .with_settle_delay(config.automation.settle_delay());

        Ok(Self {
            bus,
            storage,
            resolver,
            registry,
            orchestrator: Arc::new(orchestrator),
        })
    }
}

/// The remote payload source selected by `[remote_config]`.
pub fn remote_source(config: &SidekickConfig) -> Arc<dyn RemoteConfigSource> {
    let remote = &config.remote_config;
    match (&remote.override_file, remote.enabled) {
        (Some(path), true) => {
            debug!(path = %path.display(), "remote config served from file");
            Arc::new(FileRemoteConfig::new(path.clone()))
        }
        _ => Arc::new(NoRemoteConfig),
    }
}

/// Fold a `[[plugins]]` entry into a descriptor's registration config.
pub fn apply_settings(
    mut descriptor: SiteDescriptor,
    settings: Option<&PluginSettings>,
) -> Result<SiteDescriptor, SidekickError> {
    let Some(settings) = settings else {
        return Ok(descriptor);
    };
    descriptor.config.enabled = settings.enabled;
    if let Some(priority) = settings.priority {
        descriptor.config.priority = priority;
    }
    for name in &settings.disabled_capabilities {
        let capability: Capability = name.parse().map_err(|_| {
            SidekickError::Config(format!(
                "plugin {}: unknown capability {name:?}",
                settings.name
            ))
        })?;
        descriptor.config.disabled_capabilities.insert(capability);
    }
    Ok(descriptor)
}
