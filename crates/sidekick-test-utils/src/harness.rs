// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end runtime tests.
//!
//! `TestHarness` assembles the bus, in-memory stores, the adapter config
//! resolver over a static remote source, the plugin registry, and the
//! automation orchestrator. Tests drive it by emitting completions or calling
//! the orchestrator directly.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sidekick_automation::{AutomationOrchestrator, AutomationOutcome};
use sidekick_bus::{EventBus, ToolExecutionCompleted};
use sidekick_config::{AdapterConfigResolver, StaticRemoteConfig};
use sidekick_core::{
    AutomationState, MemoryKeyValueStore, MemoryPreferenceStore, PluginContext,
    PreferenceStore, RetryPolicy, SidekickError, ToolExecution,
};
use sidekick_plugin::{PluginConfig, PluginRegistry};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::mock_adapter::MockAdapter;
use crate::{test_retry_policy, EventRecorder};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    automation: AutomationState,
    settle_delay: Option<Duration>,
    retry: RetryPolicy,
    adapters: Vec<(MockAdapter, PluginConfig)>,
    remote: Vec<(String, Option<String>, Value)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            automation: AutomationState::default(),
            settle_delay: None,
            retry: test_retry_policy(),
            adapters: Vec::new(),
            remote: Vec::new(),
        }
    }

    /// Initial automation flags in the preference store.
    pub fn with_automation(mut self, state: AutomationState) -> Self {
        self.automation = state;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register `adapter` with a default config (`0.1.0`, enabled, no hosts).
    pub fn with_adapter(self, adapter: MockAdapter) -> Self {
        let config = PluginConfig::new(sidekick_core::SiteAdapter::name(&adapter), "0.1.0");
        self.with_adapter_config(adapter, config)
    }

    pub fn with_adapter_config(mut self, adapter: MockAdapter, config: PluginConfig) -> Self {
        self.adapters.push((adapter, config));
        self
    }

    /// Seed the static remote config source.
    pub fn with_remote_config(mut self, adapter: &str, variant: Option<&str>, payload: Value) -> Self {
        self.remote
            .push((adapter.to_string(), variant.map(str::to_string), payload));
        self
    }

    /// Build the harness and register every adapter.
    pub fn build(self) -> Result<TestHarness, SidekickError> {
        let bus = EventBus::new();
        let events = EventRecorder::attach(&bus);
        let preferences = Arc::new(MemoryPreferenceStore::new(self.automation));
        let storage = Arc::new(MemoryKeyValueStore::new());

        let remote = Arc::new(StaticRemoteConfig::new());
        for (adapter, variant, payload) in self.remote {
            remote.set(&adapter, variant.as_deref(), payload);
        }
        let resolver = Arc::new(AdapterConfigResolver::new(remote.clone(), &bus));

        let context = PluginContext::new(
            bus.clone(),
            preferences.clone(),
            storage.clone(),
            resolver.clone(),
        )
        .with_retry(self.retry);

        let registry = Arc::new(PluginRegistry::new(context.clone()));
        for (adapter, config) in self.adapters {
            registry.register(Box::new(adapter), config)?;
        }

        let mut orchestrator = AutomationOrchestrator::new(registry.clone(), preferences.clone());
        if let Some(delay) = self.settle_delay {
            orchestrator = orchestrator.with_settle_delay(delay);
        }

        Ok(TestHarness {
            bus,
            context,
            preferences,
            storage,
            remote,
            resolver,
            registry,
            orchestrator: Arc::new(orchestrator),
            events,
        })
    }
}

/// A complete runtime with in-memory services.
pub struct TestHarness {
    pub bus: EventBus,
    /// Context the registry hands (scoped) to adapters.
    pub context: PluginContext,
    pub preferences: Arc<MemoryPreferenceStore>,
    pub storage: Arc<MemoryKeyValueStore>,
    /// Remote payloads served to the resolver.
    pub remote: Arc<StaticRemoteConfig>,
    pub resolver: Arc<AdapterConfigResolver>,
    pub registry: Arc<PluginRegistry>,
    pub orchestrator: Arc<AutomationOrchestrator>,
    /// Every event emitted since the harness was built.
    pub events: EventRecorder,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn set_automation(&self, state: AutomationState) {
        self.preferences.set_automation_state(state);
    }

    /// Run the orchestrator directly for one completion.
    pub async fn complete(&self, execution: ToolExecution) -> AutomationOutcome {
        self.orchestrator.handle_completion(&execution).await
    }

    /// Publish a completion on the bus, as the tool pipeline would.
    pub fn emit_completion(&self, execution: ToolExecution) -> usize {
        self.bus.emit(ToolExecutionCompleted { execution })
    }

    /// Start the orchestrator's event loop on a background task.
    ///
    /// The loop subscribes before the returned future first polls, so yield
    /// (or sleep) once before emitting completions.
    pub fn spawn_orchestrator(&self) -> (CancellationToken, JoinHandle<()>) {
        let cancel = CancellationToken::new();
        let orchestrator = self.orchestrator.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { orchestrator.run(token).await });
        (cancel, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::Capability;

    #[tokio::test]
    async fn builder_registers_adapters() {
        let harness = TestHarness::builder()
            .with_adapter(MockAdapter::new("alpha", [Capability::TextInsertion]))
            .with_adapter(MockAdapter::new("beta", [Capability::TextInsertion]))
            .build()
            .unwrap();

        assert_eq!(harness.registry.len(), 2);
        assert_eq!(harness.events.count("plugin:registered"), 2);
        assert_eq!(harness.orchestrator.settle_delay(), Duration::from_millis(800));
    }

    #[test]
    fn duplicate_adapter_fails_build() {
        let result = TestHarness::builder()
            .with_adapter(MockAdapter::new("alpha", [Capability::TextInsertion]))
            .with_adapter(MockAdapter::new("alpha", [Capability::TextInsertion]))
            .build();
        assert!(matches!(result, Err(SidekickError::Validation(_))));
    }
}
