// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Sidekick integration tests.
//!
//! Provides mock adapters, an event recorder, and a harness that assembles a
//! full runtime without a browser.
//!
//! # Components
//!
//! - [`MockAdapter`] - scripted site adapter with a shared call log
//! - [`RecordingDriver`] - in-memory page for the generic adapter
//! - [`EventRecorder`] - ordered log of every catalog event on a bus
//! - [`TestHarness`] - bus, stores, resolver, registry, and orchestrator wired together

pub mod harness;
pub mod mock_adapter;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sidekick_bus::{
    AdapterActivated, AdapterConfigUpdated, AdapterDeactivated, AutomationPhaseCompleted, Event,
    EventBus, PluginActivated, PluginActivationFailed, PluginDeactivated, PluginRegistered,
    PluginUnregistered, RemoteConfigUpdated, Subscription, ToolExecutionCompleted,
    ToolExecutionFailed, ToolExecutionStarted,
};
use sidekick_config::{AdapterConfigResolver, NoRemoteConfig};
use sidekick_core::{MemoryKeyValueStore, MemoryPreferenceStore, PluginContext, RetryPolicy};

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_adapter::{MockAdapter, MockCall, MockOutcome, RecordedCall};
pub use sidekick_adapter::{PageAction, PageElement, RecordingDriver};

/// Short fixed retry schedule so readiness waits finish quickly in tests.
pub fn test_retry_policy() -> RetryPolicy {
    RetryPolicy::fixed(5, Duration::from_millis(10))
}

/// A context on a fresh bus with in-memory stores and built-in adapter
/// configs (no remote overrides).
pub fn test_context() -> PluginContext {
    let bus = EventBus::new();
    let config = AdapterConfigResolver::new(Arc::new(NoRemoteConfig), &bus);
    PluginContext::new(
        bus,
        Arc::new(MemoryPreferenceStore::default()),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(config),
    )
    .with_retry(test_retry_policy())
}

/// Records the wire name of every catalog event emitted on a bus, in order.
pub struct EventRecorder {
    names: Arc<Mutex<Vec<&'static str>>>,
    _subscriptions: Vec<Subscription>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let names = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = vec![
            record::<PluginRegistered>(bus, &names),
            record::<PluginUnregistered>(bus, &names),
            record::<PluginActivated>(bus, &names),
            record::<PluginDeactivated>(bus, &names),
            record::<PluginActivationFailed>(bus, &names),
            record::<AdapterActivated>(bus, &names),
            record::<AdapterDeactivated>(bus, &names),
            record::<AdapterConfigUpdated>(bus, &names),
            record::<ToolExecutionStarted>(bus, &names),
            record::<ToolExecutionCompleted>(bus, &names),
            record::<ToolExecutionFailed>(bus, &names),
            record::<RemoteConfigUpdated>(bus, &names),
            record::<AutomationPhaseCompleted>(bus, &names),
        ];
        Self {
            names,
            _subscriptions: subscriptions,
        }
    }

    /// Event names seen so far.
    pub fn names(&self) -> Vec<&'static str> {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| **n == name).count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.count(name) > 0
    }

    /// Index of the first `name` event, for ordering assertions.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| *n == name)
    }

    pub fn clear(&self) {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

fn record<E: Event>(bus: &EventBus, names: &Arc<Mutex<Vec<&'static str>>>) -> Subscription {
    let names = names.clone();
    bus.on::<E, _>(move |_| {
        names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(E::NAME);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_sees_events_in_order() {
        let bus = EventBus::new();
        let recorder = EventRecorder::attach(&bus);
        bus.emit(PluginRegistered { name: "a".into() });
        bus.emit(PluginUnregistered { name: "a".into() });

        assert_eq!(recorder.names(), vec!["plugin:registered", "plugin:unregistered"]);
        assert_eq!(recorder.position("plugin:unregistered"), Some(1));
        assert!(!recorder.contains("adapter:activated"));
    }

    #[test]
    fn dropping_recorder_unsubscribes() {
        let bus = EventBus::new();
        let recorder = EventRecorder::attach(&bus);
        drop(recorder);
        assert_eq!(bus.listener_count::<PluginRegistered>(), 0);
    }
}
