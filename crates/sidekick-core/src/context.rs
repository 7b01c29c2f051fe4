// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dependency bundle handed to every adapter in `initialize`.
//!
//! Adapters reach shared services only through this struct; there are no
//! process-wide singletons.

use std::sync::Arc;

use sidekick_bus::EventBus;
use tracing::Span;

use crate::retry::RetryPolicy;
use crate::traits::{AdapterConfigProvider, KeyValueStore, PreferenceStore};

#[derive(Clone)]
pub struct PluginContext {
    pub bus: EventBus,
    pub preferences: Arc<dyn PreferenceStore>,
    pub storage: Arc<dyn KeyValueStore>,
    pub config: Arc<dyn AdapterConfigProvider>,
    /// Retry schedule for page-readiness polling.
    pub retry: RetryPolicy,
    /// Logging span; adapters attach their events to it.
    pub span: Span,
}

impl PluginContext {
    pub fn new(
        bus: EventBus,
        preferences: Arc<dyn PreferenceStore>,
        storage: Arc<dyn KeyValueStore>,
        config: Arc<dyn AdapterConfigProvider>,
    ) -> Self {
        Self {
            bus,
            preferences,
            storage,
            config,
            retry: RetryPolicy::default(),
            span: Span::current(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// A copy of this context whose span is scoped to one plugin.
    pub fn for_plugin(&self, name: &str) -> PluginContext {
        let span = tracing::info_span!(parent: &self.span, "plugin", name = %name);
        PluginContext {
            span,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("bus", &self.bus)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
