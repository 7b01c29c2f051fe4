// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation orchestrator.
//!
//! Reacts to `tool:execution-completed` by running the optional execution
//! logger, inserting the result (text or file) into the active adapter, and,
//! after a settle delay, submitting the form. Every phase is gated by the
//! user's automation flags, read fresh from the preference store for each
//! completion.
//!
//! Nothing here retries and nothing here fails loudly: adapter failures come
//! back from the capability gate as `false`, are logged, and are published as
//! `automation:phase-completed` with `success: false`.

pub mod execution;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use sidekick_bus::{
    AutomationPhase, AutomationPhaseCompleted, EventBus, ToolExecutionCompleted,
    ToolExecutionFailed,
};
use sidekick_core::{Capability, PluginStatus, PreferenceStore, ToolExecution};
use sidekick_plugin::{AdapterHandle, PluginRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use execution::{ExecutionLogger, StoredExecutionLogger, TracingExecutionLogger};

/// Default wait between a successful insertion and the submit.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(800);

/// What happened to one completion. `None` means the phase did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomationOutcome {
    pub executed: Option<bool>,
    /// Text insertion or file attachment.
    pub inserted: Option<bool>,
    pub submitted: Option<bool>,
}

pub struct AutomationOrchestrator {
    registry: Arc<PluginRegistry>,
    preferences: Arc<dyn PreferenceStore>,
    bus: EventBus,
    settle_delay: Duration,
    execution_logger: Arc<dyn ExecutionLogger>,
}

impl AutomationOrchestrator {
    pub fn new(registry: Arc<PluginRegistry>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            bus: registry.bus().clone(),
            registry,
            preferences,
            settle_delay: DEFAULT_SETTLE_DELAY,
            execution_logger: Arc::new(TracingExecutionLogger),
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_execution_logger(mut self, logger: Arc<dyn ExecutionLogger>) -> Self {
        self.execution_logger = logger;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Consume completions from the bus until `cancel` fires.
    ///
    /// Completions are handled one at a time in arrival order. Completions
    /// already queued when `cancel` fires are still handled.
    pub async fn run(&self, cancel: CancellationToken) {
        let (_subscription, mut completions) = self.bus.channel::<ToolExecutionCompleted>();
        info!(
            settle_delay_ms = self.settle_delay.as_millis() as u64,
            "automation orchestrator running"
        );

        loop {
            tokio::select! {
                biased;
                next = completions.recv() => {
                    match next {
                        Some(event) => {
                            self.handle_completion(&event.execution).await;
                        }
                        None => {
                            debug!("completion channel closed");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping automation orchestrator");
                    break;
                }
            }
        }
    }

    /// Run the automation sequence for one completed tool execution.
    pub async fn handle_completion(&self, execution: &ToolExecution) -> AutomationOutcome {
        let state = self.preferences.automation_state();
        let call_id = execution.call_id.as_deref();
        let mut outcome = AutomationOutcome::default();

        debug!(
            call_id,
            auto_insert = state.auto_insert,
            auto_submit = state.auto_submit,
            auto_execute = state.auto_execute,
            "handling tool completion"
        );

        if state.auto_execute {
            let executed = self.record_execution(execution).await;
            self.publish(AutomationPhase::Execute, executed, call_id);
            outcome.executed = Some(executed);
        }

        if !(state.auto_insert || execution.skip_auto_insert_check) {
            debug!(call_id, "auto insert disabled; leaving result for the user");
            return outcome;
        }

        let Some(adapter) = self.ready_adapter(call_id) else {
            self.publish(AutomationPhase::Insert, false, call_id);
            outcome.inserted = Some(false);
            return outcome;
        };

        let (phase, inserted) = self.insert(&adapter, execution).await;
        self.publish(phase, inserted, call_id);
        outcome.inserted = Some(inserted);
        if !inserted {
            return outcome;
        }

        if !state.auto_submit {
            return outcome;
        }
        if !adapter.supports(Capability::FormSubmission) {
            debug!(adapter = adapter.name(), "adapter cannot submit; skipping auto submit");
            return outcome;
        }

        tokio::time::sleep(self.settle_delay).await;
        let submitted = if self.still_active(adapter.name()) {
            adapter.submit_form().await
        } else {
            warn!(
                adapter = adapter.name(),
                call_id, "adapter no longer active after settle delay; not submitting"
            );
            false
        };
        if submitted {
            info!(adapter = adapter.name(), call_id, "result inserted and submitted");
        }
        self.publish(AutomationPhase::Submit, submitted, call_id);
        outcome.submitted = Some(submitted);
        outcome
    }

    fn still_active(&self, name: &str) -> bool {
        self.registry
            .active_registration()
            .is_some_and(|r| r.name() == name && r.status == PluginStatus::Active)
    }

    /// The active adapter, if it is fully active.
    fn ready_adapter(&self, call_id: Option<&str>) -> Option<AdapterHandle> {
        let error = match self.registry.active_registration() {
            Some(registration) if registration.status == PluginStatus::Active => {
                return Some(registration.handle().for_call(call_id));
            }
            Some(registration) => format!(
                "active adapter {} is not ready ({})",
                registration.name(),
                registration.status
            ),
            None => "no active adapter".to_string(),
        };

        warn!(call_id, "{error}; cannot insert result");
        self.bus.emit(ToolExecutionFailed {
            tool_name: "automation.insert".to_string(),
            error,
            call_id: call_id.map(str::to_string),
        });
        None
    }

    async fn insert(
        &self,
        adapter: &AdapterHandle,
        execution: &ToolExecution,
    ) -> (AutomationPhase, bool) {
        if execution.is_file_attachment
            && let Some(file) = execution.file.as_ref()
            && adapter.supports(Capability::FileAttachment)
        {
            return (AutomationPhase::Attach, adapter.attach_file(file).await);
        }

        match execution.result.as_deref() {
            Some(text) if !text.is_empty() && adapter.supports(Capability::TextInsertion) => {
                (AutomationPhase::Insert, adapter.insert_text(text).await)
            }
            Some(text) if !text.is_empty() => {
                warn!(adapter = adapter.name(), "adapter cannot insert text");
                (AutomationPhase::Insert, false)
            }
            _ => {
                debug!(adapter = adapter.name(), "nothing to insert");
                (AutomationPhase::Insert, false)
            }
        }
    }

    async fn record_execution(&self, execution: &ToolExecution) -> bool {
        match AssertUnwindSafe(self.execution_logger.record(execution))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(error = %err, "execution logger failed");
                false
            }
            Err(_) => {
                warn!("execution logger panicked");
                false
            }
        }
    }

    fn publish(&self, phase: AutomationPhase, success: bool, call_id: Option<&str>) {
        self.bus.emit(AutomationPhaseCompleted {
            phase,
            success,
            call_id: call_id.map(str::to_string),
        });
    }
}

impl std::fmt::Debug for AutomationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationOrchestrator")
            .field("settle_delay", &self.settle_delay)
            .finish_non_exhaustive()
    }
}
