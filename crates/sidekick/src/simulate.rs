// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `sidekick simulate` command.
//!
//! Builds the full runtime over a [`RecordingDriver`] whose page carries the
//! elements the matching site's resolved config points at, activates the
//! adapter for the host, publishes one completed tool execution, and reports
//! what the automation sequence did to the page.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sidekick_adapter::descriptor::{CHAT_INPUT, FILE_INPUT, SUBMIT_BUTTON};
use sidekick_adapter::{
    site_descriptor, PageAction, PageElement, RecordingDriver, LAST_ACTIVE_KEY,
};
use sidekick_bus::{AutomationPhaseCompleted, ToolExecutionCompleted, ToolExecutionFailed};
use sidekick_config::SidekickConfig;
use sidekick_core::{wait_for, KeyValueStore, RetryPolicy, SidekickError, ToolExecution};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::runtime::Runtime;

/// What one simulated completion did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub host: String,
    /// Adapter active when the completion arrived.
    pub adapter: Option<String>,
    pub call_id: String,
    pub phases: Vec<AutomationPhaseCompleted>,
    pub failures: Vec<ToolExecutionFailed>,
    pub actions: Vec<PageAction>,
    /// Activation record the adapter left in storage.
    pub last_active: Option<serde_json::Value>,
}

/// Simulate one tool completion arriving while the user is on `host`.
pub async fn run_simulation(
    config: &SidekickConfig,
    host: &str,
    result: &str,
    skip_check: bool,
) -> Result<SimulationReport, SidekickError> {
    let driver = RecordingDriver::new(format!("https://{host}/"));
    let runtime = Runtime::build(config, Arc::new(driver.clone()))?;

    if let Some(name) = runtime.registry.adapter_for_host(host) {
        populate_page(&runtime, &driver, &name).await;
    }

    let adapter = if config.registry.auto_activate {
        runtime.registry.activate_for_host(host).await?
    } else {
        warn!("registry.auto_activate is off; no adapter activated");
        None
    };
    driver.clear_actions();

    let call_id = format!("sim-{}", uuid::Uuid::new_v4());
    let execution = ToolExecution {
        result: Some(result.to_string()),
        skip_auto_insert_check: skip_check,
        call_id: Some(call_id.clone()),
        function_name: Some("simulate".to_string()),
        ..ToolExecution::default()
    };

    let (_phase_sub, mut phases) = runtime.bus.channel::<AutomationPhaseCompleted>();
    let (_failure_sub, mut failures) = runtime.bus.channel::<ToolExecutionFailed>();
    complete_once(&runtime, execution).await?;

    let report = SimulationReport {
        host: host.to_string(),
        adapter,
        call_id,
        phases: drain(&mut phases),
        failures: drain(&mut failures),
        actions: driver.actions(),
        last_active: runtime.storage.get(LAST_ACTIVE_KEY),
    };
    info!(
        adapter = ?report.adapter,
        actions = report.actions.len(),
        "simulation finished"
    );
    Ok(report)
}

/// Put the elements the adapter will look for onto the page.
async fn populate_page(runtime: &Runtime, driver: &RecordingDriver, name: &str) {
    let Some(descriptor) = site_descriptor(name) else {
        return;
    };
    let resolved = runtime
        .resolver
        .get_adapter_config(name, descriptor.variant.as_deref())
        .await;

    let elements = [
        (CHAT_INPUT, PageElement::new("textarea").with_label("Message")),
        (SUBMIT_BUTTON, PageElement::new("button").with_label("Send")),
        (FILE_INPUT, PageElement::new("input").hidden()),
    ];
    for (key, element) in elements {
        let selector = resolved
            .selector_list(key)
            .first()
            .map(|s| s.to_string())
            .or_else(|| descriptor.fallbacks_for(key).first().cloned());
        if let Some(selector) = selector {
            driver.add_element(&selector, element);
        }
    }
}

/// Run the orchestrator loop for exactly one published completion.
async fn complete_once(runtime: &Runtime, execution: ToolExecution) -> Result<(), SidekickError> {
    let baseline = runtime.bus.listener_count::<ToolExecutionCompleted>();
    let cancel = CancellationToken::new();
    let orchestrator = runtime.orchestrator.clone();
    let token = cancel.clone();
    let task = tokio::spawn(async move { orchestrator.run(token).await });

    let bus = runtime.bus.clone();
    wait_for(
        &RetryPolicy::fixed(50, Duration::from_millis(10)),
        "automation orchestrator",
        || {
            let bus = bus.clone();
            async move { bus.listener_count::<ToolExecutionCompleted>() > baseline }
        },
    )
    .await?;

    runtime.bus.emit(ToolExecutionCompleted { execution });
    cancel.cancel();
    task.await
        .map_err(|e| SidekickError::Internal(format!("orchestrator task failed: {e}")))
}

fn drain<T>(receiver: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = receiver.try_recv() {
        items.push(item);
    }
    items
}
