// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry lifecycle and capability gate tests against scripted adapters.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sidekick_bus::{AdapterActivated, AdapterDeactivated, ToolExecutionFailed};
use sidekick_core::{Capability, CapabilitySet, FileAttachment, PluginStatus, SidekickError};
use sidekick_plugin::PluginConfig;
use sidekick_test_utils::{MockAdapter, MockCall, MockOutcome, TestHarness};

fn chat_caps() -> CapabilitySet {
    CapabilitySet::from([Capability::TextInsertion, Capability::FormSubmission])
}

#[tokio::test]
async fn activation_is_idempotent() {
    let adapter = MockAdapter::new("alpha", chat_caps());
    let harness = TestHarness::builder()
        .with_adapter(adapter.clone())
        .build()
        .unwrap();

    harness.registry.activate_plugin("alpha").await.unwrap();
    harness.registry.activate_plugin("alpha").await.unwrap();

    assert_eq!(adapter.count(|c| *c == MockCall::Initialize), 1);
    assert_eq!(adapter.count(|c| *c == MockCall::Activate), 1);
    let active = harness.registry.active_adapter().unwrap();
    assert_eq!(active.name(), "alpha");
    assert_eq!(harness.registry.status_of("alpha"), Some(PluginStatus::Active));
    assert_eq!(harness.events.count("adapter:activated"), 1);
    assert!(harness.registry.plugin_by_name("alpha").unwrap().last_used_at.is_some());
}

#[tokio::test]
async fn activated_adapter_receives_the_shared_bus() {
    let adapter = MockAdapter::new("alpha", chat_caps());
    let harness = TestHarness::builder()
        .with_adapter(adapter.clone())
        .build()
        .unwrap();
    harness.registry.activate_plugin("alpha").await.unwrap();

    let context = adapter.context().expect("initialize received a context");
    context.bus.emit(ToolExecutionFailed {
        tool_name: "probe".into(),
        error: "x".into(),
        call_id: None,
    });
    assert!(harness.events.contains("tool:execution-failed"));
}

#[tokio::test(start_paused = true)]
async fn switching_deactivates_previous_before_activating_next() {
    let a = MockAdapter::new("alpha", chat_caps());
    let b = MockAdapter::new("beta", chat_caps()).with_activation_delay(Duration::from_millis(50));
    let harness = TestHarness::builder()
        .with_adapter(a.clone())
        .with_adapter(b.clone())
        .build()
        .unwrap();

    harness.registry.activate_plugin("alpha").await.unwrap();
    harness.events.clear();
    harness.registry.activate_plugin("beta").await.unwrap();

    let a_off = a.first(|c| *c == MockCall::Deactivate).unwrap().at;
    let b_on = b.first(|c| *c == MockCall::Activate).unwrap().at;
    assert!(a_off < b_on);

    assert_eq!(
        harness.events.names(),
        vec![
            "adapter:deactivated",
            "plugin:deactivated",
            "adapter:activated",
            "plugin:activated"
        ]
    );
    assert_eq!(harness.registry.status_of("alpha"), Some(PluginStatus::Inactive));
    assert_eq!(harness.registry.active_adapter().unwrap().name(), "beta");
}

#[tokio::test(start_paused = true)]
async fn concurrent_activations_never_overlap() {
    let names = ["a1", "a2", "a3", "a4", "a5"];
    let mut builder = TestHarness::builder();
    for (i, name) in names.iter().enumerate() {
        builder = builder.with_adapter(
            MockAdapter::new(name, chat_caps())
                .with_activation_delay(Duration::from_millis(10 * (5 - i as u64))),
        );
    }
    let harness = builder.build().unwrap();

    let live = Arc::new(AtomicI32::new(0));
    let peak = Arc::new(AtomicI32::new(0));
    let _on = {
        let (live, peak) = (live.clone(), peak.clone());
        harness.bus.on::<AdapterActivated, _>(move |_| {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
        })
    };
    let _off = {
        let live = live.clone();
        harness.bus.on::<AdapterDeactivated, _>(move |_| {
            live.fetch_sub(1, Ordering::SeqCst);
        })
    };

    let registry = harness.registry.clone();
    let tasks: Vec<_> = names
        .iter()
        .map(|name| {
            let registry = registry.clone();
            let name = name.to_string();
            tokio::spawn(async move { registry.activate_plugin(&name).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    let active: Vec<_> = harness
        .registry
        .list_plugins()
        .into_iter()
        .filter(|r| r.status == PluginStatus::Active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(
        harness.registry.active_adapter().unwrap().name(),
        active[0].name()
    );
}

#[tokio::test]
async fn failed_activation_records_error_and_leaves_slot_empty() {
    let a = MockAdapter::new("alpha", chat_caps());
    let b = MockAdapter::new("beta", chat_caps()).with_activate(MockOutcome::Fail("dom missing".into()));
    let harness = TestHarness::builder()
        .with_adapter(a.clone())
        .with_adapter(b)
        .build()
        .unwrap();

    harness.registry.activate_plugin("alpha").await.unwrap();
    let err = harness.registry.activate_plugin("beta").await.unwrap_err();
    assert!(err.to_string().contains("dom missing"));

    let beta = harness.registry.plugin_by_name("beta").unwrap();
    assert_eq!(beta.status, PluginStatus::Error);
    assert!(beta.error.unwrap().contains("dom missing"));
    assert_eq!(harness.registry.status_of("alpha"), Some(PluginStatus::Inactive));
    assert!(harness.registry.active_adapter().is_none());
    assert!(harness.events.contains("plugin:activation-failed"));

    // Other registrations are unaffected and can still activate.
    harness.registry.activate_plugin("alpha").await.unwrap();
    assert_eq!(a.count(|c| *c == MockCall::Initialize), 2);
}

#[tokio::test]
async fn panicking_initialize_becomes_an_error_status() {
    let harness = TestHarness::builder()
        .with_adapter(MockAdapter::new("alpha", chat_caps()).with_initialize(MockOutcome::Panic))
        .build()
        .unwrap();

    let err = harness.registry.activate_plugin("alpha").await.unwrap_err();
    assert!(err.to_string().contains("panicked"), "{err}");
    assert_eq!(harness.registry.status_of("alpha"), Some(PluginStatus::Error));
}

#[tokio::test]
async fn failing_deactivate_still_marks_inactive() {
    let harness = TestHarness::builder()
        .with_adapter(
            MockAdapter::new("alpha", chat_caps()).with_deactivate(MockOutcome::Fail("stuck".into())),
        )
        .build()
        .unwrap();

    harness.registry.activate_plugin("alpha").await.unwrap();
    harness.registry.deactivate_current_plugin().await;

    let alpha = harness.registry.plugin_by_name("alpha").unwrap();
    assert_eq!(alpha.status, PluginStatus::Inactive);
    assert!(alpha.error.unwrap().contains("stuck"));
    assert!(harness.registry.active_adapter().is_none());
    assert!(harness.events.contains("plugin:deactivated"));
}

#[tokio::test]
async fn deactivating_an_inactive_plugin_is_a_no_op() {
    let adapter = MockAdapter::new("alpha", chat_caps());
    let harness = TestHarness::builder()
        .with_adapter(adapter.clone())
        .build()
        .unwrap();

    harness.registry.deactivate("alpha").await.unwrap();
    assert_eq!(adapter.count(|c| *c == MockCall::Deactivate), 0);
    assert!(matches!(
        harness.registry.deactivate("ghost").await,
        Err(SidekickError::PluginNotFound { .. })
    ));
}

#[tokio::test]
async fn unregister_deactivates_and_cleans_up() {
    let adapter = MockAdapter::new("alpha", chat_caps()).with_cleanup(MockOutcome::Fail("leak".into()));
    let harness = TestHarness::builder()
        .with_adapter(adapter.clone())
        .build()
        .unwrap();

    harness.registry.activate_plugin("alpha").await.unwrap();
    harness.registry.unregister("alpha").await.unwrap();

    assert_eq!(
        adapter.call_names()[2..],
        [MockCall::Deactivate, MockCall::Cleanup]
    );
    assert!(!harness.registry.is_plugin_registered("alpha"));
    assert!(harness.registry.active_adapter().is_none());
    assert_eq!(
        harness.events.position("plugin:deactivated").unwrap() + 1,
        harness.events.position("plugin:unregistered").unwrap()
    );
}

#[tokio::test]
async fn disabled_plugins_cannot_activate_until_enabled() {
    let adapter = MockAdapter::new("alpha", chat_caps());
    let harness = TestHarness::builder()
        .with_adapter_config(adapter.clone(), PluginConfig::new("alpha", "1.0.0").disabled())
        .build()
        .unwrap();

    assert_eq!(harness.registry.status_of("alpha"), Some(PluginStatus::Disabled));
    let err = harness.registry.activate_plugin("alpha").await.unwrap_err();
    assert!(matches!(err, SidekickError::Lifecycle { .. }));
    assert!(harness.events.contains("plugin:activation-failed"));
    assert!(adapter.calls().is_empty());

    harness.registry.set_enabled("alpha", true).await.unwrap();
    harness.registry.activate_plugin("alpha").await.unwrap();

    let err = harness.registry.set_enabled("alpha", false).await.unwrap_err();
    assert!(matches!(err, SidekickError::Lifecycle { .. }));
    harness.registry.deactivate_current_plugin().await;
    harness.registry.set_enabled("alpha", false).await.unwrap();
    assert_eq!(harness.registry.status_of("alpha"), Some(PluginStatus::Disabled));
}

#[tokio::test]
async fn host_activation_skips_unsupported_pages() {
    let preferred = MockAdapter::new("preferred", chat_caps()).unsupported();
    let fallback = MockAdapter::new("fallback", chat_caps());
    let harness = TestHarness::builder()
        .with_adapter_config(
            preferred.clone(),
            PluginConfig::new("preferred", "1.0.0")
                .with_hosts(["chat.example.com"])
                .with_priority(10),
        )
        .with_adapter_config(
            fallback.clone(),
            PluginConfig::new("fallback", "1.0.0").with_hosts(["*.example.com"]),
        )
        .build()
        .unwrap();

    assert_eq!(
        harness.registry.adapter_for_host("chat.example.com").as_deref(),
        Some("preferred")
    );
    let activated = harness
        .registry
        .activate_for_host("chat.example.com")
        .await
        .unwrap();
    assert_eq!(activated.as_deref(), Some("fallback"));
    assert_eq!(preferred.call_names(), vec![MockCall::IsSupported]);

    assert_eq!(harness.registry.activate_for_host("other.org").await.unwrap(), None);
}

#[tokio::test]
async fn capability_gate_blocks_undeclared_and_disabled_capabilities() {
    let adapter = MockAdapter::new("alpha", chat_caps());
    let harness = TestHarness::builder()
        .with_adapter_config(
            adapter.clone(),
            PluginConfig::new("alpha", "1.0.0").without_capability(Capability::FormSubmission),
        )
        .build()
        .unwrap();
    harness.registry.activate_plugin("alpha").await.unwrap();
    adapter.clear_calls();

    let handle = harness.registry.active_adapter().unwrap();
    assert!(!handle.submit_form().await);
    assert!(!handle.attach_file(&FileAttachment::new("a.txt", "text/plain", vec![])).await);
    assert!(handle.capture_screenshot().await.is_none());
    assert!(handle.select_element("#x").await.is_none());
    assert!(!handle.navigate_to_url("https://example.com").await);
    assert!(!handle.execute_script("1").await);
    assert!(adapter.calls().is_empty());
    assert!(!harness.events.contains("tool:execution-failed"));

    assert!(handle.insert_text("ok").await);
    assert_eq!(adapter.call_names(), vec![MockCall::InsertText("ok".into())]);
}

#[tokio::test]
async fn capability_errors_and_panics_become_false_with_failure_event() {
    let adapter = MockAdapter::new("alpha", chat_caps())
        .with_insert(MockOutcome::Fail("input detached".into()))
        .with_submit(MockOutcome::Panic);
    let harness = TestHarness::builder()
        .with_adapter(adapter.clone())
        .build()
        .unwrap();
    harness.registry.activate_plugin("alpha").await.unwrap();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let failures = failures.clone();
        harness
            .bus
            .on::<ToolExecutionFailed, _>(move |e| failures.lock().unwrap().push(e.clone()))
    };

    let handle = harness.registry.active_adapter().unwrap().for_call(Some("call-7"));
    assert!(!handle.insert_text("hello").await);
    assert!(!handle.submit_form().await);

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].tool_name, "alpha.insert_text");
    assert!(failures[0].error.contains("input detached"));
    assert_eq!(failures[0].call_id.as_deref(), Some("call-7"));
    assert_eq!(failures[1].tool_name, "alpha.submit_form");
    assert!(failures[1].error.contains("panicked"));
    assert_eq!(
        harness.registry.status_of("alpha"),
        Some(PluginStatus::Active),
        "capability failures do not touch lifecycle state"
    );
}
