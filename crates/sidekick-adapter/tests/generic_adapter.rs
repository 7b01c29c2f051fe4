// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic adapter behavior inside a full runtime, over the recording page.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sidekick_adapter::{
    register_builtin_adapters, site_descriptor, GenericAdapter, PageAction, PageElement,
    RecordingDriver, LAST_ACTIVE_KEY,
};
use sidekick_core::{
    AutomationState, FileAttachment, KeyValueStore, PluginStatus, RetryPolicy, ToolExecution,
};
use sidekick_test_utils::TestHarness;

const CHATGPT_INPUT: &str = "#prompt-textarea";
const CHATGPT_SEND: &str = "button[data-testid=\"send-button\"]";

fn chatgpt_page() -> RecordingDriver {
    RecordingDriver::new("https://chatgpt.com/c/abc")
        .with_element(CHATGPT_INPUT, PageElement::new("div").with_label("Message ChatGPT"))
        .with_element(CHATGPT_SEND, PageElement::new("button"))
        .with_element("input[type=\"file\"]", PageElement::new("input").hidden())
}

fn register_chatgpt(harness: &TestHarness, driver: &RecordingDriver) {
    let descriptor = site_descriptor("chatgpt").unwrap();
    let config = descriptor.config.clone();
    harness
        .registry
        .register(
            Box::new(GenericAdapter::new(descriptor, Arc::new(driver.clone()))),
            config,
        )
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn end_to_end_insert_and_submit_on_the_page() {
    let driver = chatgpt_page();
    let harness = TestHarness::builder()
        .with_automation(AutomationState {
            auto_insert: true,
            auto_submit: true,
            auto_execute: false,
        })
        .build()
        .unwrap();
    register_chatgpt(&harness, &driver);

    let activated = harness.registry.activate_for_host("chatgpt.com").await.unwrap();
    assert_eq!(activated.as_deref(), Some("chatgpt"));

    let outcome = harness.complete(ToolExecution::text("hello")).await;
    assert_eq!(outcome.inserted, Some(true));
    assert_eq!(outcome.submitted, Some(true));
    assert_eq!(
        driver.actions(),
        vec![
            PageAction::SetValue {
                selector: CHATGPT_INPUT.into(),
                text: "hello".into()
            },
            PageAction::Click {
                selector: CHATGPT_SEND.into()
            },
        ]
    );

    let last = harness.storage.get(LAST_ACTIVE_KEY).unwrap();
    assert_eq!(last["name"], "chatgpt");
    assert_eq!(last["url"], "https://chatgpt.com/c/abc");
}

#[tokio::test(start_paused = true)]
async fn initialize_waits_for_a_late_chat_input() {
    let driver = RecordingDriver::new("https://chatgpt.com/")
        .with_element_after(CHATGPT_INPUT, PageElement::new("div"), 3);
    let harness = TestHarness::builder()
        .with_retry(RetryPolicy::fixed(10, Duration::from_millis(100)))
        .build()
        .unwrap();
    register_chatgpt(&harness, &driver);

    harness.registry.activate_plugin("chatgpt").await.unwrap();
    assert_eq!(harness.registry.status_of("chatgpt"), Some(PluginStatus::Active));
}

#[tokio::test(start_paused = true)]
async fn missing_chat_input_fails_activation_after_bounded_retries() {
    let driver = RecordingDriver::new("https://chatgpt.com/");
    let harness = TestHarness::builder()
        .with_retry(RetryPolicy::fixed(3, Duration::from_millis(100)))
        .build()
        .unwrap();
    register_chatgpt(&harness, &driver);

    let err = harness.registry.activate_plugin("chatgpt").await.unwrap_err();
    assert!(err.to_string().contains("3 attempts"), "{err}");
    let registration = harness.registry.plugin_by_name("chatgpt").unwrap();
    assert_eq!(registration.status, PluginStatus::Error);
    assert!(harness.events.contains("plugin:activation-failed"));
}

#[tokio::test]
async fn remote_selectors_take_precedence_over_defaults() {
    let driver = RecordingDriver::new("https://chatgpt.com/")
        .with_element("textarea.v2", PageElement::new("textarea"))
        .with_element(CHATGPT_INPUT, PageElement::new("div"));
    let harness = TestHarness::builder()
        .with_automation(AutomationState {
            auto_insert: true,
            ..AutomationState::default()
        })
        .with_remote_config(
            "chatgpt",
            None,
            json!({ "selectors": { "chatInput": "textarea.v2" } }),
        )
        .build()
        .unwrap();
    register_chatgpt(&harness, &driver);
    harness.registry.activate_plugin("chatgpt").await.unwrap();

    harness.complete(ToolExecution::text("routed")).await;

    assert_eq!(driver.value_of("textarea.v2").as_deref(), Some("routed"));
    assert!(driver.value_of(CHATGPT_INPUT).is_none());
}

#[tokio::test]
async fn stale_remote_selector_falls_back_to_descriptor() {
    let driver = RecordingDriver::new("https://chatgpt.com/")
        .with_element("textarea[data-id=\"root\"]", PageElement::new("textarea"));
    let harness = TestHarness::builder()
        .with_remote_config(
            "chatgpt",
            None,
            json!({ "selectors": { "chatInput": "textarea.removed" } }),
        )
        .build()
        .unwrap();
    register_chatgpt(&harness, &driver);
    harness.registry.activate_plugin("chatgpt").await.unwrap();

    let handle = harness.registry.active_adapter().unwrap();
    assert!(handle.insert_text("still works").await);
    assert_eq!(
        driver.value_of("textarea[data-id=\"root\"]").as_deref(),
        Some("still works")
    );
}

#[tokio::test]
async fn file_upload_feature_flag_gates_attachment() {
    let driver = chatgpt_page();
    let harness = TestHarness::builder()
        .with_remote_config(
            "chatgpt",
            None,
            json!({ "features": { "enableFileUpload": false } }),
        )
        .build()
        .unwrap();
    register_chatgpt(&harness, &driver);
    harness.registry.activate_plugin("chatgpt").await.unwrap();

    let file = FileAttachment::new("notes.md", "text/markdown", b"# hi".to_vec());
    let handle = harness.registry.active_adapter().unwrap();
    assert!(!handle.attach_file(&file).await);
    assert!(driver.actions().is_empty());

    harness.remote.clear();
    harness.resolver.clear_cache(None);
    harness.registry.deactivate_current_plugin().await;
    harness.registry.activate_plugin("chatgpt").await.unwrap();
    assert!(handle.attach_file(&file).await);
    assert_eq!(
        driver.actions(),
        vec![PageAction::DispatchFile {
            selector: "input[type=\"file\"]".into(),
            file_name: "notes.md".into()
        }]
    );
}

#[tokio::test]
async fn builtin_registration_picks_the_site_for_the_host() {
    let driver = RecordingDriver::new("https://gemini.google.com/app")
        .with_element("rich-textarea div[contenteditable]", PageElement::new("div"));
    let harness = TestHarness::builder().build().unwrap();

    let names = register_builtin_adapters(&harness.registry, Arc::new(driver.clone())).unwrap();
    assert_eq!(names.len(), sidekick_plugin::builtin_catalog().len());

    let activated = harness
        .registry
        .activate_for_host("gemini.google.com")
        .await
        .unwrap();
    assert_eq!(activated.as_deref(), Some("gemini"));
    assert_eq!(harness.registry.adapter_for_host("chatgpt.com").as_deref(), Some("chatgpt"));
}
