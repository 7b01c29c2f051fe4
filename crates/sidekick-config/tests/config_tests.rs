// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for runtime configuration loading.

use sidekick_config::diagnostic::ConfigError;
use sidekick_config::{load_and_validate_str, load_config_from_str};

/// Every documented section and key deserializes.
#[test]
fn full_config_deserializes() {
    let toml = r#"
[runtime]
log_level = "debug"

[automation]
settle_delay_ms = 400
auto_insert = true
auto_submit = true
auto_execute = false

[registry]
auto_activate = false

[remote_config]
enabled = true
override_file = "/tmp/remote.json"

[retry]
max_attempts = 4
initial_delay_ms = 50
backoff_factor = 2.0
max_delay_ms = 400

[[plugins]]
name = "gemini"
enabled = false

[[plugins]]
name = "chatgpt"
priority = 7
disabled_capabilities = ["file-attachment"]
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.runtime.log_level, "debug");
    assert_eq!(config.automation.settle_delay_ms, 400);
    assert!(config.automation.initial_state().auto_submit);
    assert!(!config.registry.auto_activate);
    assert!(config.remote_config.enabled);
    assert_eq!(config.retry.policy().max_attempts, 4);
    assert_eq!(config.plugins.len(), 2);
    let chatgpt = config.plugin("chatgpt").unwrap();
    assert_eq!(chatgpt.priority, Some(7));
    assert_eq!(chatgpt.disabled_capabilities, vec!["file-attachment"]);
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_and_validate_str("").expect("empty config is valid");
    assert_eq!(config.automation.settle_delay_ms, 800);
    assert_eq!(config.retry.max_attempts, 10);
    assert!(config.registry.auto_activate);
}

#[test]
fn unknown_key_gets_suggestion_and_span() {
    let toml = "[automation]\nsettle_delay_msec = 3\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key");
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "settle_delay_msec");
            assert_eq!(suggestion.as_deref(), Some("settle_delay_ms"));
            assert!(span.is_some(), "inline source should be located");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let err = load_config_from_str("[automation]\nauto_submit = \"yes\"\n")
        .expect_err("string for bool");
    assert!(err.to_string().contains("auto_submit") || err.to_string().contains("bool"));

    let errors = load_and_validate_str("[automation]\nauto_submit = \"yes\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_errors_are_all_collected() {
    let toml = r#"
[runtime]
log_level = "chatty"

[retry]
max_attempts = 0
initial_delay_ms = 500
max_delay_ms = 100

[[plugins]]
name = "chatgpt"
disabled_capabilities = ["screenshot"]
"#;
    let errors = load_and_validate_str(toml).expect_err("invalid values");
    assert_eq!(errors.len(), 4, "{errors:?}");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownCapability { name, .. } if name == "screenshot")));
}
