// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in adapter configuration, the base every remote override merges into.

use serde_json::{json, Map, Value};
use sidekick_core::AdapterConfig;

/// Selector keys a full selectors override must provide.
pub const CORE_SELECTORS: &[&str] = &["chatInput", "submitButton"];

/// Version stamped on built-in defaults.
pub const DEFAULTS_VERSION: &str = "1.0.0";

struct SiteSelectors {
    chat_input: &'static str,
    submit_button: &'static str,
    file_input: &'static str,
    file_upload_button: &'static str,
    main_panel: &'static str,
}

const GENERIC: SiteSelectors = SiteSelectors {
    chat_input: "textarea, div[contenteditable=\"true\"]",
    submit_button: "button[type=\"submit\"], button[aria-label*=\"Send\"]",
    file_input: "input[type=\"file\"]",
    file_upload_button: "button[aria-label*=\"Attach\"], button[aria-label*=\"Upload\"]",
    main_panel: "main",
};

fn site_selectors(adapter_name: &str) -> SiteSelectors {
    match adapter_name {
        "chatgpt" => SiteSelectors {
            chat_input: "#prompt-textarea, div[contenteditable=\"true\"][id=\"prompt-textarea\"]",
            submit_button: "button[data-testid=\"send-button\"], #composer-submit-button",
            file_upload_button: "button[aria-label=\"Attach files\"]",
            ..GENERIC
        },
        "gemini" => SiteSelectors {
            chat_input: "div.ql-editor[contenteditable=\"true\"], rich-textarea div[contenteditable]",
            submit_button: "button.send-button, button[aria-label*=\"Send message\"]",
            file_upload_button: "button[aria-label*=\"upload file\"]",
            main_panel: "chat-window",
            ..GENERIC
        },
        "aistudio" => SiteSelectors {
            chat_input: "ms-prompt-input-wrapper textarea, textarea[aria-label*=\"prompt\"]",
            submit_button: "run-button button, button[aria-label=\"Run\"]",
            main_panel: "ms-chunk-editor",
            ..GENERIC
        },
        "perplexity" => SiteSelectors {
            chat_input: "textarea[placeholder*=\"Ask\"], #ask-input",
            submit_button: "button[aria-label=\"Submit\"], button[data-testid=\"submit-button\"]",
            ..GENERIC
        },
        "grok" => SiteSelectors {
            chat_input: "textarea[aria-label*=\"Ask Grok\"], div.tiptap[contenteditable]",
            submit_button: "button[type=\"submit\"][aria-label=\"Submit\"]",
            ..GENERIC
        },
        "deepseek" => SiteSelectors {
            chat_input: "textarea#chat-input, textarea[placeholder*=\"DeepSeek\"]",
            submit_button: "div[role=\"button\"][aria-disabled=\"false\"]",
            ..GENERIC
        },
        "openrouter" => SiteSelectors {
            chat_input: "textarea[placeholder*=\"Start a message\"]",
            submit_button: "button[aria-label=\"Send prompt\"]",
            ..GENERIC
        },
        "t3chat" => SiteSelectors {
            chat_input: "textarea#chat-input",
            submit_button: "button[aria-label=\"Send message\"]",
            ..GENERIC
        },
        "mistral" => SiteSelectors {
            chat_input: "textarea[name=\"message.text\"], div.ProseMirror[contenteditable]",
            submit_button: "button[aria-label=\"Send question\"]",
            ..GENERIC
        },
        _ => GENERIC,
    }
}

fn section(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Built-in configuration for `adapter_name`.
///
/// Unknown names get generic selectors, so a new adapter can run before it
/// has site-specific defaults.
pub fn builtin_adapter_config(adapter_name: &str) -> AdapterConfig {
    let s = site_selectors(adapter_name);
    let mut config = AdapterConfig {
        version: DEFAULTS_VERSION.to_string(),
        ..AdapterConfig::default()
    };

    for (key, value) in [
        ("chatInput", s.chat_input),
        ("submitButton", s.submit_button),
        ("fileInput", s.file_input),
        ("fileUploadButton", s.file_upload_button),
        ("mainPanel", s.main_panel),
    ] {
        config.selectors.insert(key.to_string(), value.to_string());
    }

    config.ui.insert(
        "typing".to_string(),
        section(json!({ "minDelay": 10, "maxDelay": 30, "characterDelay": 5 })),
    );
    config.ui.insert(
        "animations".to_string(),
        section(json!({ "highlightDuration": 300, "enabled": true })),
    );
    config.ui.insert(
        "retry".to_string(),
        section(json!({ "maxAttempts": 10, "delay": 100 })),
    );
    config.ui.insert(
        "fileUpload".to_string(),
        section(json!({ "maxSizeMb": 25, "dropDelay": 500 })),
    );

    let attachments = adapter_name != "t3chat";
    for (key, value) in [
        ("enableFileUpload", attachments),
        ("enableAutoSubmit", true),
        ("enableTypingSimulation", false),
        ("enableElementWaiting", true),
    ] {
        config.features.insert(key.to_string(), value);
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_has_core_selectors() {
        for name in ["chatgpt", "gemini", "t3chat", "unknown-site"] {
            let config = builtin_adapter_config(name);
            for key in CORE_SELECTORS {
                assert!(
                    !config.selector_list(key).is_empty(),
                    "{name} is missing {key}"
                );
            }
        }
    }

    #[test]
    fn site_specific_selectors_override_generic() {
        let chatgpt = builtin_adapter_config("chatgpt");
        let generic = builtin_adapter_config("unknown-site");
        assert_ne!(chatgpt.selectors["chatInput"], generic.selectors["chatInput"]);
        assert_eq!(chatgpt.selectors["fileInput"], generic.selectors["fileInput"]);
    }

    #[test]
    fn ui_sections_are_populated() {
        let config = builtin_adapter_config("gemini");
        assert_eq!(config.ui_value("typing", "minDelay"), Some(&json!(10)));
        assert_eq!(config.ui.len(), 4);
        assert!(config.feature("enableAutoSubmit"));
    }
}
