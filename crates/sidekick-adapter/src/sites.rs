// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Descriptors for the built-in chat sites.

use sidekick_plugin::{builtin_catalog, catalog_entry, CatalogEntry};

use crate::descriptor::{SiteDescriptor, CHAT_INPUT, FILE_INPUT, SUBMIT_BUTTON};

fn site_fallbacks(descriptor: SiteDescriptor) -> SiteDescriptor {
    let descriptor = match descriptor.name() {
        "chatgpt" => descriptor
            .with_fallbacks(CHAT_INPUT, &["textarea[data-id=\"root\"]"])
            .with_fallbacks(SUBMIT_BUTTON, &["button[aria-label=\"Send prompt\"]"]),
        "gemini" => descriptor
            .with_fallbacks(CHAT_INPUT, &["div[aria-label=\"Enter a prompt here\"]"])
            .with_fallbacks(SUBMIT_BUTTON, &["button[aria-label=\"Send message\"]"]),
        "aistudio" => descriptor.with_fallbacks(SUBMIT_BUTTON, &["button.run-button"]),
        "perplexity" => descriptor.with_fallbacks(SUBMIT_BUTTON, &["button[aria-label=\"Submit\"]"]),
        "grok" => descriptor.with_fallbacks(CHAT_INPUT, &["div.ProseMirror"]),
        "deepseek" => descriptor.with_fallbacks(CHAT_INPUT, &["textarea[placeholder*=\"Message\"]"]),
        "t3chat" => descriptor.with_fallbacks(SUBMIT_BUTTON, &["button[type=\"submit\"]"]),
        _ => descriptor,
    };

    descriptor
        .with_fallbacks(CHAT_INPUT, &["textarea", "div[contenteditable=\"true\"]"])
        .with_fallbacks(FILE_INPUT, &["input[type=\"file\"]"])
}

fn to_descriptor(entry: CatalogEntry) -> SiteDescriptor {
    site_fallbacks(SiteDescriptor::from_catalog(entry))
}

/// Descriptors for every catalog entry, in catalog order.
pub fn builtin_descriptors() -> Vec<SiteDescriptor> {
    builtin_catalog().into_iter().map(to_descriptor).collect()
}

/// The built-in descriptor for `name`.
pub fn site_descriptor(name: &str) -> Option<SiteDescriptor> {
    catalog_entry(name).map(to_descriptor)
}
