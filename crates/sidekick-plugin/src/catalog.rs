// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in site adapter catalog.
//!
//! Static metadata for the chat sites Sidekick ships adapters for. The entries
//! here only describe the sites; the drivers live in `sidekick-adapter`.

use sidekick_core::{Capability, CapabilitySet};

use crate::manifest::PluginConfig;

/// One built-in site: registration metadata plus declared capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub config: PluginConfig,
    pub capabilities: CapabilitySet,
}

impl CatalogEntry {
    fn new(name: &str, description: &str, hosts: &[&str], capabilities: CapabilitySet) -> Self {
        Self {
            config: PluginConfig::new(name, "1.0.0")
                .with_description(description)
                .with_hosts(hosts.iter().copied()),
            capabilities,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

fn chat_capabilities() -> CapabilitySet {
    CapabilitySet::from([
        Capability::TextInsertion,
        Capability::FormSubmission,
        Capability::FileAttachment,
        Capability::ElementSelection,
        Capability::UrlNavigation,
    ])
}

/// All built-in site entries, in display order.
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    let text_only = CapabilitySet::from([
        Capability::TextInsertion,
        Capability::FormSubmission,
        Capability::ElementSelection,
    ]);

    vec![
        CatalogEntry::new(
            "chatgpt",
            "OpenAI ChatGPT web chat",
            &["chatgpt.com", "chat.openai.com"],
            chat_capabilities().union(CapabilitySet::from([Capability::DomManipulation])),
        ),
        CatalogEntry::new(
            "gemini",
            "Google Gemini web chat",
            &["gemini.google.com"],
            chat_capabilities(),
        ),
        CatalogEntry::new(
            "aistudio",
            "Google AI Studio prompt editor",
            &["aistudio.google.com"],
            chat_capabilities(),
        ),
        CatalogEntry::new(
            "perplexity",
            "Perplexity answer engine",
            &["perplexity.ai", "www.perplexity.ai"],
            chat_capabilities(),
        ),
        CatalogEntry::new(
            "grok",
            "xAI Grok web chat",
            &["grok.com"],
            chat_capabilities(),
        ),
        CatalogEntry::new(
            "deepseek",
            "DeepSeek chat",
            &["chat.deepseek.com"],
            chat_capabilities(),
        ),
        CatalogEntry::new(
            "openrouter",
            "OpenRouter multi-model chat room",
            &["openrouter.ai"],
            chat_capabilities(),
        ),
        CatalogEntry::new("t3chat", "T3 Chat", &["t3.chat"], text_only),
        CatalogEntry::new(
            "mistral",
            "Mistral Le Chat",
            &["chat.mistral.ai"],
            chat_capabilities(),
        ),
    ]
}

/// Look up one built-in entry by adapter name.
pub fn catalog_entry(name: &str) -> Option<CatalogEntry> {
    builtin_catalog().into_iter().find(|e| e.name() == name)
}

/// Search the built-in catalog by query string.
///
/// Matches name, description, or any host pattern (case-insensitive). An
/// empty query returns everything.
pub fn search_catalog(query: &str) -> Vec<CatalogEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return builtin_catalog();
    }
    builtin_catalog()
        .into_iter()
        .filter(|e| {
            e.config.name.to_lowercase().contains(&query)
                || e.config.description.to_lowercase().contains(&query)
                || e.config.host_patterns.iter().any(|h| h.contains(&query))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_is_valid_and_unique() {
        let catalog = builtin_catalog();
        let mut names: Vec<&str> = catalog.iter().map(CatalogEntry::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
        for entry in &catalog {
            entry.config.validate().unwrap();
            assert!(!entry.config.host_patterns.is_empty(), "{} has no hosts", entry.name());
            assert!(entry.capabilities.contains(Capability::TextInsertion));
        }
    }

    #[test]
    fn search_by_name_is_case_insensitive() {
        let results = search_catalog("GEMINI");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "gemini");
    }

    #[test]
    fn search_by_host() {
        let results = search_catalog("openai.com");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "chatgpt");
    }

    #[test]
    fn search_by_description() {
        let names: Vec<String> = search_catalog("google")
            .into_iter()
            .map(|e| e.config.name)
            .collect();
        assert_eq!(names, vec!["gemini", "aistudio"]);
    }

    #[test]
    fn empty_query_returns_all() {
        assert_eq!(search_catalog("  ").len(), builtin_catalog().len());
    }

    #[test]
    fn no_match() {
        assert!(search_catalog("xyz_nonexistent").is_empty());
        assert!(catalog_entry("xyz_nonexistent").is_none());
    }

    #[test]
    fn t3chat_cannot_attach_files() {
        let entry = catalog_entry("t3chat").unwrap();
        assert!(!entry.capabilities.contains(Capability::FileAttachment));
    }
}
