// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics: figment errors turned into miette reports.
//!
//! Unknown keys and capability names get a "did you mean" suggestion from
//! Jaro-Winkler similarity, and a source span when the offending TOML file
//! can be found.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(sidekick::config::unknown_key),
        help("{}", suggestion_help(suggestion.as_deref(), valid))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma separated list of keys accepted in this section.
        valid: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(sidekick::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(sidekick::config::missing_key),
        help("add `{key} = <value>` to your sidekick.toml")
    )]
    MissingKey { key: String },

    #[error("unknown capability `{name}` in {location}")]
    #[diagnostic(
        code(sidekick::config::unknown_capability),
        help("{}", suggestion_help(suggestion.as_deref(), valid))
    )]
    UnknownCapability {
        name: String,
        location: String,
        suggestion: Option<String>,
        valid: String,
    },

    #[error("validation error: {message}")]
    #[diagnostic(code(sidekick::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(sidekick::config::other))]
    Other(String),
}

fn suggestion_help(suggestion: Option<&str>, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid values: {valid}"),
        None => format!("valid values: {valid}"),
    }
}

/// Convert every error inside a `figment::Error` into a [`ConfigError`].
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid: Vec<&str> = expected.to_vec();
                let (span, src) = locate(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid),
                    valid: valid.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn locate(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings carry no file source; fall back to the only source given.
    let source = match path {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((name, content)) = source else {
        return (None, None);
    };
    match find_key_offset(content, error.path.first().map(String::as_str), field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside `section` (`[section]` or `[[section]]`),
/// or from the top of the file when `section` is `None`.
pub fn find_key_offset(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let start = match section {
        None => 0,
        Some(section) => {
            let table = format!("[{section}]");
            let array = format!("[[{section}]]");
            content
                .find(&array)
                .map(|pos| pos + array.len())
                .or_else(|| content.find(&table).map(|pos| pos + table.len()))?
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best match for `unknown` among `valid`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid: &[&str]) -> Option<String> {
    valid
        .iter()
        .map(|&candidate| (candidate, strsim::jaro_winkler(unknown, candidate)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["settle_delay_ms", "auto_insert", "auto_submit"];
        assert_eq!(
            suggest_key("setle_delay_ms", valid),
            Some("settle_delay_ms".to_string())
        );
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn suggests_capability_name() {
        let valid = &["text-insertion", "file-attachment", "form-submission"];
        assert_eq!(
            suggest_key("file-attachement", valid),
            Some("file-attachment".to_string())
        );
    }

    #[test]
    fn finds_key_inside_section() {
        let content = "[runtime]\nlog_level = \"info\"\n[automation]\nsetle = 3\n";
        let offset = find_key_offset(content, Some("automation"), "setle").unwrap();
        assert_eq!(&content[offset..offset + 5], "setle");
        assert!(find_key_offset(content, Some("registry"), "setle").is_none());
    }

    #[test]
    fn finds_key_inside_array_table() {
        let content = "[[plugins]]\nname = \"gemini\"\nenabld = false\n";
        let offset = find_key_offset(content, Some("plugins"), "enabld").unwrap();
        assert_eq!(&content[offset..offset + 6], "enabld");
    }

    #[test]
    fn key_prefix_does_not_match_longer_key() {
        let content = "[retry]\nmax_attempts_total = 1\nmax_attempts = 2\n";
        let offset = find_key_offset(content, Some("retry"), "max_attempts").unwrap();
        assert!(content[offset..].starts_with("max_attempts = 2"));
    }
}
