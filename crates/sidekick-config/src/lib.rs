// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Sidekick runtime.
//!
//! Two independent concerns live here:
//!
//! - the runtime's own settings ([`SidekickConfig`]), loaded from TOML files
//!   and `SIDEKICK_*` environment variables with strict validation and
//!   miette diagnostics;
//! - adapter configuration resolution ([`AdapterConfigResolver`]), which
//!   merges built-in selector/UI/feature defaults with validated remote
//!   overrides.
//!
//! # Usage
//!
//! ```no_run
//! use sidekick_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("settle delay: {:?}", config.automation.settle_delay());
//! ```

pub mod defaults;
pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod remote;
pub mod resolver;
pub mod validation;

pub use defaults::builtin_adapter_config;
pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SidekickConfig;
pub use remote::{FileRemoteConfig, NoRemoteConfig, RemoteConfigSource, StaticRemoteConfig};
pub use resolver::{AdapterConfigResolver, ADAPTER_CONFIG_SCOPE};

use std::path::Path;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<SidekickConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from one TOML file (plus env) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<SidekickConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SidekickConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<SidekickConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<SidekickConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every config file that exists, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::LOCAL_CONFIG_PATH)];
    candidates.extend(loader::user_config_path());
    candidates.push(std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH));

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let absolute = std::path::absolute(&path).unwrap_or(path);
            Some((absolute.display().to_string(), content))
        })
        .collect()
}
