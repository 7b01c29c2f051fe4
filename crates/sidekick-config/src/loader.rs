// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./sidekick.toml` > `~/.config/sidekick/sidekick.toml` >
//! `/etc/sidekick/sidekick.toml` with environment variable overrides via the
//! `SIDEKICK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SidekickConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/sidekick/sidekick.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "sidekick.toml";

/// Sections whose keys may be set from `SIDEKICK_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &["remote_config", "automation", "registry", "runtime", "retry"];

/// `~/.config/sidekick/sidekick.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sidekick").join("sidekick.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/sidekick/sidekick.toml`
/// 3. `~/.config/sidekick/sidekick.toml`
/// 4. `./sidekick.toml`
/// 5. `SIDEKICK_*` environment variables
pub fn load_config() -> Result<SidekickConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SidekickConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SidekickConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SidekickConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SidekickConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SidekickConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `SIDEKICK_AUTOMATION_AUTO_SUBMIT` to
/// `automation.auto_submit`.
///
/// Only the first underscore after a known section name becomes a dot; key
/// names keep their underscores.
fn env_provider() -> Env {
    Env::prefixed("SIDEKICK_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
