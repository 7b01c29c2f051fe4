// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Sidekick adapter runtime.

use thiserror::Error;

use crate::types::Capability;

/// The error type shared by the adapter contract, the registry, and the
/// supporting services.
#[derive(Debug, Error)]
pub enum SidekickError {
    /// Registration rejected: duplicate key or malformed plugin config.
    #[error("validation error: {0}")]
    Validation(String),

    /// A lifecycle request that does not apply to the plugin's current state.
    #[error("lifecycle error for {name}: {message}")]
    Lifecycle { name: String, message: String },

    /// A capability method was invoked that the adapter never declared.
    #[error("adapter {adapter} does not support {capability}")]
    CapabilityUnsupported {
        adapter: String,
        capability: Capability,
    },

    /// A bounded retry loop gave up.
    #[error("{message} (gave up after {attempts} attempts)")]
    Transient { message: String, attempts: u32 },

    /// Remote configuration could not be fetched, parsed, or validated.
    #[error("remote config error: {0}")]
    RemoteConfig(String),

    /// An adapter lifecycle or capability call failed.
    #[error("adapter error: {message}")]
    Adapter {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No registration exists under this name.
    #[error("plugin not found: {name}")]
    PluginNotFound { name: String },

    /// Configuration errors (invalid TOML, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SidekickError {
    /// Shorthand for an adapter failure without an underlying source.
    pub fn adapter(message: impl Into<String>) -> Self {
        SidekickError::Adapter {
            message: message.into(),
            source: None,
        }
    }

    pub fn lifecycle(name: impl Into<String>, message: impl Into<String>) -> Self {
        SidekickError::Lifecycle {
            name: name.into(),
            message: message.into(),
        }
    }
}
