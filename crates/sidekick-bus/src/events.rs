// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed event catalog.
//!
//! Every payload carried on the [`EventBus`](crate::EventBus) is one of the
//! types declared here. The [`Event`] trait is sealed, so downstream crates
//! can subscribe to and emit catalog events but cannot add new ones.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod sealed {
    pub trait Sealed {}
}

/// A payload type that belongs to the event catalog.
///
/// `NAME` is the stable wire name (`"plugin:registered"`, ...) used in logs
/// and by any bridge that forwards events outside the process.
pub trait Event: sealed::Sealed + Clone + fmt::Debug + Send + Sync + 'static {
    /// Stable event name.
    const NAME: &'static str;
}

macro_rules! event_catalog {
    ($($ty:ident => $name:literal),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Event for $ty {
                const NAME: &'static str = $name;
            }
        )*

        /// Wire names of every event in the catalog, in declaration order.
        pub const EVENT_NAMES: &[&str] = &[$($name),*];
    };
}

/// A file handed to an adapter for attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Payload of a finished tool execution, as delivered by the tool pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolExecution {
    /// Textual result to insert into the chat input.
    pub result: Option<String>,
    /// The result is a file rather than text.
    pub is_file_attachment: bool,
    pub file: Option<FileAttachment>,
    pub confirmation_text: Option<String>,
    /// Insert even when the user has auto-insert turned off.
    pub skip_auto_insert_check: bool,
    pub call_id: Option<String>,
    pub function_name: Option<String>,
}

impl ToolExecution {
    /// A text result with default flags.
    pub fn text(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
            ..Self::default()
        }
    }

    /// A file result with the attachment flag set.
    pub fn file(file: FileAttachment) -> Self {
        Self {
            is_file_attachment: true,
            file: Some(file),
            ..Self::default()
        }
    }
}

/// Step of the automation sequence reported by `automation:phase-completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationPhase {
    Execute,
    Insert,
    Attach,
    Submit,
}

impl fmt::Display for AutomationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AutomationPhase::Execute => "execute",
            AutomationPhase::Insert => "insert",
            AutomationPhase::Attach => "attach",
            AutomationPhase::Submit => "submit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRegistered {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUnregistered {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginActivated {
    pub plugin_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDeactivated {
    pub plugin_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginActivationFailed {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterActivated {
    pub plugin_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterDeactivated {
    pub plugin_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Adapter configuration changed locally. `None` means every adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfigUpdated {
    pub adapter_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionStarted {
    pub tool_name: String,
    pub call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionCompleted {
    pub execution: ToolExecution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionFailed {
    pub tool_name: String,
    pub error: String,
    pub call_id: Option<String>,
}

/// The remote configuration changed. `changes` lists the affected scopes:
/// adapter names, or `"adapter-config"` for a change touching every adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfigUpdated {
    pub changes: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationPhaseCompleted {
    pub phase: AutomationPhase,
    pub success: bool,
    pub call_id: Option<String>,
}

event_catalog! {
    PluginRegistered => "plugin:registered",
    PluginUnregistered => "plugin:unregistered",
    PluginActivated => "plugin:activated",
    PluginDeactivated => "plugin:deactivated",
    PluginActivationFailed => "plugin:activation-failed",
    AdapterActivated => "adapter:activated",
    AdapterDeactivated => "adapter:deactivated",
    AdapterConfigUpdated => "adapter:config-updated",
    ToolExecutionStarted => "tool:execution-started",
    ToolExecutionCompleted => "tool:execution-completed",
    ToolExecutionFailed => "tool:execution-failed",
    RemoteConfigUpdated => "remote-config:updated",
    AutomationPhaseCompleted => "automation:phase-completed",
}
