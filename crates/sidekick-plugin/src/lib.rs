// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry, capability gate, plugin metadata, and built-in site catalog.
//!
//! The registry owns every site adapter registration and the single active
//! slot. Callers reach adapters only through [`AdapterHandle`], which enforces
//! the declared capability set at one boundary.

pub mod catalog;
pub mod handle;
pub mod manifest;
pub mod registry;

pub use catalog::{builtin_catalog, catalog_entry, search_catalog, CatalogEntry};
pub use handle::AdapterHandle;
pub use manifest::{parse_plugin_config, PluginConfig};
pub use registry::{PluginRegistration, PluginRegistry};
