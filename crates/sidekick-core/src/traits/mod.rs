// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the adapter contract and the services injected
//! through the plugin context.
//!
//! All async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod store;

pub use adapter::SiteAdapter;
pub use store::{AdapterConfigProvider, KeyValueStore, PreferenceStore};
