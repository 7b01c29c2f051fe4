// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Site adapters for the Sidekick runtime.
//!
//! Instead of one adapter type per chat site, a single [`GenericAdapter`]
//! is parameterized by a [`SiteDescriptor`] (identity, hosts, capabilities,
//! fallback selectors) and talks to the page through a [`PageDriver`].

pub mod descriptor;
pub mod driver;
pub mod generic;
pub mod recording;
pub mod sites;

use std::sync::Arc;

use sidekick_core::SidekickError;
use sidekick_plugin::PluginRegistry;

pub use descriptor::SiteDescriptor;
pub use driver::{host_of, PageDriver, PageElement};
pub use generic::{GenericAdapter, LAST_ACTIVE_KEY};
pub use recording::{PageAction, RecordingDriver};
pub use sites::{builtin_descriptors, site_descriptor};

/// Register a [`GenericAdapter`] for every built-in site over `driver`.
///
/// Returns the registered names in catalog order.
pub fn register_builtin_adapters(
    registry: &PluginRegistry,
    driver: Arc<dyn PageDriver>,
) -> Result<Vec<String>, SidekickError> {
    let mut names = Vec::new();
    for descriptor in builtin_descriptors() {
        let config = descriptor.config.clone();
        names.push(config.name.clone());
        registry.register(
            Box::new(GenericAdapter::new(descriptor, driver.clone())),
            config,
        )?;
    }
    Ok(names)
}
