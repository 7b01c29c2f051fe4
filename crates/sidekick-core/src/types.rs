// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the adapter contract and the runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub use sidekick_bus::{FileAttachment, ToolExecution};

/// Optional behavior an adapter may declare.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextInsertion,
    FormSubmission,
    FileAttachment,
    UrlNavigation,
    ElementSelection,
    ScreenshotCapture,
    DomManipulation,
}

impl Capability {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of [`Capability`] values.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    pub fn all() -> Self {
        Capability::iter().collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn remove(&mut self, capability: Capability) {
        self.0 &= !capability.bit();
    }

    /// Capabilities present in `self` but not in `other`.
    pub fn without(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 & !other.0)
    }

    pub fn union(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(capabilities: [Capability; N]) -> Self {
        capabilities.into_iter().collect()
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(capabilities: Vec<Capability>) -> Self {
        capabilities.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(set: CapabilitySet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Lifecycle status of a plugin registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Registered,
    PendingActivation,
    Initializing,
    Initialized,
    Active,
    Inactive,
    Error,
    Disabled,
}

impl PluginStatus {
    /// Whether the registry may move a registration from `self` to `next`.
    pub fn can_transition_to(self, next: PluginStatus) -> bool {
        use PluginStatus::*;
        match (self, next) {
            (Registered | Inactive | Error, PendingActivation) => true,
            (Registered | Inactive | Error | PendingActivation, Initializing) => true,
            (Initializing, Initialized) => true,
            (Initialized, Active) => true,
            (Active, Inactive) => true,
            (Registered | Inactive | Error | PendingActivation, Disabled) => true,
            (Disabled, Registered) => true,
            (current, Error) => current != Active,
            _ => false,
        }
    }

    /// A registration in this status can be asked to activate.
    pub fn is_activatable(self) -> bool {
        !matches!(self, PluginStatus::Disabled | PluginStatus::Active)
    }
}

/// Status an adapter reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterStatus {
    /// `initialize` has not completed yet.
    Uninitialized,
    /// Initialized but not active.
    Ready,
    /// Active on the current page.
    Active,
    /// Operational with a problem worth surfacing.
    Degraded(String),
    /// Not operational.
    Failed(String),
}

/// User-controlled automation flags, owned by the preference store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationState {
    pub auto_insert: bool,
    pub auto_submit: bool,
    pub auto_execute: bool,
}

/// An image captured by a screenshot-capable adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A page element located by an element-selection capable adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Selector that matched.
    pub selector: String,
    /// Short description of the element (tag, label).
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn capability_wire_names_are_kebab_case() {
        assert_eq!(Capability::TextInsertion.to_string(), "text-insertion");
        assert_eq!(
            Capability::from_str("screenshot-capture").unwrap(),
            Capability::ScreenshotCapture
        );
        let json = serde_json::to_string(&Capability::DomManipulation).unwrap();
        assert_eq!(json, "\"dom-manipulation\"");
    }

    #[test]
    fn capability_vocabulary_has_seven_entries() {
        assert_eq!(Capability::iter().count(), 7);
        assert_eq!(CapabilitySet::all().len(), 7);
    }

    #[test]
    fn capability_set_membership() {
        let mut set = CapabilitySet::from([Capability::TextInsertion, Capability::FormSubmission]);
        assert!(set.contains(Capability::TextInsertion));
        assert!(!set.contains(Capability::FileAttachment));
        assert_eq!(set.len(), 2);

        set.remove(Capability::TextInsertion);
        assert!(!set.contains(Capability::TextInsertion));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn capability_set_without_only_narrows() {
        let declared = CapabilitySet::from([Capability::TextInsertion, Capability::FormSubmission]);
        let disabled = CapabilitySet::from([Capability::FormSubmission, Capability::UrlNavigation]);
        let effective = declared.without(disabled);
        assert_eq!(effective, CapabilitySet::from([Capability::TextInsertion]));
    }

    #[test]
    fn capability_set_serializes_as_list() {
        let set = CapabilitySet::from([Capability::FormSubmission, Capability::TextInsertion]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["text-insertion","form-submission"]"#);
        let back: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn status_transitions_follow_lifecycle() {
        use PluginStatus::*;
        assert!(Registered.can_transition_to(Initializing));
        assert!(Initializing.can_transition_to(Initialized));
        assert!(Initialized.can_transition_to(Active));
        assert!(Active.can_transition_to(Inactive));
        assert!(Inactive.can_transition_to(Initializing));
        assert!(Error.can_transition_to(PendingActivation));
        assert!(PendingActivation.can_transition_to(Disabled));

        assert!(!Active.can_transition_to(Error));
        assert!(!Disabled.can_transition_to(Initializing));
        assert!(!Registered.can_transition_to(Active));
        assert!(!Active.can_transition_to(Disabled));
        assert!(Initializing.can_transition_to(Error));
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(PluginStatus::PendingActivation.to_string(), "pending_activation");
        assert_eq!(PluginStatus::from_str("active").unwrap(), PluginStatus::Active);
    }

    #[test]
    fn automation_state_defaults_to_all_off() {
        let state: AutomationState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, AutomationState::default());
        let state: AutomationState = serde_json::from_str(r#"{"autoInsert":true}"#).unwrap();
        assert!(state.auto_insert && !state.auto_submit && !state.auto_execute);
    }
}
