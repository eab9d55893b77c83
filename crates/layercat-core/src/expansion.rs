#![forbid(unsafe_code)]

//! Expansion-state projection.
//!
//! Tracks which hierarchy nodes the presentation layer shows open. Identity is
//! a tagged [`ExpansionKey`] rather than a concatenated string; the
//! `group::subgroup` encoding only exists at the serialization boundary
//! ([`NavigationState`]).
//!
//! # Invariants
//!
//! 1. After `remap_group(old, new)` no key references `old`.
//! 2. Each set holds a key at most once, in first-insertion order, so
//!    `hydrate` followed by `serialize` reproduces the input (with the two
//!    sentinels listed first in `expandedGroups`).
//! 3. Layer keys are ordinals and are never remapped: when a layer moves, the
//!    ordinal it vacated keeps its expanded flag.

use serde::{Deserialize, Serialize};

use crate::partition::PartitionKey;

/// Sentinel for the base-layer section in `expandedGroups`.
pub const BASE_LAYERS_SENTINEL: &str = "__BASE_LAYERS__";
/// Sentinel for the ungrouped section in `expandedGroups`.
pub const UNGROUPED_SENTINEL: &str = "__UNGROUPED__";
/// Separator between group and subgroup in `expandedSubGroups`.
pub const SUBGROUP_SEPARATOR: &str = "::";

/// Identity of one expandable node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpansionKey {
    /// The base-layer section.
    BaseLayers,
    /// The ungrouped section.
    Ungrouped,
    /// A top-level group.
    Group(String),
    /// A subgroup inside a group.
    Subgroup { group: String, subgroup: String },
    /// A single layer row, by ordinal.
    Layer(usize),
}

impl ExpansionKey {
    /// Convenience constructor for [`ExpansionKey::Group`].
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    /// Convenience constructor for [`ExpansionKey::Subgroup`].
    #[must_use]
    pub fn subgroup(group: impl Into<String>, subgroup: impl Into<String>) -> Self {
        Self::Subgroup {
            group: group.into(),
            subgroup: subgroup.into(),
        }
    }

    /// The node that has to be open for rows of `partition` to be visible.
    #[must_use]
    pub fn for_partition(partition: &PartitionKey) -> Self {
        match partition {
            PartitionKey::Base => Self::BaseLayers,
            PartitionKey::Ungrouped => Self::Ungrouped,
            PartitionKey::Group(group) => Self::Group(group.clone()),
            PartitionKey::Subgroup { group, subgroup } => Self::subgroup(group, subgroup),
        }
    }
}

/// Wire shape persisted by the caller across navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationState {
    pub expanded_layers: Vec<String>,
    pub expanded_groups: Vec<String>,
    pub expanded_sub_groups: Vec<String>,
}

/// Which nodes are currently expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    base_layers: bool,
    ungrouped: bool,
    groups: Vec<String>,
    subgroups: Vec<(String, String)>,
    layers: Vec<usize>,
}

impl ExpansionState {
    /// Everything collapsed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is expanded.
    #[must_use]
    pub fn is_expanded(&self, key: &ExpansionKey) -> bool {
        match key {
            ExpansionKey::BaseLayers => self.base_layers,
            ExpansionKey::Ungrouped => self.ungrouped,
            ExpansionKey::Group(name) => self.groups.iter().any(|g| g == name),
            ExpansionKey::Subgroup { group, subgroup } => self
                .subgroups
                .iter()
                .any(|(g, s)| g == group && s == subgroup),
            ExpansionKey::Layer(ordinal) => self.layers.contains(ordinal),
        }
    }

    /// Open or close `key`. Returns whether anything changed.
    pub fn set_expanded(&mut self, key: &ExpansionKey, expanded: bool) -> bool {
        if self.is_expanded(key) == expanded {
            return false;
        }
        match key {
            ExpansionKey::BaseLayers => self.base_layers = expanded,
            ExpansionKey::Ungrouped => self.ungrouped = expanded,
            ExpansionKey::Group(name) => {
                if expanded {
                    self.groups.push(name.clone());
                } else {
                    self.groups.retain(|g| g != name);
                }
            }
            ExpansionKey::Subgroup { group, subgroup } => {
                if expanded {
                    self.subgroups.push((group.clone(), subgroup.clone()));
                } else {
                    self.subgroups.retain(|(g, s)| !(g == group && s == subgroup));
                }
            }
            ExpansionKey::Layer(ordinal) => {
                if expanded {
                    self.layers.push(*ordinal);
                } else {
                    self.layers.retain(|o| o != ordinal);
                }
            }
        }
        true
    }

    /// Flip `key`, returning its new state.
    pub fn toggle(&mut self, key: &ExpansionKey) -> bool {
        let expanded = !self.is_expanded(key);
        self.set_expanded(key, expanded);
        expanded
    }

    /// Re-key a renamed group and every subgroup nested in it.
    pub fn remap_group(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        if self.groups.iter().any(|g| g == old) {
            self.groups.retain(|g| g != old);
            if !self.groups.iter().any(|g| g == new) {
                self.groups.push(new.to_owned());
            }
        }
        let (moved, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.subgroups)
            .into_iter()
            .partition(|(g, _)| g == old);
        self.subgroups = kept;
        for (_, subgroup) in moved {
            let key = ExpansionKey::subgroup(new, subgroup);
            self.set_expanded(&key, true);
        }
    }

    /// Re-key a renamed subgroup.
    pub fn remap_subgroup(&mut self, group: &str, old: &str, new: &str) {
        if old == new {
            return;
        }
        let old_key = ExpansionKey::subgroup(group, old);
        if self.set_expanded(&old_key, false) {
            self.set_expanded(&ExpansionKey::subgroup(group, new), true);
        }
    }

    /// Drop every key referencing `group` (the group and its subgroups).
    pub fn forget_group(&mut self, group: &str) {
        self.groups.retain(|g| g != group);
        self.subgroups.retain(|(g, _)| g != group);
    }

    /// Drop the key of one subgroup.
    pub fn forget_subgroup(&mut self, group: &str, subgroup: &str) {
        self.set_expanded(&ExpansionKey::subgroup(group, subgroup), false);
    }

    /// Encode for persistence.
    #[must_use]
    pub fn serialize(&self) -> NavigationState {
        let mut expanded_groups = Vec::with_capacity(self.groups.len() + 2);
        if self.base_layers {
            expanded_groups.push(BASE_LAYERS_SENTINEL.to_owned());
        }
        if self.ungrouped {
            expanded_groups.push(UNGROUPED_SENTINEL.to_owned());
        }
        expanded_groups.extend(self.groups.iter().cloned());
        NavigationState {
            expanded_layers: self.layers.iter().map(usize::to_string).collect(),
            expanded_groups,
            expanded_sub_groups: self
                .subgroups
                .iter()
                .map(|(g, s)| format!("{g}{SUBGROUP_SEPARATOR}{s}"))
                .collect(),
        }
    }

    /// Decode a persisted state. Malformed entries are skipped.
    ///
    /// Subgroup keys split at the first `::`, so a group name containing the
    /// separator cannot be restored faithfully.
    #[must_use]
    pub fn hydrate(state: &NavigationState) -> Self {
        let mut out = Self::new();
        for raw in &state.expanded_layers {
            match raw.trim().parse::<usize>() {
                Ok(ordinal) => {
                    out.set_expanded(&ExpansionKey::Layer(ordinal), true);
                }
                Err(_) => tracing::debug!(message = "expansion.hydrate.skip", kind = "layer", raw = %raw),
            }
        }
        for raw in &state.expanded_groups {
            let key = match raw.as_str() {
                BASE_LAYERS_SENTINEL => ExpansionKey::BaseLayers,
                UNGROUPED_SENTINEL => ExpansionKey::Ungrouped,
                name => ExpansionKey::group(name),
            };
            out.set_expanded(&key, true);
        }
        for raw in &state.expanded_sub_groups {
            match raw.split_once(SUBGROUP_SEPARATOR) {
                Some((group, subgroup)) if !group.is_empty() && !subgroup.is_empty() => {
                    out.set_expanded(&ExpansionKey::subgroup(group, subgroup), true);
                }
                _ => tracing::debug!(message = "expansion.hydrate.skip", kind = "subgroup", raw = %raw),
            }
        }
        out
    }
}
