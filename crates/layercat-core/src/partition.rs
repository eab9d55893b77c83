#![forbid(unsafe_code)]

//! Derived, read-only partitioning of a store snapshot.
//!
//! [`PartitionView::build`] is a pure function of an [`OrderedLayerStore`].
//! It splits the flat layer sequence into:
//!
//! - base layers,
//! - one [`GroupPartition`] per entry of the group order (including empty
//!   groups), each further split into subgroups, and
//! - the ungrouped remainder: non-base layers without a group tag or whose
//!   group is absent from the group order.
//!
//! All member lists are in flat-sequence order. Subgroup order is *first
//! appearance* while scanning a group's members; this scan is the only place
//! in the engine that defines it.

use ahash::AHashMap;

use crate::layer::{LayerEntry, Membership};
use crate::store::OrderedLayerStore;

/// The finest bucket a layer can live in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    /// Base-layer section.
    Base,
    /// Ungrouped section.
    Ungrouped,
    /// Members of a group that carry no subgroup tag.
    Group(String),
    /// Members of one subgroup.
    Subgroup { group: String, subgroup: String },
}

impl PartitionKey {
    /// Convenience constructor for [`PartitionKey::Group`].
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::Group(name.into())
    }

    /// Convenience constructor for [`PartitionKey::Subgroup`].
    #[must_use]
    pub fn subgroup(group: impl Into<String>, subgroup: impl Into<String>) -> Self {
        Self::Subgroup {
            group: group.into(),
            subgroup: subgroup.into(),
        }
    }

    /// Group this partition belongs to, if any.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        match self {
            Self::Group(group) | Self::Subgroup { group, .. } => Some(group),
            Self::Base | Self::Ungrouped => None,
        }
    }

    /// Retag `entry` so that it belongs to this partition.
    pub fn apply_to(&self, entry: &mut LayerEntry) {
        match self {
            Self::Base => entry.set_base_layer(true),
            Self::Ungrouped => {
                entry.set_base_layer(false);
                entry.set_membership(Membership::none());
            }
            Self::Group(group) => entry.set_membership(Membership::group(group)),
            Self::Subgroup { group, subgroup } => {
                entry.set_membership(Membership::subgroup(group, subgroup));
            }
        }
    }

    /// Partition of the layer at `ordinal` in `store`.
    #[must_use]
    pub fn of(store: &OrderedLayerStore, ordinal: usize) -> Option<Self> {
        let layer = store.get(ordinal)?;
        if layer.is_base_layer() {
            return Some(Self::Base);
        }
        let key = match (layer.group(), layer.subgroup()) {
            (Some(group), _) if !store.has_group(group) => Self::Ungrouped,
            (Some(group), Some(subgroup)) => Self::subgroup(group, subgroup),
            (Some(group), None) => Self::group(group),
            (None, _) => Self::Ungrouped,
        };
        Some(key)
    }
}

/// Members of one subgroup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgroupPartition {
    pub name: String,
    pub members: Vec<usize>,
}

/// Row of a group body in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupItem<'a> {
    /// A member without a subgroup tag.
    Layer(usize),
    /// A subgroup block, placed where its first member appears.
    Subgroup(&'a SubgroupPartition),
}

/// Members of one top-level group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPartition {
    pub name: String,
    /// Every member, subgroup or not, in flat order.
    pub members: Vec<usize>,
    /// Members without a subgroup tag.
    pub direct: Vec<usize>,
    /// Subgroups in first-appearance order.
    pub subgroups: Vec<SubgroupPartition>,
}

impl GroupPartition {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            members: Vec::new(),
            direct: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    /// Look up a subgroup by name.
    #[must_use]
    pub fn subgroup(&self, name: &str) -> Option<&SubgroupPartition> {
        self.subgroups.iter().find(|s| s.name == name)
    }

    /// Subgroup names in display order.
    #[must_use]
    pub fn subgroup_names(&self) -> Vec<&str> {
        self.subgroups.iter().map(|s| s.name.as_str()).collect()
    }

    /// Body rows: direct members and subgroup blocks interleaved in the order
    /// they first appear in the flat sequence.
    #[must_use]
    pub fn items(&self) -> Vec<GroupItem<'_>> {
        let mut items = Vec::with_capacity(self.direct.len() + self.subgroups.len());
        let mut direct = self.direct.iter().peekable();
        let mut subgroups = self.subgroups.iter().peekable();
        loop {
            let next_direct = direct.peek().map(|&&d| d);
            let next_block = subgroups.peek().map(|s| s.members[0]);
            match (next_direct, next_block) {
                (Some(d), Some(start)) if d < start => {
                    items.push(GroupItem::Layer(d));
                    direct.next();
                }
                (_, Some(_)) => {
                    if let Some(s) = subgroups.next() {
                        items.push(GroupItem::Subgroup(s));
                    }
                }
                (Some(d), None) => {
                    items.push(GroupItem::Layer(d));
                    direct.next();
                }
                (None, None) => break,
            }
        }
        items
    }
}

/// Order-correct partitioning of a store snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionView {
    base: Vec<usize>,
    groups: Vec<GroupPartition>,
    ungrouped: Vec<usize>,
}

impl PartitionView {
    /// Scan the store once and partition every layer.
    #[must_use]
    pub fn build(store: &OrderedLayerStore) -> Self {
        let mut groups: Vec<GroupPartition> =
            store.groups().iter().map(|g| GroupPartition::new(g)).collect();
        let slots: AHashMap<&str, usize> = store
            .groups()
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i))
            .collect();
        let mut subgroup_slots: Vec<AHashMap<String, usize>> = vec![AHashMap::new(); groups.len()];
        let mut base = Vec::new();
        let mut ungrouped = Vec::new();

        for (ordinal, layer) in store.layers().iter().enumerate() {
            if layer.is_base_layer() {
                base.push(ordinal);
                continue;
            }
            let Some(slot) = layer.group().and_then(|g| slots.get(g).copied()) else {
                ungrouped.push(ordinal);
                continue;
            };
            let group = &mut groups[slot];
            group.members.push(ordinal);
            match layer.subgroup() {
                Some(name) => {
                    let index = *subgroup_slots[slot]
                        .entry(name.to_owned())
                        .or_insert_with(|| {
                            group.subgroups.push(SubgroupPartition {
                                name: name.to_owned(),
                                members: Vec::new(),
                            });
                            group.subgroups.len() - 1
                        });
                    group.subgroups[index].members.push(ordinal);
                }
                None => group.direct.push(ordinal),
            }
        }

        Self {
            base,
            groups,
            ungrouped,
        }
    }

    /// Base layers in flat order.
    #[must_use]
    pub fn base_layers(&self) -> &[usize] {
        &self.base
    }

    /// Ungrouped layers in flat order.
    #[must_use]
    pub fn ungrouped(&self) -> &[usize] {
        &self.ungrouped
    }

    /// Groups in declared order.
    #[must_use]
    pub fn groups(&self) -> &[GroupPartition] {
        &self.groups
    }

    /// Look up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&GroupPartition> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Subgroup names of `group` in display order (empty for unknown groups).
    #[must_use]
    pub fn subgroup_order(&self, group: &str) -> Vec<&str> {
        self.group(group)
            .map(GroupPartition::subgroup_names)
            .unwrap_or_default()
    }

    /// Members of a partition in display order.
    ///
    /// Returns `None` for a group that is not in the group order, or a
    /// subgroup that currently has no members.
    #[must_use]
    pub fn members(&self, key: &PartitionKey) -> Option<&[usize]> {
        match key {
            PartitionKey::Base => Some(&self.base),
            PartitionKey::Ungrouped => Some(&self.ungrouped),
            PartitionKey::Group(group) => self.group(group).map(|g| g.direct.as_slice()),
            PartitionKey::Subgroup { group, subgroup } => self
                .group(group)
                .and_then(|g| g.subgroup(subgroup))
                .map(|s| s.members.as_slice()),
        }
    }
}
