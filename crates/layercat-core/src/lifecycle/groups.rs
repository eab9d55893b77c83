#![forbid(unsafe_code)]

//! Top-level group lifecycle.

use super::clean_name;
use crate::error::{HierarchyError, NodeKind, Outcome, Result};
use crate::expansion::ExpansionState;
use crate::relocation::Direction;
use crate::store::OrderedLayerStore;

/// What to do with the members of a group that is being deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDeletePolicy {
    /// Remove the group and every member layer.
    HardDelete,
    /// Retag every member into another declared group, then remove the group.
    /// Subgroup tags are kept, merging same-named subgroups.
    Migrate(String),
}

/// Information the caller needs to confirm a group deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteImpact {
    /// Layers tagged with the group.
    pub members: usize,
    /// Groups the members could migrate to.
    pub destinations: Vec<String>,
}

impl DeleteImpact {
    /// Impact of deleting `name` from `store`.
    #[must_use]
    pub fn of(store: &OrderedLayerStore, name: &str) -> Self {
        let name = name.trim();
        Self {
            members: member_count(store, name),
            destinations: store
                .groups()
                .iter()
                .filter(|g| g.as_str() != name)
                .cloned()
                .collect(),
        }
    }

    /// Whether deletion needs a policy decision from the user.
    #[must_use]
    pub fn needs_policy(&self) -> bool {
        self.members > 0
    }
}

/// Group create/rename/delete/reorder over a borrowed store and projector.
#[derive(Debug)]
pub struct GroupLifecycle<'a> {
    store: &'a mut OrderedLayerStore,
    expansion: &'a mut ExpansionState,
}

impl<'a> GroupLifecycle<'a> {
    #[must_use]
    pub fn new(store: &'a mut OrderedLayerStore, expansion: &'a mut ExpansionState) -> Self {
        Self { store, expansion }
    }

    /// Append a new group.
    ///
    /// # Errors
    ///
    /// `EmptyName` for a blank name, `DuplicateName` if it already exists.
    pub fn add(&mut self, name: &str) -> Result<Outcome> {
        let name = clean_name(NodeKind::Group, name)?;
        if self.store.has_group(&name) {
            return Err(HierarchyError::duplicate(NodeKind::Group, name));
        }
        tracing::debug!(message = "group.add", name = %name);
        self.store.push_group(name);
        Ok(Outcome::Applied)
    }

    /// Rename a group in place and retag its members.
    ///
    /// Renaming to the current name, or renaming an undeclared group, is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// `EmptyName` for a blank new name, `DuplicateName` if `new` exists.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<Outcome> {
        let new = clean_name(NodeKind::Group, new)?;
        let old = old.trim();
        if new == old {
            return Ok(Outcome::Unchanged);
        }
        let Some(index) = self.store.group_index(old) else {
            return Ok(Outcome::Unchanged);
        };
        // An undeclared tag still names a group; retagging onto it would
        // adopt layers that were never members.
        let tagged_elsewhere = self
            .store
            .layers()
            .iter()
            .any(|layer| layer.group() == Some(new.as_str()));
        if self.store.has_group(&new) || tagged_elsewhere {
            return Err(HierarchyError::duplicate(NodeKind::Group, new));
        }

        let mut retagged = 0usize;
        for layer in self.store.layers_mut() {
            if layer.group() == Some(old) {
                layer.set_group(&new);
                retagged += 1;
            }
        }
        self.expansion.remap_group(old, &new);
        tracing::debug!(message = "group.rename", old, new = %new, retagged);
        self.store.rename_group_at(index, new);
        Ok(Outcome::Applied)
    }

    /// Member count and migration destinations, for a confirmation prompt.
    #[must_use]
    pub fn delete_impact(&self, name: &str) -> DeleteImpact {
        DeleteImpact::of(self.store, name)
    }

    /// Delete a group.
    ///
    /// An empty group is removed regardless of `policy`. Deleting an
    /// undeclared group is a no-op.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` when migrating to the group itself or to an undeclared
    /// group.
    pub fn delete(&mut self, name: &str, policy: &GroupDeletePolicy) -> Result<Outcome> {
        let name = name.trim();
        let Some(index) = self.store.group_index(name) else {
            return Ok(Outcome::Unchanged);
        };
        let members = member_count(self.store, name);

        if members > 0 {
            match policy {
                GroupDeletePolicy::HardDelete => {
                    let removed = self.store.remove_where(|layer| layer.group() == Some(name));
                    tracing::debug!(message = "group.delete", name, policy = "hard", removed);
                }
                GroupDeletePolicy::Migrate(destination) => {
                    let destination = destination.trim();
                    if destination == name {
                        return Err(HierarchyError::target(format!(
                            "cannot migrate '{name}' into itself"
                        )));
                    }
                    if !self.store.has_group(destination) {
                        return Err(HierarchyError::target(format!(
                            "migration destination '{destination}' does not exist"
                        )));
                    }
                    for layer in self.store.layers_mut() {
                        if layer.group() == Some(name) {
                            layer.set_group(destination);
                        }
                    }
                    tracing::debug!(
                        message = "group.delete",
                        name,
                        policy = "migrate",
                        destination,
                        migrated = members
                    );
                }
            }
        } else {
            tracing::debug!(message = "group.delete", name, policy = "empty");
        }

        self.expansion.forget_group(name);
        self.store.remove_group_at(index);
        Ok(Outcome::Applied)
    }

    /// Move a group within the declared order.
    pub fn move_group(&mut self, name: &str, direction: Direction) -> Outcome {
        let Some(from) = self.store.group_index(name.trim()) else {
            return Outcome::Unchanged;
        };
        let len = self.store.groups().len();
        let to = match direction {
            Direction::Up => from.checked_sub(1),
            Direction::Down => Some(from + 1).filter(|&to| to < len),
            Direction::Top => Some(0),
            Direction::Bottom => Some(len - 1),
        };
        match to {
            Some(to) if to != from => {
                self.store.move_group_entry(from, to);
                tracing::debug!(message = "group.move", name = name.trim(), from, to);
                Outcome::Applied
            }
            _ => Outcome::Unchanged,
        }
    }
}

fn member_count(store: &OrderedLayerStore, name: &str) -> usize {
    store
        .layers()
        .iter()
        .filter(|layer| layer.group() == Some(name))
        .count()
}
