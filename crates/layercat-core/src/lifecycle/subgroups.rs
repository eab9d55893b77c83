#![forbid(unsafe_code)]

//! Subgroup lifecycle, scoped to one group at a time.
//!
//! Subgroups have no declared order or registry: a subgroup exists while at
//! least one layer carries its tag, and its position is derived from the
//! first member in the flat sequence (see [`crate::partition`]).

use super::clean_name;
use crate::error::{HierarchyError, NodeKind, Outcome, Result};
use crate::expansion::ExpansionState;
use crate::layer::Membership;
use crate::partition::PartitionView;
use crate::relocation::{Direction, Moved, RelocationEngine};
use crate::store::OrderedLayerStore;

/// What to do with the members of a subgroup that is being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgroupDeletePolicy {
    /// Remove every member layer.
    HardDelete,
    /// Clear the subgroup tag; members stay in the group.
    Ungroup,
}

/// Result of [`SubgroupLifecycle::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgroupCreated {
    /// Ordinals that were tagged (possibly empty).
    pub tagged: Vec<usize>,
    /// Membership a layer-authoring form should pre-fill so the subgroup
    /// materializes when the first layer is added.
    pub seed: Membership,
}

/// Subgroup create/rename/delete/merge/reorder over a borrowed store and
/// projector.
#[derive(Debug)]
pub struct SubgroupLifecycle<'a> {
    store: &'a mut OrderedLayerStore,
    expansion: &'a mut ExpansionState,
}

impl<'a> SubgroupLifecycle<'a> {
    #[must_use]
    pub fn new(store: &'a mut OrderedLayerStore, expansion: &'a mut ExpansionState) -> Self {
        Self { store, expansion }
    }

    /// Subgroup names of `group` in display order.
    #[must_use]
    pub fn names(&self, group: &str) -> Vec<String> {
        PartitionView::build(self.store)
            .subgroup_order(group.trim())
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    fn exists(&self, group: &str, name: &str) -> bool {
        self.store
            .layers()
            .iter()
            .any(|layer| layer.membership().is_in_subgroup(group, name))
    }

    /// Create a subgroup inside `group`, tagging the selected layers.
    ///
    /// Selected ordinals that do not exist, are base layers, or belong to a
    /// different group are skipped. Positions are never changed.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if `group` is not declared, `EmptyName` / `DuplicateName`
    /// for a bad name, `InvalidSelection` if a non-empty selection contains no
    /// usable ordinal.
    pub fn create(&mut self, group: &str, name: &str, selected: &[usize]) -> Result<SubgroupCreated> {
        let group = group.trim();
        if !self.store.has_group(group) {
            return Err(HierarchyError::target(format!("group '{group}' does not exist")));
        }
        let name = clean_name(NodeKind::Subgroup, name)?;
        if self.names(group).iter().any(|s| *s == name) {
            return Err(HierarchyError::duplicate(NodeKind::Subgroup, name));
        }

        let mut tagged: Vec<usize> = selected
            .iter()
            .copied()
            .filter(|&o| self.store.get(o).is_some_and(|l| l.group() == Some(group)))
            .collect();
        tagged.sort_unstable();
        tagged.dedup();
        if !selected.is_empty() && tagged.is_empty() {
            return Err(HierarchyError::selection(format!(
                "none of the selected layers belong to '{group}'"
            )));
        }
        if tagged.len() < selected.len() {
            tracing::debug!(
                message = "subgroup.create.filtered",
                requested = selected.len(),
                kept = tagged.len()
            );
        }

        for &ordinal in &tagged {
            if let Some(layer) = self.store.get_mut(ordinal) {
                layer.set_subgroup(Some(&name));
            }
        }
        tracing::debug!(message = "subgroup.create", group, name = %name, tagged = tagged.len());
        Ok(SubgroupCreated {
            tagged,
            seed: Membership::subgroup(group, &name),
        })
    }

    /// Rename a subgroup and retag its members.
    ///
    /// # Errors
    ///
    /// `EmptyName` for a blank new name, `DuplicateName` if `new` already
    /// exists in the group.
    pub fn rename(&mut self, group: &str, old: &str, new: &str) -> Result<Outcome> {
        let (group, old) = (group.trim(), old.trim());
        let new = clean_name(NodeKind::Subgroup, new)?;
        if new == old || !self.exists(group, old) {
            return Ok(Outcome::Unchanged);
        }
        if self.exists(group, &new) {
            return Err(HierarchyError::duplicate(NodeKind::Subgroup, new));
        }
        let retagged = self.retag(group, old, Some(&new));
        self.expansion.remap_subgroup(group, old, &new);
        tracing::debug!(message = "subgroup.rename", group, old, new = %new, retagged);
        Ok(Outcome::Applied)
    }

    /// Delete a subgroup. Unknown subgroups are a no-op.
    pub fn delete(&mut self, group: &str, name: &str, policy: SubgroupDeletePolicy) -> Outcome {
        let (group, name) = (group.trim(), name.trim());
        if !self.exists(group, name) {
            return Outcome::Unchanged;
        }
        let affected = match policy {
            SubgroupDeletePolicy::HardDelete => self
                .store
                .remove_where(|layer| layer.membership().is_in_subgroup(group, name)),
            SubgroupDeletePolicy::Ungroup => self.retag(group, name, None),
        };
        self.expansion.forget_subgroup(group, name);
        tracing::debug!(message = "subgroup.delete", group, name, policy = ?policy, affected);
        Outcome::Applied
    }

    /// Clear the subgroup tag of every member.
    pub fn ungroup(&mut self, group: &str, name: &str) -> Outcome {
        self.delete(group, name, SubgroupDeletePolicy::Ungroup)
    }

    /// Fold `source` into `destination`, both inside `group`.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if either subgroup has no members or they are the same.
    pub fn merge(&mut self, group: &str, source: &str, destination: &str) -> Result<Outcome> {
        let (group, source, destination) = (group.trim(), source.trim(), destination.trim());
        if source == destination {
            return Err(HierarchyError::target(format!(
                "cannot merge '{source}' into itself"
            )));
        }
        for name in [source, destination] {
            if !self.exists(group, name) {
                return Err(HierarchyError::target(format!(
                    "subgroup '{name}' does not exist in '{group}'"
                )));
            }
        }
        let retagged = self.retag(group, source, Some(destination));
        self.expansion.forget_subgroup(group, source);
        tracing::debug!(message = "subgroup.merge", group, source, destination, retagged);
        Ok(Outcome::Applied)
    }

    /// Move a subgroup block past its neighbour.
    ///
    /// # Errors
    ///
    /// Propagates relocation errors.
    pub fn move_subgroup(&mut self, group: &str, name: &str, direction: Direction) -> Result<Moved> {
        RelocationEngine::new(self.store).move_subgroup(group.trim(), name.trim(), direction)
    }

    fn retag(&mut self, group: &str, from: &str, to: Option<&str>) -> usize {
        let mut count = 0;
        for layer in self.store.layers_mut() {
            if layer.membership().is_in_subgroup(group, from) {
                layer.set_subgroup(to);
                count += 1;
            }
        }
        count
    }
}
