#![forbid(unsafe_code)]

//! The single authority over layer order.
//!
//! [`OrderedLayerStore`] owns two independent sequences:
//!
//! - the flat, ordered list of [`LayerEntry`] records (draw order), and
//! - the ordered list of group names (`interfaceGroups`), which declares the
//!   display order of groups regardless of where their members physically sit.
//!
//! Every relocation in the engine reduces to [`OrderedLayerStore::relocate_block`].
//!
//! # Target coordinates
//!
//! `relocate_block(indices, target)` interprets `target` in *pre-removal*
//! coordinates: the block is inserted before the entry that currently sits at
//! `target` (or at the end when `target == len`). Internally the target is
//! shifted down by the number of removed indices below it, so "insert after
//! position N" means the same thing before and after the removal.
//!
//! ```text
//! relocate_block([1], 3)
//!   before:  [a, b, c, d]      b moves before d
//!   remove:  [a, c, d]         1 removed index < 3, insert at 3 - 1 = 2
//!   after:   [a, c, b, d]
//! ```

use crate::error::{HierarchyError, Result};
use crate::layer::{LayerEntry, normalize_name};

/// Flat layer sequence plus the declared group order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedLayerStore {
    groups: Vec<String>,
    layers: Vec<LayerEntry>,
}

impl OrderedLayerStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a group order and a layer sequence.
    ///
    /// Group names are trimmed and de-duplicated; layers are normalized to the
    /// membership invariants.
    #[must_use]
    pub fn from_parts(groups: Vec<String>, layers: Vec<LayerEntry>) -> Self {
        let mut store = Self::new();
        for name in groups {
            if let Some(name) = normalize_name(Some(&name))
                && !store.has_group(&name)
            {
                store.groups.push(name);
            }
        }
        for layer in layers {
            store.push(layer);
        }
        store
    }

    // ====================================================================
    // Layers
    // ====================================================================

    /// Number of layers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the store holds no layers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers in draw order.
    #[must_use]
    pub fn layers(&self) -> &[LayerEntry] {
        &self.layers
    }

    /// Layer at `ordinal`.
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&LayerEntry> {
        self.layers.get(ordinal)
    }

    pub(crate) fn get_mut(&mut self, ordinal: usize) -> Option<&mut LayerEntry> {
        self.layers.get_mut(ordinal)
    }

    pub(crate) fn layers_mut(&mut self) -> impl Iterator<Item = &mut LayerEntry> {
        self.layers.iter_mut()
    }

    /// Append a layer, returning its ordinal.
    pub fn push(&mut self, mut entry: LayerEntry) -> usize {
        entry.normalize();
        self.layers.push(entry);
        self.layers.len() - 1
    }

    /// Insert a layer so that it ends up at `index`.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `index > len`.
    pub fn insert_at(&mut self, mut entry: LayerEntry, index: usize) -> Result<()> {
        if index > self.layers.len() {
            return Err(HierarchyError::selection(format!(
                "insert position {index} out of bounds (length {})",
                self.layers.len()
            )));
        }
        entry.normalize();
        self.layers.insert(index, entry);
        Ok(())
    }

    /// Remove and return the layer at `index`.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if no layer sits at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<LayerEntry> {
        self.check_ordinal(index)?;
        Ok(self.layers.remove(index))
    }

    /// Move a set of layers as one block.
    ///
    /// The named layers keep their relative order and every other layer keeps
    /// its relative order. Returns the new ordinals of the moved layers, which
    /// are always contiguous. Duplicate indices are collapsed; an empty set is
    /// a no-op that returns an empty vector.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if an index or `target` is out of range. Nothing is
    /// moved in that case.
    pub fn relocate_block(&mut self, indices: &[usize], target: usize) -> Result<Vec<usize>> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(&last) = sorted.last() {
            self.check_ordinal(last)?;
        }
        if target > self.layers.len() {
            return Err(HierarchyError::selection(format!(
                "relocation target {target} out of bounds (length {})",
                self.layers.len()
            )));
        }

        let below = sorted.iter().filter(|&&i| i < target).count();
        let mut block = Vec::with_capacity(sorted.len());
        // Highest first so earlier removals never shift later lookups.
        for &index in sorted.iter().rev() {
            block.push(self.layers.remove(index));
        }
        block.reverse();

        let at = target - below;
        let count = block.len();
        self.layers.splice(at..at, block);
        tracing::trace!(
            message = "store.relocate_block",
            moved = count,
            target,
            insert_at = at
        );
        Ok((at..at + count).collect())
    }

    /// Remove every layer matching `predicate`, returning how many went.
    pub(crate) fn remove_where(&mut self, mut predicate: impl FnMut(&LayerEntry) -> bool) -> usize {
        let before = self.layers.len();
        self.layers.retain(|layer| !predicate(layer));
        before - self.layers.len()
    }

    pub(crate) fn check_ordinal(&self, ordinal: usize) -> Result<()> {
        if ordinal < self.layers.len() {
            Ok(())
        } else {
            Err(HierarchyError::selection(format!(
                "layer {ordinal} does not exist (length {})",
                self.layers.len()
            )))
        }
    }

    // ====================================================================
    // Group order
    // ====================================================================

    /// Declared group order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Whether `name` is in the group order.
    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    /// Position of `name` in the group order.
    #[must_use]
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == name)
    }

    pub(crate) fn push_group(&mut self, name: String) {
        self.groups.push(name);
    }

    pub(crate) fn remove_group_at(&mut self, index: usize) -> String {
        self.groups.remove(index)
    }

    pub(crate) fn rename_group_at(&mut self, index: usize, name: String) {
        self.groups[index] = name;
    }

    pub(crate) fn move_group_entry(&mut self, from: usize, to: usize) {
        let name = self.groups.remove(from);
        self.groups.insert(to, name);
    }
}
