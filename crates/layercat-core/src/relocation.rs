#![forbid(unsafe_code)]

//! Relocation of layers and subgroup blocks.
//!
//! [`RelocationEngine`] borrows a store and turns high-level moves into one
//! call to [`OrderedLayerStore::relocate_block`] (plus a membership retag for
//! cross-partition moves). Four shapes are supported:
//!
//! | shape | entry point | effect |
//! |---|---|---|
//! | reorder inside a partition | [`reorder`](RelocationEngine::reorder), [`reorder_onto`](RelocationEngine::reorder_onto) | position only |
//! | cross-partition, positional | [`move_before`](RelocationEngine::move_before) | retag, then insert before a row |
//! | cross-partition, header drop | [`move_to_partition`](RelocationEngine::move_to_partition) | retag only, ordinal unchanged |
//! | subgroup block | [`move_subgroup`](RelocationEngine::move_subgroup), [`move_subgroup_relative`](RelocationEngine::move_subgroup_relative) | whole block moves |
//!
//! # Header drops
//!
//! `move_to_partition` leaves the physical ordinal alone, so where the layer
//! shows up inside its new partition depends on where that ordinal falls among
//! the partition's members. It is not necessarily last.
//! [`append_to_partition`](RelocationEngine::append_to_partition) is the
//! alternative that also moves the layer after the partition's last member.
//!
//! # Invariants
//!
//! - Every layer not named by a command keeps its relative order.
//! - Validation happens before any mutation; a rejected move changes nothing.

use crate::error::{HierarchyError, Outcome, Result};
use crate::partition::{PartitionKey, PartitionView};
use crate::store::OrderedLayerStore;

/// Direction for keyboard/menu driven moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Top,
    Bottom,
}

/// Side of an anchor a block is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Before,
    After,
}

/// Result of an accepted relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moved {
    pub outcome: Outcome,
    /// New ordinals of the moved layers, in order.
    pub ordinals: Vec<usize>,
}

impl Moved {
    fn unchanged(ordinals: Vec<usize>) -> Self {
        Self {
            outcome: Outcome::Unchanged,
            ordinals,
        }
    }
}

/// Borrowing facade that performs relocations on one store.
#[derive(Debug)]
pub struct RelocationEngine<'a> {
    store: &'a mut OrderedLayerStore,
}

impl<'a> RelocationEngine<'a> {
    #[must_use]
    pub fn new(store: &'a mut OrderedLayerStore) -> Self {
        Self { store }
    }

    /// Move one layer within its partition.
    ///
    /// `Up`/`Down` swap past the adjacent member; `Top`/`Bottom` move before
    /// the first or after the last member. Already at the boundary is a no-op.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `ordinal` does not exist.
    pub fn reorder(&mut self, ordinal: usize, direction: Direction) -> Result<Moved> {
        let partition = self.partition_of(ordinal)?;
        let view = PartitionView::build(self.store);
        let members = view.members(&partition).unwrap_or_default();
        let Some(pos) = members.iter().position(|&m| m == ordinal) else {
            return Err(HierarchyError::selection(format!(
                "layer {ordinal} is not listed in its own partition"
            )));
        };
        let last = members.len() - 1;
        let target = match direction {
            Direction::Up | Direction::Top if pos == 0 => None,
            Direction::Down | Direction::Bottom if pos == last => None,
            Direction::Up => Some(members[pos - 1]),
            Direction::Down => Some(members[pos + 1] + 1),
            Direction::Top => Some(members[0]),
            Direction::Bottom => Some(members[last] + 1),
        };
        match target {
            Some(target) => self.relocate(&[ordinal], target),
            None => Ok(Moved::unchanged(vec![ordinal])),
        }
    }

    /// Drop a layer onto another row of the same partition.
    ///
    /// The layer takes the target row's slot: it lands after the target when
    /// moving down and before it when moving up.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if either ordinal is missing or the two layers are in
    /// different partitions.
    pub fn reorder_onto(&mut self, ordinal: usize, target: usize) -> Result<Moved> {
        let from = self.partition_of(ordinal)?;
        let to = self.partition_of(target)?;
        if from != to {
            return Err(HierarchyError::selection(format!(
                "layers {ordinal} and {target} are in different partitions"
            )));
        }
        if ordinal == target {
            return Ok(Moved::unchanged(vec![ordinal]));
        }
        let insert = if ordinal < target { target + 1 } else { target };
        self.relocate(&[ordinal], insert)
    }

    /// Move a layer into `partition`, directly before the row at `before`.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `ordinal` is missing or `before` is not a member of
    /// `partition`; `InvalidTarget` if the partition's group is not declared.
    pub fn move_before(
        &mut self,
        ordinal: usize,
        partition: &PartitionKey,
        before: usize,
    ) -> Result<Moved> {
        self.store.check_ordinal(ordinal)?;
        self.check_partition(partition)?;
        let view = PartitionView::build(self.store);
        let is_member = view
            .members(partition)
            .is_some_and(|members| members.contains(&before));
        if !is_member {
            return Err(HierarchyError::selection(format!(
                "row {before} is not part of the drop partition"
            )));
        }

        let retagged = self.retag(ordinal, partition);
        let mut moved = self.relocate(&[ordinal], before)?;
        if retagged {
            moved.outcome = Outcome::Applied;
        }
        Ok(moved)
    }

    /// Change a layer's partition without moving it.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `ordinal` is missing; `InvalidTarget` if the
    /// partition's group is not declared.
    pub fn move_to_partition(&mut self, ordinal: usize, partition: &PartitionKey) -> Result<Moved> {
        self.store.check_ordinal(ordinal)?;
        self.check_partition(partition)?;
        let retagged = self.retag(ordinal, partition);
        tracing::trace!(message = "relocate.header_drop", ordinal, retagged);
        Ok(Moved {
            outcome: Outcome::from_changed(retagged),
            ordinals: vec![ordinal],
        })
    }

    /// Change a layer's partition and place it after the partition's last
    /// member. Inside its own partition this is `reorder(.., Bottom)`.
    ///
    /// # Errors
    ///
    /// Same as [`move_to_partition`](Self::move_to_partition).
    pub fn append_to_partition(
        &mut self,
        ordinal: usize,
        partition: &PartitionKey,
    ) -> Result<Moved> {
        self.store.check_ordinal(ordinal)?;
        self.check_partition(partition)?;
        if self.partition_of(ordinal)? == *partition {
            return self.reorder(ordinal, Direction::Bottom);
        }
        let view = PartitionView::build(self.store);
        let last = view
            .members(partition)
            .and_then(|members| members.last().copied());
        self.retag(ordinal, partition);
        let mut moved = match last {
            Some(last) => self.relocate(&[ordinal], last + 1)?,
            None => Moved::unchanged(vec![ordinal]),
        };
        moved.outcome = Outcome::Applied;
        Ok(moved)
    }

    /// Move a subgroup block past its neighbour in `direction`.
    ///
    /// Unknown groups or subgroups and moves at the boundary are no-ops.
    ///
    /// # Errors
    ///
    /// Only propagates store errors, which indicate a bug.
    pub fn move_subgroup(&mut self, group: &str, name: &str, direction: Direction) -> Result<Moved> {
        let view = PartitionView::build(self.store);
        let order = view.subgroup_order(group);
        let Some(pos) = order.iter().position(|s| *s == name) else {
            return Ok(Moved::unchanged(Vec::new()));
        };
        let last = order.len() - 1;
        let (anchor, placement) = match direction {
            Direction::Up | Direction::Top if pos == 0 => return Ok(Moved::unchanged(Vec::new())),
            Direction::Down | Direction::Bottom if pos == last => {
                return Ok(Moved::unchanged(Vec::new()));
            }
            Direction::Up => (order[pos - 1], Placement::Before),
            Direction::Down => (order[pos + 1], Placement::After),
            Direction::Top => (order[0], Placement::Before),
            Direction::Bottom => (order[last], Placement::After),
        };
        let anchor = anchor.to_owned();
        self.move_subgroup_relative(group, name, &anchor, placement)
    }

    /// Move the block of subgroup `name` before or after subgroup `anchor`.
    ///
    /// The block lands before the anchor's first member or after its last
    /// member, so the two subgroups become adjacent.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `name` has no members in `group`; `InvalidTarget`
    /// if `anchor` has none.
    pub fn move_subgroup_relative(
        &mut self,
        group: &str,
        name: &str,
        anchor: &str,
        placement: Placement,
    ) -> Result<Moved> {
        if name == anchor {
            return Ok(Moved::unchanged(Vec::new()));
        }
        let view = PartitionView::build(self.store);
        let Some(partition) = view.group(group) else {
            return Err(HierarchyError::target(format!("group '{group}' does not exist")));
        };
        let Some(source) = partition.subgroup(name) else {
            return Err(HierarchyError::selection(format!(
                "subgroup '{name}' has no members in '{group}'"
            )));
        };
        let Some(anchor_block) = partition.subgroup(anchor) else {
            return Err(HierarchyError::target(format!(
                "subgroup '{anchor}' has no members in '{group}'"
            )));
        };
        let target = match placement {
            Placement::Before => anchor_block.members[0],
            Placement::After => anchor_block.members[anchor_block.members.len() - 1] + 1,
        };
        let block = source.members.clone();
        self.relocate(&block, target)
    }

    fn relocate(&mut self, ordinals: &[usize], target: usize) -> Result<Moved> {
        let ordinals_before = ordinals.to_vec();
        let ordinals = self.store.relocate_block(ordinals, target)?;
        let outcome = Outcome::from_changed(ordinals != ordinals_before);
        Ok(Moved { outcome, ordinals })
    }

    fn retag(&mut self, ordinal: usize, partition: &PartitionKey) -> bool {
        let Some(layer) = self.store.get_mut(ordinal) else {
            return false;
        };
        let before = (layer.is_base_layer(), layer.membership());
        partition.apply_to(layer);
        before != (layer.is_base_layer(), layer.membership())
    }

    fn partition_of(&self, ordinal: usize) -> Result<PartitionKey> {
        PartitionKey::of(self.store, ordinal)
            .ok_or_else(|| HierarchyError::selection(format!("layer {ordinal} does not exist")))
    }

    fn check_partition(&self, partition: &PartitionKey) -> Result<()> {
        match partition {
            PartitionKey::Base | PartitionKey::Ungrouped => Ok(()),
            PartitionKey::Group(group) if self.store.has_group(group) => Ok(()),
            PartitionKey::Subgroup { group, subgroup }
                if self.store.has_group(group) && !subgroup.trim().is_empty() =>
            {
                Ok(())
            }
            other => Err(HierarchyError::target(format!(
                "cannot drop into {other:?}: group is not declared"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerEntry;

    fn tagged(entries: Vec<LayerEntry>) -> OrderedLayerStore {
        let layers = entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.with_field("id", i))
            .collect();
        OrderedLayerStore::from_parts(vec!["Imagery".into(), "Boundaries".into()], layers)
    }

    fn ids(store: &OrderedLayerStore) -> Vec<u64> {
        store
            .layers()
            .iter()
            .map(|l| l.field("id").and_then(|v| v.as_u64()).unwrap())
            .collect()
    }

    fn scenario() -> OrderedLayerStore {
        tagged(vec![
            LayerEntry::in_group("Imagery"),
            LayerEntry::in_subgroup("Imagery", "2020"),
            LayerEntry::in_subgroup("Imagery", "2021"),
            LayerEntry::in_group("Boundaries"),
        ])
    }

    #[test]
    fn subgroup_down_passes_sibling() {
        let mut store = scenario();
        let moved = RelocationEngine::new(&mut store)
            .move_subgroup("Imagery", "2020", Direction::Down)
            .unwrap();
        assert_eq!(ids(&store), [0, 2, 1, 3]);
        assert_eq!(moved.outcome, Outcome::Applied);
        assert_eq!(moved.ordinals, vec![2]);
    }

    #[test]
    fn subgroup_at_boundary_is_noop() {
        let mut store = scenario();
        let moved = RelocationEngine::new(&mut store)
            .move_subgroup("Imagery", "2020", Direction::Up)
            .unwrap();
        assert_eq!(moved.outcome, Outcome::Unchanged);
        assert_eq!(ids(&store), [0, 1, 2, 3]);
    }

    #[test]
    fn interleaved_subgroup_becomes_contiguous() {
        let mut store = tagged(vec![
            LayerEntry::in_subgroup("Imagery", "s1"),
            LayerEntry::in_subgroup("Imagery", "s2"),
            LayerEntry::in_subgroup("Imagery", "s1"),
        ]);
        RelocationEngine::new(&mut store)
            .move_subgroup("Imagery", "s1", Direction::Down)
            .unwrap();
        assert_eq!(ids(&store), [1, 0, 2]);
    }

    #[test]
    fn reorder_skips_other_partitions() {
        let mut store = tagged(vec![
            LayerEntry::in_group("Imagery"),
            LayerEntry::in_group("Boundaries"),
            LayerEntry::in_group("Imagery"),
        ]);
        RelocationEngine::new(&mut store)
            .reorder(0, Direction::Down)
            .unwrap();
        assert_eq!(ids(&store), [1, 2, 0]);
    }

    #[test]
    fn reorder_top_and_bottom() {
        let mut store = tagged(vec![
            LayerEntry::new(),
            LayerEntry::new(),
            LayerEntry::new(),
        ]);
        let mut engine = RelocationEngine::new(&mut store);
        engine.reorder(2, Direction::Top).unwrap();
        let unchanged = engine.reorder(0, Direction::Top).unwrap();
        assert_eq!(unchanged.outcome, Outcome::Unchanged);
        engine.reorder(0, Direction::Bottom).unwrap();
        assert_eq!(ids(&store), [0, 1, 2]);
    }

    #[test]
    fn reorder_onto_takes_target_slot() {
        let mut store = tagged(vec![LayerEntry::new(), LayerEntry::new(), LayerEntry::new()]);
        RelocationEngine::new(&mut store).reorder_onto(0, 2).unwrap();
        assert_eq!(ids(&store), [1, 2, 0]);
        RelocationEngine::new(&mut store).reorder_onto(2, 0).unwrap();
        assert_eq!(ids(&store), [0, 1, 2]);
    }

    #[test]
    fn reorder_onto_rejects_cross_partition() {
        let mut store = scenario();
        let err = RelocationEngine::new(&mut store).reorder_onto(0, 3).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidSelection { .. }));
    }

    #[test]
    fn move_before_retags_and_positions() {
        let mut store = scenario();
        let moved = RelocationEngine::new(&mut store)
            .move_before(3, &PartitionKey::subgroup("Imagery", "2021"), 2)
            .unwrap();
        assert_eq!(ids(&store), [0, 1, 3, 2]);
        assert_eq!(moved.ordinals, vec![2]);
        assert_eq!(store.get(2).unwrap().subgroup(), Some("2021"));
    }

    #[test]
    fn move_before_requires_member_row() {
        let mut store = scenario();
        let err = RelocationEngine::new(&mut store)
            .move_before(3, &PartitionKey::group("Imagery"), 1)
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidSelection { .. }));
        assert_eq!(store.get(3).unwrap().group(), Some("Boundaries"));
    }

    #[test]
    fn header_drop_keeps_physical_position() {
        let mut store = scenario();
        let moved = RelocationEngine::new(&mut store)
            .move_to_partition(0, &PartitionKey::group("Boundaries"))
            .unwrap();
        assert_eq!(moved.outcome, Outcome::Applied);
        assert_eq!(ids(&store), [0, 1, 2, 3]);
        // Ordinal 0 now sorts before the old Boundaries member.
        let view = PartitionView::build(&store);
        assert_eq!(view.group("Boundaries").unwrap().members, vec![0, 3]);
    }

    #[test]
    fn append_places_after_last_member() {
        let mut store = scenario();
        RelocationEngine::new(&mut store)
            .append_to_partition(0, &PartitionKey::group("Boundaries"))
            .unwrap();
        assert_eq!(ids(&store), [1, 2, 3, 0]);
    }

    #[test]
    fn undeclared_group_is_invalid_target() {
        let mut store = scenario();
        let err = RelocationEngine::new(&mut store)
            .move_to_partition(0, &PartitionKey::group("Nope"))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidTarget { .. }));
    }

    #[test]
    fn drop_into_base_section() {
        let mut store = scenario();
        RelocationEngine::new(&mut store)
            .move_to_partition(1, &PartitionKey::Base)
            .unwrap();
        assert!(store.get(1).unwrap().is_base_layer());
        assert!(store.get(1).unwrap().membership().is_empty());
    }
}
