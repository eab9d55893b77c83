#![forbid(unsafe_code)]

//! Core: layer model, ordered store, partition view, and hierarchy edits.
//!
//! # Role in layercat
//! `layercat-core` owns the data model of a layer catalogue and every rule that
//! keeps its two-level group/subgroup hierarchy consistent with one flat,
//! ordered sequence of layer records. It does no I/O beyond JSON codec
//! helpers and keeps no clocks; the runtime crate drives it.
//!
//! # Primary responsibilities
//! - **OrderedLayerStore**: the flat sequence plus the declared group order,
//!   with order-preserving primitives (`insert_at`, `remove_at`,
//!   `relocate_block`).
//! - **PartitionView**: the derived read path (base, groups, subgroups in
//!   first-appearance order, ungrouped remainder).
//! - **RelocationEngine**: reorder inside a partition, cross-partition moves,
//!   subgroup block moves.
//! - **GroupLifecycle / SubgroupLifecycle**: create, rename, delete, merge,
//!   reorder, keeping the expansion projector in lockstep.
//! - **ExpansionState**: expanded/collapsed state keyed by structured identity,
//!   serialized to the navigation shape.
//!
//! # How it fits in the system
//! `layercat-runtime` wraps these pieces in a single-owner editor with undo,
//! notices, and a drag controller. Callers render from [`PartitionView`] and
//! mutate only through commands.

pub mod document;
pub mod error;
pub mod expansion;
pub mod layer;
pub mod lifecycle;
pub mod partition;
pub mod relocation;
pub mod store;

pub use document::{CatalogDocument, DocumentError};
pub use error::{HierarchyError, NodeKind, Outcome, Result};
pub use expansion::{ExpansionKey, ExpansionState, NavigationState};
pub use layer::{LayerEntry, Membership};
pub use lifecycle::{
    DeleteImpact, GroupDeletePolicy, GroupLifecycle, SubgroupCreated, SubgroupDeletePolicy,
    SubgroupLifecycle,
};
pub use partition::{GroupItem, GroupPartition, PartitionKey, PartitionView, SubgroupPartition};
pub use relocation::{Direction, Moved, Placement, RelocationEngine};
pub use store::OrderedLayerStore;
