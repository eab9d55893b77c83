#![forbid(unsafe_code)]

//! Structural edits of the group/subgroup hierarchy.
//!
//! Both managers borrow the store and the expansion projector together, so a
//! rename or delete can never update one without the other.
//!
//! - [`GroupLifecycle`]: create, rename, delete (hard or migrate), reorder.
//! - [`SubgroupLifecycle`]: create, rename, delete (hard or ungroup), merge,
//!   reorder.

mod groups;
mod subgroups;

pub use groups::{DeleteImpact, GroupDeletePolicy, GroupLifecycle};
pub use subgroups::{SubgroupCreated, SubgroupDeletePolicy, SubgroupLifecycle};

use crate::error::{HierarchyError, NodeKind, Result};
use crate::layer::normalize_name;

/// Trim a user-supplied name, rejecting empty results.
fn clean_name(kind: NodeKind, raw: &str) -> Result<String> {
    normalize_name(Some(raw)).ok_or(HierarchyError::EmptyName { kind })
}
