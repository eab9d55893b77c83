#![forbid(unsafe_code)]

//! Error taxonomy for hierarchy commands.
//!
//! Every error here is synchronous and recoverable: the command that produced
//! it has not touched the store. Structural no-ops (moving a node that is
//! already at a boundary, deleting something that does not exist, renaming to
//! the current name) are reported as [`Outcome::Unchanged`], never as errors.

use std::fmt;

use thiserror::Error;

/// Which kind of hierarchy node a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Top-level interface group.
    Group,
    /// Subgroup nested in one group.
    Subgroup,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("group"),
            Self::Subgroup => f.write_str("subgroup"),
        }
    }
}

/// Rejections produced by store, lifecycle and relocation commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// A group or subgroup with this name already exists.
    #[error("a {kind} named '{name}' already exists")]
    DuplicateName { kind: NodeKind, name: String },

    /// The name is empty after trimming.
    #[error("{kind} name must not be empty")]
    EmptyName { kind: NodeKind },

    /// Ordinals that do not exist or do not belong to the stated partition.
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    /// A destination that is the node itself or does not exist.
    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },
}

impl HierarchyError {
    pub(crate) fn duplicate(kind: NodeKind, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }

    pub(crate) fn target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }
}

/// Result of a command that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store (or projector) changed.
    Applied,
    /// The command was valid but had nothing to do.
    Unchanged,
}

impl Outcome {
    /// Whether the command changed anything.
    #[inline]
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    /// `Applied` when `changed`, else `Unchanged`.
    #[must_use]
    pub const fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Applied
        } else {
            Self::Unchanged
        }
    }
}

/// Standard result type for hierarchy commands.
pub type Result<T> = std::result::Result<T, HierarchyError>;
