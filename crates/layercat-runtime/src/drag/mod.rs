#![forbid(unsafe_code)]

//! Drag-and-drop session controller.
//!
//! # State Machine
//!
//! ```text
//!            start_layer / start_subgroup
//!   Idle ───────────────────────────────────▶ Dragging
//!    ▲                                          │  hover / leave / tick
//!    └────────── release / cancel ◀─────────────┘
//! ```
//!
//! While dragging, [`hover`](DragController::hover) classifies the pointer
//! target into a [`DropIntent`] and arms the dwell timer when the target is a
//! collapsed node that would accept the drop from another partition.
//! [`tick`](DragController::tick) expands that node through the editor once
//! the dwell elapses.
//!
//! # Invariants
//!
//! 1. A release issues at most one editor command; releasing over the origin
//!    issues none.
//! 2. The timer is disarmed whenever the hovered identity changes, the
//!    pointer leaves the tree, or the session ends.
//! 3. A rejected start leaves the controller idle.

mod timer;

pub use timer::{AutoExpandTimer, FireCallback};

use web_time::Instant;

use layercat_core::{
    ExpansionKey, HierarchyError, Membership, Outcome, PartitionKey, Placement, Result,
};

use crate::config::DragConfig;
use crate::editor::{CatalogEditor, EditCommand};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSubject {
    Layer {
        ordinal: usize,
        membership: Membership,
        origin: PartitionKey,
    },
    Subgroup {
        group: String,
        name: String,
    },
}

/// What the pointer is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A layer row.
    Row { ordinal: usize },
    /// A partition header or its empty body.
    Header(PartitionKey),
    /// A subgroup node, with the half of the node under the pointer.
    Subgroup {
        group: String,
        name: String,
        placement: Placement,
    },
}

/// Classified effect of dropping at the current target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropIntent {
    /// Same partition: take the target row's slot.
    Reorder { target: usize },
    /// Other partition: insert before the target row.
    MoveBefore { partition: PartitionKey, before: usize },
    /// Other partition via its header or body.
    MoveToPartition(PartitionKey),
    /// Subgroup block next to a sibling.
    SubgroupReorder { anchor: String, placement: Placement },
}

impl DropIntent {
    /// Whether the drop changes the layer's partition.
    #[must_use]
    pub fn is_cross_partition(&self) -> bool {
        matches!(self, Self::MoveBefore { .. } | Self::MoveToPartition(_))
    }
}

/// Feedback for the hover highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverReport {
    /// `None` when the target would not accept the drop.
    pub intent: Option<DropIntent>,
    /// Whether the hovered node is collapsed.
    pub collapsed: bool,
    /// Whether the dwell timer is counting toward an auto-expand.
    pub auto_expand_pending: bool,
}

#[derive(Debug)]
struct Session {
    subject: DragSubject,
    intent: Option<DropIntent>,
}

/// Turns one drag gesture into at most one editor command.
#[derive(Debug)]
pub struct DragController {
    session: Option<Session>,
    timer: AutoExpandTimer,
}

impl DragController {
    #[must_use]
    pub fn new(config: &DragConfig) -> Self {
        Self {
            session: None,
            timer: AutoExpandTimer::new(config.auto_expand_delay()),
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn subject(&self) -> Option<&DragSubject> {
        self.session.as_ref().map(|s| &s.subject)
    }

    /// Swap the auto-expand callback (e.g. to scroll the expanded node into
    /// view). Does not affect a pending dwell.
    pub fn set_expand_callback(&mut self, callback: FireCallback) {
        self.timer.set_callback(callback);
    }

    /// Begin dragging a layer row.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if `ordinal` does not exist.
    pub fn start_layer(&mut self, editor: &CatalogEditor, ordinal: usize) -> Result<()> {
        let store = editor.store();
        let (Some(layer), Some(origin)) = (store.get(ordinal), PartitionKey::of(store, ordinal))
        else {
            return Err(HierarchyError::InvalidSelection {
                reason: format!("cannot drag layer {ordinal}: it does not exist"),
            });
        };
        let subject = DragSubject::Layer {
            ordinal,
            membership: layer.membership(),
            origin,
        };
        self.begin(subject);
        Ok(())
    }

    /// Begin dragging a whole subgroup block.
    ///
    /// # Errors
    ///
    /// `InvalidSelection` if the subgroup has no members.
    pub fn start_subgroup(&mut self, editor: &CatalogEditor, group: &str, name: &str) -> Result<()> {
        let exists = editor
            .view()
            .group(group)
            .is_some_and(|g| g.subgroup(name).is_some());
        if !exists {
            return Err(HierarchyError::InvalidSelection {
                reason: format!("cannot drag subgroup '{name}': not found in '{group}'"),
            });
        }
        self.begin(DragSubject::Subgroup {
            group: group.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn begin(&mut self, subject: DragSubject) {
        self.timer.cancel();
        tracing::debug!(message = "drag.start", subject = ?subject);
        self.session = Some(Session {
            subject,
            intent: None,
        });
    }

    /// Pointer moved over `target` at `now`.
    pub fn hover(&mut self, editor: &CatalogEditor, target: &DropTarget, now: Instant) -> HoverReport {
        let Some(session) = self.session.as_mut() else {
            return HoverReport {
                intent: None,
                collapsed: false,
                auto_expand_pending: false,
            };
        };
        let intent = classify(editor, &session.subject, target);
        let node = expansion_key(target);
        let collapsed = node.as_ref().is_some_and(|key| !editor.is_expanded(key));

        let wants_expand = collapsed && intent.as_ref().is_some_and(DropIntent::is_cross_partition);
        match node {
            Some(key) if wants_expand => {
                self.timer.arm(key, now);
            }
            _ => self.timer.cancel(),
        }
        session.intent = intent.clone();
        HoverReport {
            intent,
            collapsed,
            auto_expand_pending: self.timer.armed_key().is_some(),
        }
    }

    /// Pointer left the tree.
    pub fn leave(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.intent = None;
        }
        self.timer.cancel();
    }

    /// Advance time. Returns the key that was auto-expanded, if any.
    pub fn tick(&mut self, editor: &mut CatalogEditor, now: Instant) -> Option<ExpansionKey> {
        if self.session.is_none() {
            return None;
        }
        let key = self.timer.poll(now)?;
        let command = EditCommand::SetExpansion {
            key: key.clone(),
            expanded: true,
        };
        match editor.apply(command) {
            Ok(outcome) => {
                tracing::debug!(message = "drag.auto_expand", key = ?key, outcome = ?outcome);
                Some(key)
            }
            Err(err) => {
                tracing::warn!(message = "drag.auto_expand.rejected", key = ?key, error = %err);
                None
            }
        }
    }

    /// Release at the last hovered target.
    ///
    /// # Errors
    ///
    /// Propagates the editor's validation error; the session still ends.
    pub fn release(&mut self, editor: &mut CatalogEditor) -> Result<Outcome> {
        self.timer.cancel();
        let Some(session) = self.session.take() else {
            return Ok(Outcome::Unchanged);
        };
        let Some(command) = command_for(&session.subject, session.intent) else {
            tracing::debug!(message = "drag.drop", command = "none");
            return Ok(Outcome::Unchanged);
        };
        tracing::debug!(message = "drag.drop", command = command.name());
        editor.apply(command)
    }

    /// Abort the session without touching the catalogue.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        if self.session.take().is_some() {
            tracing::debug!(message = "drag.cancel");
        }
    }
}

fn classify(editor: &CatalogEditor, subject: &DragSubject, target: &DropTarget) -> Option<DropIntent> {
    match (subject, target) {
        (DragSubject::Layer { ordinal, origin, .. }, DropTarget::Row { ordinal: row }) => {
            if row == ordinal {
                return None;
            }
            let partition = PartitionKey::of(editor.store(), *row)?;
            if partition == *origin {
                Some(DropIntent::Reorder { target: *row })
            } else {
                Some(DropIntent::MoveBefore {
                    partition,
                    before: *row,
                })
            }
        }
        (DragSubject::Layer { origin, .. }, DropTarget::Header(partition)) => {
            (partition != origin).then(|| DropIntent::MoveToPartition(partition.clone()))
        }
        (DragSubject::Layer { origin, .. }, DropTarget::Subgroup { group, name, .. }) => {
            let partition = PartitionKey::subgroup(group.as_str(), name.as_str());
            (partition != *origin).then_some(DropIntent::MoveToPartition(partition))
        }
        (
            DragSubject::Subgroup { group, name },
            DropTarget::Subgroup {
                group: target_group,
                name: anchor,
                placement,
            },
        ) => (group == target_group && name != anchor).then(|| DropIntent::SubgroupReorder {
            anchor: anchor.clone(),
            placement: *placement,
        }),
        (DragSubject::Subgroup { .. }, _) => None,
    }
}

fn expansion_key(target: &DropTarget) -> Option<ExpansionKey> {
    match target {
        DropTarget::Row { .. } => None,
        DropTarget::Header(partition) => Some(ExpansionKey::for_partition(partition)),
        DropTarget::Subgroup { group, name, .. } => {
            Some(ExpansionKey::subgroup(group.as_str(), name.as_str()))
        }
    }
}

fn command_for(subject: &DragSubject, intent: Option<DropIntent>) -> Option<EditCommand> {
    let intent = intent?;
    match subject {
        DragSubject::Layer { ordinal, .. } => {
            let ordinal = *ordinal;
            match intent {
                DropIntent::Reorder { target } => Some(EditCommand::ReorderOnto { ordinal, target }),
                DropIntent::MoveBefore { partition, before } => Some(EditCommand::MoveLayerBefore {
                    ordinal,
                    partition,
                    before,
                }),
                DropIntent::MoveToPartition(partition) => {
                    Some(EditCommand::MoveLayerToPartition { ordinal, partition })
                }
                DropIntent::SubgroupReorder { .. } => None,
            }
        }
        DragSubject::Subgroup { group, name } => match intent {
            DropIntent::SubgroupReorder { anchor, placement } => Some(EditCommand::PlaceSubgroup {
                group: group.clone(),
                name: name.clone(),
                anchor,
                placement,
            }),
            _ => None,
        },
    }
}
