#![forbid(unsafe_code)]

//! Single-owner command dispatcher over a layer catalogue.
//!
//! [`CatalogEditor`] owns the [`OrderedLayerStore`], the [`ExpansionState`]
//! and the document fields the engine does not interpret. Every mutation goes
//! through [`CatalogEditor::apply`]:
//!
//! 1. the command runs against the core managers (which validate first);
//! 2. an applied structural command records an undo snapshot and queues a
//!    [`Notice`];
//! 3. a rejected command queues an error notice and changes nothing.
//!
//! Expansion commands are navigation state: they never record history or
//! produce notices, but undo/redo restores the projector that belonged to
//! the restored layer state so renamed keys stay consistent.

use std::fmt;

use serde_json::{Map, Value};

use layercat_core::{
    CatalogDocument, DeleteImpact, Direction, DocumentError, ExpansionKey, ExpansionState,
    GroupDeletePolicy, GroupLifecycle, LayerEntry, Membership, NavigationState,
    OrderedLayerStore, Outcome, PartitionKey, PartitionView, Placement, RelocationEngine, Result,
    SubgroupDeletePolicy, SubgroupLifecycle,
};

use crate::config::{EditorConfig, HeaderDropPolicy};
use crate::history::SnapshotHistory;

/// A structural or navigation command.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    AddGroup { name: String },
    RenameGroup {
        old: String,
        new: String,
    },
    DeleteGroup {
        name: String,
        policy: GroupDeletePolicy,
    },
    MoveGroup {
        name: String,
        direction: Direction,
    },

    CreateSubgroup {
        group: String,
        name: String,
        selected: Vec<usize>,
    },
    RenameSubgroup {
        group: String,
        old: String,
        new: String,
    },
    DeleteSubgroup {
        group: String,
        name: String,
        policy: SubgroupDeletePolicy,
    },
    UngroupSubgroup {
        group: String,
        name: String,
    },
    MergeSubgroups {
        group: String,
        source: String,
        destination: String,
    },
    MoveSubgroup {
        group: String,
        name: String,
        direction: Direction,
    },
    /// Drop a subgroup block next to a sibling.
    PlaceSubgroup {
        group: String,
        name: String,
        anchor: String,
        placement: Placement,
    },

    AppendLayer { entry: LayerEntry },
    RemoveLayer { ordinal: usize },
    ReorderLayer {
        ordinal: usize,
        direction: Direction,
    },
    /// Same-partition row drop.
    ReorderOnto {
        ordinal: usize,
        target: usize,
    },
    /// Cross-partition row drop.
    MoveLayerBefore {
        ordinal: usize,
        partition: PartitionKey,
        before: usize,
    },
    /// Header or empty-body drop; placement follows [`HeaderDropPolicy`].
    MoveLayerToPartition {
        ordinal: usize,
        partition: PartitionKey,
    },

    ToggleExpansion {
        key: ExpansionKey,
    },
    SetExpansion {
        key: ExpansionKey,
        expanded: bool,
    },
}

impl EditCommand {
    /// Stable name used in log events.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddGroup { .. } => "add_group",
            Self::RenameGroup { .. } => "rename_group",
            Self::DeleteGroup { .. } => "delete_group",
            Self::MoveGroup { .. } => "move_group",
            Self::CreateSubgroup { .. } => "create_subgroup",
            Self::RenameSubgroup { .. } => "rename_subgroup",
            Self::DeleteSubgroup { .. } => "delete_subgroup",
            Self::UngroupSubgroup { .. } => "ungroup_subgroup",
            Self::MergeSubgroups { .. } => "merge_subgroups",
            Self::MoveSubgroup { .. } => "move_subgroup",
            Self::PlaceSubgroup { .. } => "place_subgroup",
            Self::AppendLayer { .. } => "append_layer",
            Self::RemoveLayer { .. } => "remove_layer",
            Self::ReorderLayer { .. } => "reorder_layer",
            Self::ReorderOnto { .. } => "reorder_onto",
            Self::MoveLayerBefore { .. } => "move_layer_before",
            Self::MoveLayerToPartition { .. } => "move_layer_to_partition",
            Self::ToggleExpansion { .. } => "toggle_expansion",
            Self::SetExpansion { .. } => "set_expansion",
        }
    }

    /// Whether the command only touches navigation state.
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::ToggleExpansion { .. } | Self::SetExpansion { .. })
    }

    fn describe(&self) -> String {
        match self {
            Self::AddGroup { name } => format!("Group '{name}' added"),
            Self::RenameGroup { old, new } => format!("Group '{old}' renamed to '{new}'"),
            Self::DeleteGroup { name, policy } => match policy {
                GroupDeletePolicy::HardDelete => format!("Group '{name}' deleted"),
                GroupDeletePolicy::Migrate(dest) => {
                    format!("Group '{name}' deleted, layers moved to '{dest}'")
                }
            },
            Self::MoveGroup { name, .. } => format!("Group '{name}' moved"),
            Self::CreateSubgroup { group, name, .. } => {
                format!("Subgroup '{name}' created in '{group}'")
            }
            Self::RenameSubgroup { old, new, .. } => {
                format!("Subgroup '{old}' renamed to '{new}'")
            }
            Self::DeleteSubgroup { name, .. } => format!("Subgroup '{name}' deleted"),
            Self::UngroupSubgroup { name, .. } => format!("Subgroup '{name}' ungrouped"),
            Self::MergeSubgroups { source, destination, .. } => {
                format!("Subgroup '{source}' merged into '{destination}'")
            }
            Self::MoveSubgroup { name, .. } | Self::PlaceSubgroup { name, .. } => {
                format!("Subgroup '{name}' moved")
            }
            Self::AppendLayer { .. } => "Layer added".to_owned(),
            Self::RemoveLayer { ordinal } => format!("Layer {ordinal} removed"),
            Self::ReorderLayer { .. } | Self::ReorderOnto { .. } => "Layer reordered".to_owned(),
            Self::MoveLayerBefore { .. } | Self::MoveLayerToPartition { .. } => {
                "Layer moved".to_owned()
            }
            Self::ToggleExpansion { .. } | Self::SetExpansion { .. } => String::new(),
        }
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Status message for the presentation layer (toast, status bar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    store: OrderedLayerStore,
    expansion: ExpansionState,
}

/// Owner of a catalogue and its navigation state.
#[derive(Debug)]
pub struct CatalogEditor {
    store: OrderedLayerStore,
    expansion: ExpansionState,
    extra: Map<String, Value>,
    config: EditorConfig,
    history: SnapshotHistory<Snapshot>,
    notices: Vec<Notice>,
    seed: Option<Membership>,
}

impl CatalogEditor {
    /// Empty catalogue.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self::with_parts(OrderedLayerStore::new(), Map::new(), config)
    }

    /// Editor over a parsed document.
    #[must_use]
    pub fn from_document(document: CatalogDocument, config: EditorConfig) -> Self {
        let (store, extra) = document.into_store();
        Self::with_parts(store, extra, config)
    }

    /// Parse JSON text into an editor.
    ///
    /// # Errors
    ///
    /// Returns the parse error; no editor is built.
    pub fn from_json_str(json: &str, config: EditorConfig) -> std::result::Result<Self, DocumentError> {
        Ok(Self::from_document(CatalogDocument::from_json_str(json)?, config))
    }

    fn with_parts(store: OrderedLayerStore, extra: Map<String, Value>, config: EditorConfig) -> Self {
        let mut history = SnapshotHistory::new(&config.history);
        let expansion = ExpansionState::new();
        history.push(Snapshot {
            store: store.clone(),
            expansion: expansion.clone(),
        });
        tracing::debug!(
            message = "editor.open",
            layers = store.len(),
            groups = store.groups().len()
        );
        Self {
            store,
            expansion,
            extra,
            config,
            history,
            notices: Vec::new(),
            seed: None,
        }
    }

    /// Document for export, including every field the engine ignores.
    #[must_use]
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument::from_store(&self.store, self.extra.clone())
    }

    /// Pretty JSON of [`to_document`](Self::to_document).
    ///
    /// # Errors
    ///
    /// Only fails if a carried field cannot be serialized.
    pub fn to_json_string_pretty(&self) -> std::result::Result<String, DocumentError> {
        self.to_document().to_json_string_pretty()
    }

    #[must_use]
    pub fn store(&self) -> &OrderedLayerStore {
        &self.store
    }

    #[must_use]
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Fresh partitioned view of the current state.
    #[must_use]
    pub fn view(&self) -> PartitionView {
        PartitionView::build(&self.store)
    }

    #[must_use]
    pub fn is_expanded(&self, key: &ExpansionKey) -> bool {
        self.expansion.is_expanded(key)
    }

    /// Persistable navigation state.
    #[must_use]
    pub fn navigation(&self) -> NavigationState {
        self.expansion.serialize()
    }

    /// Replace the navigation state, e.g. from a previous session.
    pub fn restore_navigation(&mut self, state: &NavigationState) {
        self.expansion = ExpansionState::hydrate(state);
    }

    /// What deleting `group` would affect.
    #[must_use]
    pub fn delete_impact(&self, group: &str) -> DeleteImpact {
        DeleteImpact::of(&self.store, group)
    }

    /// Membership the layer form should pre-fill after a subgroup was created
    /// without a selection. Taking it clears it.
    pub fn take_seed(&mut self) -> Option<Membership> {
        self.seed.take()
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the catalogue is left untouched.
    pub fn apply(&mut self, command: EditCommand) -> Result<Outcome> {
        let name = command.name();
        match self.execute(&command) {
            Ok(Outcome::Applied) => {
                if !command.is_navigation() {
                    self.record();
                    self.notices.push(Notice {
                        kind: NoticeKind::Success,
                        message: command.describe(),
                    });
                    tracing::debug!(message = "editor.apply", command = name);
                }
                Ok(Outcome::Applied)
            }
            Ok(Outcome::Unchanged) => {
                tracing::trace!(message = "editor.unchanged", command = name);
                Ok(Outcome::Unchanged)
            }
            Err(err) => {
                tracing::warn!(message = "editor.rejected", command = name, error = %err);
                self.notices.push(Notice {
                    kind: NoticeKind::Error,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn execute(&mut self, command: &EditCommand) -> Result<Outcome> {
        let Self {
            store,
            expansion,
            config,
            seed,
            ..
        } = self;
        match command {
            EditCommand::AddGroup { name } => GroupLifecycle::new(store, expansion).add(name),
            EditCommand::RenameGroup { old, new } => {
                GroupLifecycle::new(store, expansion).rename(old, new)
            }
            EditCommand::DeleteGroup { name, policy } => {
                GroupLifecycle::new(store, expansion).delete(name, policy)
            }
            EditCommand::MoveGroup { name, direction } => {
                Ok(GroupLifecycle::new(store, expansion).move_group(name, *direction))
            }
            EditCommand::CreateSubgroup { group, name, selected } => {
                let created = SubgroupLifecycle::new(store, expansion).create(group, name, selected)?;
                if created.tagged.is_empty() {
                    *seed = Some(created.seed);
                }
                Ok(Outcome::Applied)
            }
            EditCommand::RenameSubgroup { group, old, new } => {
                SubgroupLifecycle::new(store, expansion).rename(group, old, new)
            }
            EditCommand::DeleteSubgroup { group, name, policy } => {
                Ok(SubgroupLifecycle::new(store, expansion).delete(group, name, *policy))
            }
            EditCommand::UngroupSubgroup { group, name } => {
                Ok(SubgroupLifecycle::new(store, expansion).ungroup(group, name))
            }
            EditCommand::MergeSubgroups { group, source, destination } => {
                SubgroupLifecycle::new(store, expansion).merge(group, source, destination)
            }
            EditCommand::MoveSubgroup { group, name, direction } => Ok(SubgroupLifecycle::new(
                store, expansion,
            )
            .move_subgroup(group, name, *direction)?
            .outcome),
            EditCommand::PlaceSubgroup { group, name, anchor, placement } => Ok(
                RelocationEngine::new(store)
                    .move_subgroup_relative(group.trim(), name.trim(), anchor.trim(), *placement)?
                    .outcome,
            ),
            EditCommand::AppendLayer { entry } => {
                store.push(entry.clone());
                Ok(Outcome::Applied)
            }
            EditCommand::RemoveLayer { ordinal } => {
                store.remove_at(*ordinal)?;
                Ok(Outcome::Applied)
            }
            EditCommand::ReorderLayer { ordinal, direction } => {
                Ok(RelocationEngine::new(store).reorder(*ordinal, *direction)?.outcome)
            }
            EditCommand::ReorderOnto { ordinal, target } => {
                Ok(RelocationEngine::new(store).reorder_onto(*ordinal, *target)?.outcome)
            }
            EditCommand::MoveLayerBefore { ordinal, partition, before } => Ok(
                RelocationEngine::new(store)
                    .move_before(*ordinal, partition, *before)?
                    .outcome,
            ),
            EditCommand::MoveLayerToPartition { ordinal, partition } => {
                let mut engine = RelocationEngine::new(store);
                let moved = match config.drag.header_drop {
                    HeaderDropPolicy::KeepPosition => engine.move_to_partition(*ordinal, partition)?,
                    HeaderDropPolicy::AppendToEnd => engine.append_to_partition(*ordinal, partition)?,
                };
                Ok(moved.outcome)
            }
            EditCommand::ToggleExpansion { key } => {
                expansion.toggle(key);
                Ok(Outcome::Applied)
            }
            EditCommand::SetExpansion { key, expanded } => {
                Ok(Outcome::from_changed(expansion.set_expanded(key, *expanded)))
            }
        }
    }

    fn record(&mut self) {
        self.history.push(Snapshot {
            store: self.store.clone(),
            expansion: self.expansion.clone(),
        });
    }

    /// Restore the state before the last applied structural command.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.restore(&snapshot);
        tracing::debug!(message = "editor.undo", remaining = self.history.undo_depth() - 1);
        true
    }

    /// Re-apply the last undone command.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.restore(&snapshot);
        tracing::debug!(message = "editor.redo", remaining = self.history.redo_depth());
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.store = snapshot.store.clone();
        self.expansion = snapshot.expansion.clone();
        self.seed = None;
    }

    /// Take every queued notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layercat_core::HierarchyError;
    use tracing_test::traced_test;

    fn editor() -> CatalogEditor {
        let doc = CatalogDocument::from_json_str(
            r#"{
                "interfaceGroups": ["Imagery", "Boundaries"],
                "sources": [
                    { "id": "a", "layout": { "interfaceGroup": "Imagery" } },
                    { "id": "b", "layout": { "interfaceGroup": "Imagery", "subinterfaceGroup": "2020" } },
                    { "id": "c", "layout": { "interfaceGroup": "Imagery", "subinterfaceGroup": "2021" } },
                    { "id": "d", "layout": { "interfaceGroup": "Boundaries" } },
                    { "id": "e" }
                ]
            }"#,
        )
        .unwrap();
        CatalogEditor::from_document(doc, EditorConfig::default())
    }

    fn ids(editor: &CatalogEditor) -> Vec<&str> {
        editor
            .store()
            .layers()
            .iter()
            .map(|l| l.field("id").and_then(Value::as_str).unwrap_or("?"))
            .collect()
    }

    #[test]
    #[traced_test]
    fn applied_command_records_and_notifies() {
        let mut ed = editor();
        let outcome = ed
            .apply(EditCommand::AddGroup { name: "Hydro".into() })
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(ed.can_undo());
        let notices = ed.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Success);
        assert!(ed.drain_notices().is_empty());
        assert!(logs_contain("editor.apply"));
    }

    #[test]
    #[traced_test]
    fn rejected_command_warns_and_changes_nothing() {
        let mut ed = editor();
        let before = ed.store().clone();
        let err = ed
            .apply(EditCommand::AddGroup { name: "Imagery".into() })
            .unwrap_err();
        assert!(matches!(err, HierarchyError::DuplicateName { .. }));
        assert_eq!(ed.store(), &before);
        assert!(!ed.can_undo());
        assert_eq!(ed.drain_notices()[0].kind, NoticeKind::Error);
        assert!(logs_contain("editor.rejected"));
    }

    #[test]
    fn noop_records_nothing() {
        let mut ed = editor();
        let outcome = ed
            .apply(EditCommand::MoveGroup {
                name: "Imagery".into(),
                direction: Direction::Up,
            })
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert!(!ed.can_undo());
        assert!(ed.drain_notices().is_empty());
    }

    #[test]
    fn undo_redo_restore_store_and_expansion() {
        let mut ed = editor();
        ed.apply(EditCommand::SetExpansion {
            key: ExpansionKey::group("Imagery"),
            expanded: true,
        })
        .unwrap();
        ed.apply(EditCommand::RenameGroup {
            old: "Imagery".into(),
            new: "Satellite".into(),
        })
        .unwrap();
        assert!(ed.is_expanded(&ExpansionKey::group("Satellite")));

        assert!(ed.undo());
        assert_eq!(ed.store().groups(), ["Imagery", "Boundaries"]);
        assert!(!ed.is_expanded(&ExpansionKey::group("Satellite")));

        assert!(ed.redo());
        assert_eq!(ed.store().groups(), ["Satellite", "Boundaries"]);
        assert!(ed.is_expanded(&ExpansionKey::group("Satellite")));
        assert!(!ed.redo());
    }

    #[test]
    fn navigation_commands_skip_history() {
        let mut ed = editor();
        ed.apply(EditCommand::ToggleExpansion {
            key: ExpansionKey::Ungrouped,
        })
        .unwrap();
        assert!(!ed.can_undo());
        assert!(ed.drain_notices().is_empty());
        assert_eq!(ed.navigation().expanded_groups, vec!["__UNGROUPED__"]);
    }

    #[test]
    fn subgroup_move_matches_worked_example() {
        let mut ed = editor();
        ed.apply(EditCommand::MoveSubgroup {
            group: "Imagery".into(),
            name: "2020".into(),
            direction: Direction::Down,
        })
        .unwrap();
        assert_eq!(ids(&ed), ["a", "c", "b", "d", "e"]);
    }

    #[test]
    fn header_drop_follows_policy() {
        let mut keep = editor();
        keep.apply(EditCommand::MoveLayerToPartition {
            ordinal: 4,
            partition: PartitionKey::group("Imagery"),
        })
        .unwrap();
        assert_eq!(ids(&keep), ["a", "b", "c", "d", "e"]);
        assert_eq!(keep.store().get(4).unwrap().group(), Some("Imagery"));

        let mut config = EditorConfig::default();
        config.drag.header_drop = HeaderDropPolicy::AppendToEnd;
        let mut append = CatalogEditor::from_document(editor().to_document(), config);
        append
            .apply(EditCommand::MoveLayerToPartition {
                ordinal: 4,
                partition: PartitionKey::group("Imagery"),
            })
            .unwrap();
        assert_eq!(ids(&append), ["a", "e", "b", "c", "d"]);
    }

    #[test]
    fn empty_subgroup_create_leaves_seed() {
        let mut ed = editor();
        ed.apply(EditCommand::CreateSubgroup {
            group: "Boundaries".into(),
            name: "Admin".into(),
            selected: vec![],
        })
        .unwrap();
        assert_eq!(ed.take_seed(), Some(Membership::subgroup("Boundaries", "Admin")));
        assert_eq!(ed.take_seed(), None);
    }

    #[test]
    fn delete_impact_reports_members() {
        let ed = editor();
        let impact = ed.delete_impact("Imagery");
        assert_eq!(impact.members, 3);
        assert_eq!(impact.destinations, vec!["Boundaries"]);
    }

    #[test]
    fn document_round_trip_keeps_unknown_fields() {
        let mut ed = CatalogEditor::from_json_str(
            r#"{ "title": "t", "interfaceGroups": [], "sources": [{ "id": "x", "opacity": 0.5 }] }"#,
            EditorConfig::default(),
        )
        .unwrap();
        ed.apply(EditCommand::AddGroup { name: "G".into() }).unwrap();
        let json: Value = serde_json::from_str(&ed.to_json_string_pretty().unwrap()).unwrap();
        assert_eq!(json["title"], "t");
        assert_eq!(json["sources"][0]["opacity"], 0.5);
        assert_eq!(json["interfaceGroups"][0], "G");
    }
}
