#![forbid(unsafe_code)]

//! Layer records and their group/subgroup membership.
//!
//! A [`LayerEntry`] is one `sources[]` element of a catalogue document. The
//! engine only interprets two things about it: the base-layer flag and the
//! `layout.interfaceGroup` / `layout.subinterfaceGroup` tags. Every other field
//! is carried opaquely so a document survives a load/save cycle untouched.
//!
//! # Invariants
//!
//! 1. A subgroup tag is only present together with a group tag.
//! 2. A base layer carries neither tag.
//!
//! Both are enforced here, at the model boundary, so no command has to repeat
//! the check.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Group/subgroup tags of a layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Membership {
    group: Option<String>,
    subgroup: Option<String>,
}

impl Membership {
    /// Build a normalized membership.
    ///
    /// Names are trimmed, empty names become absent, and a subgroup without a
    /// group is dropped.
    #[must_use]
    pub fn new(group: Option<&str>, subgroup: Option<&str>) -> Self {
        let group = normalize_name(group);
        let subgroup = match group {
            Some(_) => normalize_name(subgroup),
            None => None,
        };
        Self { group, subgroup }
    }

    /// No group, no subgroup.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            group: None,
            subgroup: None,
        }
    }

    /// Member of `group` without a subgroup.
    #[must_use]
    pub fn group(group: &str) -> Self {
        Self::new(Some(group), None)
    }

    /// Member of `subgroup` nested in `group`.
    #[must_use]
    pub fn subgroup(group: &str, subgroup: &str) -> Self {
        Self::new(Some(group), Some(subgroup))
    }

    /// Group tag, if any.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Subgroup tag, if any.
    #[must_use]
    pub fn subgroup_name(&self) -> Option<&str> {
        self.subgroup.as_deref()
    }

    /// Whether neither tag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group.is_none()
    }

    /// Whether this membership is exactly `(group, subgroup)`.
    #[must_use]
    pub fn is_in_subgroup(&self, group: &str, subgroup: &str) -> bool {
        self.group.as_deref() == Some(group) && self.subgroup.as_deref() == Some(subgroup)
    }

    /// Whether the group tag equals `group`.
    #[must_use]
    pub fn is_in_group(&self, group: &str) -> bool {
        self.group.as_deref() == Some(group)
    }
}

pub(crate) fn normalize_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Serialized shape of `sources[].layout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interface_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subinterface_group: Option<String>,
    /// Layout keys the engine does not interpret.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Layout {
    fn is_empty(&self) -> bool {
        self.interface_group.is_none() && self.subinterface_group.is_none() && self.extra.is_empty()
    }
}

/// One layer of the catalogue.
///
/// Position in the store is the only identity a layer has; there is no ID
/// field and moving a layer changes which ordinal refers to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_base_layer: Option<bool>,
    #[serde(default, skip_serializing_if = "Layout::is_empty")]
    layout: Layout,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl LayerEntry {
    /// An ungrouped, non-base layer with no extra fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A base layer.
    #[must_use]
    pub fn base() -> Self {
        let mut entry = Self::new();
        entry.set_base_layer(true);
        entry
    }

    /// A layer tagged with `membership`.
    #[must_use]
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.set_membership(membership);
        self
    }

    /// Shorthand for a member of `group`.
    #[must_use]
    pub fn in_group(group: &str) -> Self {
        Self::new().with_membership(Membership::group(group))
    }

    /// Shorthand for a member of `group / subgroup`.
    #[must_use]
    pub fn in_subgroup(group: &str, subgroup: &str) -> Self {
        Self::new().with_membership(Membership::subgroup(group, subgroup))
    }

    /// Attach an opaque field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Whether this is a base layer.
    #[must_use]
    pub fn is_base_layer(&self) -> bool {
        self.is_base_layer.unwrap_or(false)
    }

    /// Set the base-layer flag. Becoming a base layer clears membership.
    pub fn set_base_layer(&mut self, base: bool) {
        if base {
            self.is_base_layer = Some(true);
            self.layout.interface_group = None;
            self.layout.subinterface_group = None;
        } else if self.is_base_layer.is_some() {
            self.is_base_layer = Some(false);
        }
    }

    /// Current membership tags.
    #[must_use]
    pub fn membership(&self) -> Membership {
        Membership::new(
            self.layout.interface_group.as_deref(),
            self.layout.subinterface_group.as_deref(),
        )
    }

    /// Group tag, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.layout.interface_group.as_deref()
    }

    /// Subgroup tag, if any.
    #[must_use]
    pub fn subgroup(&self) -> Option<&str> {
        self.layout.subinterface_group.as_deref()
    }

    /// Replace membership. A non-empty membership clears the base-layer flag.
    pub fn set_membership(&mut self, membership: Membership) {
        if !membership.is_empty() {
            self.set_base_layer(false);
        }
        self.layout.interface_group = membership.group;
        self.layout.subinterface_group = membership.subgroup;
    }

    pub(crate) fn set_group(&mut self, group: &str) {
        self.layout.interface_group = Some(group.to_owned());
    }

    pub(crate) fn set_subgroup(&mut self, subgroup: Option<&str>) {
        self.layout.subinterface_group = subgroup.map(str::to_owned);
    }

    /// Opaque fields (everything except `isBaseLayer` and `layout`).
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Mutable access to the opaque fields.
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Look up one opaque field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Re-establish the membership invariants after deserialization.
    pub(crate) fn normalize(&mut self) {
        if self.is_base_layer() {
            self.layout.interface_group = None;
            self.layout.subinterface_group = None;
            return;
        }
        let membership = self.membership();
        self.layout.interface_group = membership.group;
        self.layout.subinterface_group = membership.subgroup;
    }
}
