#![forbid(unsafe_code)]

//! Catalogue document codec.
//!
//! ```json
//! {
//!   "interfaceGroups": ["Imagery", "Boundaries"],
//!   "sources": [
//!     { "isBaseLayer": true, "name": "OSM" },
//!     { "layout": { "interfaceGroup": "Imagery", "subinterfaceGroup": "2020" } }
//!   ]
//! }
//! ```
//!
//! Only `interfaceGroups` and the membership-related parts of `sources` are
//! interpreted. Unknown top-level keys are kept in [`CatalogDocument::extra`]
//! and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::layer::{LayerEntry, normalize_name};
use crate::store::OrderedLayerStore;

/// Failure to decode or encode a catalogue document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse catalogue JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The persisted catalogue shape consumed and produced by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    /// Display order of top-level groups.
    #[serde(default)]
    pub interface_groups: Vec<String>,
    /// Layer records in draw order.
    #[serde(default)]
    pub sources: Vec<LayerEntry>,
    /// Top-level keys the engine does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogDocument {
    /// Parse and normalize a document.
    ///
    /// Group names are trimmed, empty and repeated names are dropped (first
    /// occurrence wins), and every source is brought back in line with the
    /// membership invariants.
    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        let mut doc: Self = serde_json::from_str(s)?;
        doc.normalize();
        Ok(doc)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Split into the ordered store and the uninterpreted top-level fields.
    #[must_use]
    pub fn into_store(self) -> (OrderedLayerStore, Map<String, Value>) {
        let store = OrderedLayerStore::from_parts(self.interface_groups, self.sources);
        (store, self.extra)
    }

    /// Rebuild a document from a store snapshot.
    #[must_use]
    pub fn from_store(store: &OrderedLayerStore, extra: Map<String, Value>) -> Self {
        Self {
            interface_groups: store.groups().to_vec(),
            sources: store.layers().to_vec(),
            extra,
        }
    }

    fn normalize(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.interface_groups.len());
        for name in self.interface_groups.drain(..) {
            if let Some(name) = normalize_name(Some(&name))
                && !seen.contains(&name)
            {
                seen.push(name);
            }
        }
        self.interface_groups = seen;
        for source in &mut self.sources {
            source.normalize();
        }
    }
}
