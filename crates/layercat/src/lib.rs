#![forbid(unsafe_code)]

//! layercat public facade crate.
//!
//! Re-exports the types most callers need from the core and runtime crates,
//! a combined [`Error`], and a [`prelude`].

use std::fmt;
use std::path::Path;

// --- Core re-exports -------------------------------------------------------

pub use layercat_core::{
    CatalogDocument, DeleteImpact, Direction, DocumentError, ExpansionKey, ExpansionState,
    GroupDeletePolicy, HierarchyError, LayerEntry, Membership, NavigationState, NodeKind,
    OrderedLayerStore, Outcome, PartitionKey, PartitionView, Placement, SubgroupDeletePolicy,
};

// --- Runtime re-exports ----------------------------------------------------

pub use layercat_runtime::{
    CatalogEditor, ConfigError, DragController, DropIntent, DropTarget, EditCommand,
    EditorConfig, HeaderDropPolicy, LoggingError, Notice, NoticeKind,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for layercat callers.
#[derive(Debug)]
pub enum Error {
    /// Reading a document from disk failed.
    Io(std::io::Error),
    /// The catalogue document did not parse.
    Document(DocumentError),
    /// The configuration did not load or validate.
    Config(ConfigError),
    /// A command was rejected.
    Hierarchy(HierarchyError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Hierarchy(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Hierarchy(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<DocumentError> for Error {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<HierarchyError> for Error {
    fn from(err: HierarchyError) -> Self {
        Self::Hierarchy(err)
    }
}

/// Standard result type for the facade.
pub type Result<T> = std::result::Result<T, Error>;

/// Open a catalogue document from disk.
///
/// `config` is a TOML file; without it the defaults apply.
///
/// # Errors
///
/// I/O, parse and config validation failures.
pub fn open(document: impl AsRef<Path>, config: Option<&Path>) -> Result<CatalogEditor> {
    let config = match config {
        Some(path) => EditorConfig::load_toml_file(path)?,
        None => EditorConfig::default(),
    };
    let text = std::fs::read_to_string(document.as_ref())?;
    Ok(CatalogEditor::from_json_str(&text, config)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CatalogEditor, Direction, DragController, DropTarget, EditCommand, EditorConfig, Error,
        ExpansionKey, GroupDeletePolicy, Outcome, PartitionKey, Placement, Result,
        SubgroupDeletePolicy,
    };

    pub use crate::{core, runtime};
}

pub use layercat_core as core;
pub use layercat_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_reads_document_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("catalog.json");
        let cfg_path = dir.path().join("layercat.toml");
        std::fs::File::create(&doc_path)
            .unwrap()
            .write_all(br#"{ "interfaceGroups": ["G"], "sources": [{ "layout": { "interfaceGroup": "G" } }] }"#)
            .unwrap();
        std::fs::write(&cfg_path, "[history]\nmax_depth = 5\n").unwrap();

        let editor = open(&doc_path, Some(cfg_path.as_path())).unwrap();
        assert_eq!(editor.config().history.max_depth, 5);
        assert_eq!(editor.view().group("G").unwrap().members, vec![0]);
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("catalog.json");
        let cfg_path = dir.path().join("layercat.toml");
        std::fs::write(&doc_path, "{}").unwrap();
        std::fs::write(&cfg_path, "[drag]\nauto_expand_delay_ms = 0\n").unwrap();
        let err = open(&doc_path, Some(cfg_path.as_path())).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_document_is_io() {
        let err = open("/nonexistent/catalog.json", None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn hierarchy_errors_convert() {
        let mut editor = CatalogEditor::new(EditorConfig::default());
        let result: Result<Outcome> = editor
            .apply(EditCommand::AddGroup { name: " ".into() })
            .map_err(Error::from);
        assert!(matches!(result, Err(Error::Hierarchy(HierarchyError::EmptyName { .. }))));
    }
}
