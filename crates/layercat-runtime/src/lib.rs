#![forbid(unsafe_code)]

//! layercat runtime
//!
//! Ties the core hierarchy engine into an interactive editing session.
//!
//! # Key Components
//!
//! - [`CatalogEditor`] - single owner of the catalogue; runs [`EditCommand`]s,
//!   records undo snapshots, queues [`Notice`]s
//! - [`DragController`] - turns a drag gesture into at most one command, with
//!   dwell-based auto-expand
//! - [`EditorConfig`] - TOML/JSON configuration
//! - [`logging::init`] - global `tracing` subscriber setup
//!
//! # Role in layercat
//! `layercat-core` knows nothing about sessions, time or configuration. This
//! crate adds them while keeping every mutation a plain, synchronous command.

pub mod config;
pub mod drag;
pub mod editor;
pub mod history;
pub mod logging;

pub use config::{ConfigError, DragConfig, EditorConfig, HeaderDropPolicy, HistoryConfig, LogConfig};
pub use drag::{AutoExpandTimer, DragController, DragSubject, DropIntent, DropTarget, HoverReport};
pub use editor::{CatalogEditor, EditCommand, Notice, NoticeKind};
pub use history::SnapshotHistory;
pub use logging::LoggingError;
