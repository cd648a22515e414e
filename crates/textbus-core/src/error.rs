//! Error types for the editor core.
//!
//! Malformed markup is never an error: formatters that do not recognise an
//! element simply report `FormatEffect::Invalid`. Errors are reserved for
//! configuration problems and for callers addressing views or positions that
//! do not exist.

use crate::platform::PlatformError;
use crate::view::ViewId;

/// Main error type for editor core operations.
#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    /// A formatter match rule could not be compiled.
    ///
    /// Raised while building a formatter registry, so a bad pattern surfaces
    /// at startup rather than on the first keystroke.
    #[error("invalid formatter pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The view id does not refer to a live node in the tree.
    #[error("unknown view node {0:?}")]
    UnknownView(ViewId),

    /// The view exists but is not a fragment.
    #[error("view node {0:?} is not a fragment")]
    NotAFragment(ViewId),

    /// The view exists but is not a single (leaf) node.
    #[error("view node {0:?} is not a single node")]
    NotASingle(ViewId),

    /// An offset lies outside the content of a fragment.
    #[error("offset {offset} is out of range for {view:?} (content length {len})")]
    PositionOutOfRange {
        view: ViewId,
        offset: usize,
        len: usize,
    },

    /// A command needed a selection but there was none.
    #[error("no selection")]
    NoSelection,

    /// A formatter the command depends on is not registered.
    #[error("formatter `{0}` is not registered")]
    MissingFormatter(String),

    /// No toolbar handler is registered under this name.
    #[error("no handler named `{0}`")]
    UnknownHandler(String),

    /// The host platform failed to answer a query.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Editor configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = EditorError> = std::result::Result<T, E>;
