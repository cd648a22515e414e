//! Platform abstraction traits.
//!
//! These define the boundary between the editor core and whatever hosts the
//! rendered DOM (a browser document, a test double). The browser
//! implementation lives in `textbus-browser`.

use crate::selection::{CursorRect, FontMetrics, NativePosition, NativeRange};

/// Error type for platform operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Caret measurement.
pub trait CursorPlatform {
    /// Bounding rectangle of a collapsed range at `pos`.
    ///
    /// `Ok(None)` when the position has no layout (detached, hidden).
    fn caret_rect(&self, pos: &NativePosition) -> Result<Option<CursorRect>, PlatformError>;

    /// Computed font metrics of the element holding `pos`.
    fn font_metrics(&self, pos: &NativePosition) -> Result<FontMetrics, PlatformError>;
}

/// Reading and writing the host's native selection.
///
/// This is the inverse direction of rendering: the host tells the core
/// where the user's selection is, and the core tells the host where to put
/// it back after a re-render.
pub trait SelectionSource {
    /// Current native ranges. Empty when the document has no selection.
    fn native_ranges(&self) -> Result<Vec<NativeRange>, PlatformError>;

    /// Replace the native selection.
    fn apply_ranges(&self, ranges: &[NativeRange]) -> Result<(), PlatformError>;
}
