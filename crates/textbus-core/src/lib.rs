//! textbus-core: rich-text editing over an abstract format model.
//!
//! This crate provides:
//! - `Formatter` trait and the built-in formatters (inline tags, styles,
//!   margins, blocks, lists, tables, images)
//! - `FormatMatrix` - per-node format ranges with merge rules
//! - `ViewTree` - fragments and singles parsed from HTML and rendered back
//!   to a DOM
//! - `SelectionBridge` - native <-> abstract selection mapping
//! - Commanders, matchers and toolbar handlers, plus text entry
//! - `Editor` - the facade tying it together, with undo history and events

pub mod commands;
pub mod config;
pub mod dom;
pub mod editor;
pub mod error;
pub mod events;
pub mod format;
pub mod formatters;
pub mod history;
pub mod html;
pub mod platform;
pub mod selection;
pub mod toolbar;
pub mod view;

pub use commands::{
    CommandContext, Commander, DeleteCommander, ImageCommander, ImageResolver, InlineCommander,
    InsertTextCommander, ListCommander, MarginCommander, SelectAllCommander, StyleCommander,
    TableCommander,
};
pub use config::EditorConfig;
pub use dom::{Dom, NodeId};
pub use editor::Editor;
pub use error::{EditorError, Result};
pub use events::{EditorEvent, EventKind, ListenerId};
pub use format::{
    FormatAbstractData, FormatEffect, FormatMatrix, FormatRange, Formatter, FormatterKind,
    FormatterRef, Priority, RenderMode,
};
pub use formatters::FormatterRegistry;
pub use history::{History, UndoManager};
pub use platform::{CursorPlatform, PlatformError, SelectionSource};
pub use selection::{
    AbstractPosition, CaretStyle, CursorRect, FontMetrics, NativePosition, NativeRange,
    SelectionBridge, TbRange, TbSelection,
};
pub use smol_str::SmolStr;
pub use toolbar::{
    BlockMatcher, EditorContext, FormatMatcher, Handler, MatchDelta, Matcher, ToolbarHandler,
};
pub use view::{Content, ViewId, ViewTree};
