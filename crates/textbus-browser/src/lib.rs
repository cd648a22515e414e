//! Browser DOM layer for the textbus editor.
//!
//! This crate connects `textbus-core` to a live page. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `mirror`: builds the page DOM from each core render and maps nodes
//! - `selection`: `window.getSelection()` <-> native ranges
//! - `cursor`: caret rectangles and computed font metrics
//! - `events`: DOM listeners feeding the editor's event queue
//! - `mount`: an editor mounted into a host element
//!
//! # Re-exports
//!
//! This crate re-exports `textbus-core` for convenience, so consumers
//! only need to depend on `textbus-browser`.

// Re-export core crate
pub use textbus_core;
pub use textbus_core::*;

pub mod cursor;
pub mod events;
pub mod mirror;
pub mod mount;
pub mod selection;

pub use cursor::BrowserCursor;
pub use events::EventBridge;
pub use mirror::DomMirror;
pub use mount::BrowserEditor;
pub use selection::{BrowserSelection, char_to_utf16, utf16_to_char};
